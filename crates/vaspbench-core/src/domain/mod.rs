pub mod errors;

pub use errors::{BenchError, BenchErrorCategory, BenchResult};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type StructureId = u64;
pub type RunId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub element: String,
    pub position: [f64; 3],
}

impl Site {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Self {
            element: element.into(),
            position,
        }
    }
}

/// Periodic structure; `cell` rows are the lattice vectors in Angstrom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub cell: [[f64; 3]; 3],
    pub sites: Vec<Site>,
}

impl Structure {
    pub fn new(cell: [[f64; 3]; 3], sites: Vec<Site>) -> Self {
        Self { cell, sites }
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    /// Distinct element symbols in order of first appearance.
    pub fn elements(&self) -> Vec<&str> {
        let mut elements: Vec<&str> = Vec::new();
        for site in &self.sites {
            if !elements.contains(&site.element.as_str()) {
                elements.push(site.element.as_str());
            }
        }
        elements
    }

    /// Hill-ordered formula: C then H when carbon is present, everything else alphabetical.
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for site in &self.sites {
            *counts.entry(site.element.as_str()).or_insert(0) += 1;
        }

        let mut ordered = Vec::with_capacity(counts.len());
        if let Some(carbon) = counts.remove("C") {
            ordered.push(("C", carbon));
            if let Some(hydrogen) = counts.remove("H") {
                ordered.push(("H", hydrogen));
            }
        }
        ordered.extend(counts);

        ordered
            .into_iter()
            .map(|(element, count)| {
                if count == 1 {
                    element.to_string()
                } else {
                    format!("{}{}", element, count)
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredStructure {
    pub id: StructureId,
    #[serde(flatten)]
    pub structure: Structure,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpointMesh {
    pub mesh: [u32; 3],
    pub offset: [f64; 3],
}

impl KpointMesh {
    pub fn point_count(&self) -> u32 {
        self.mesh.iter().product()
    }
}

/// INCAR-equivalent parameter set keyed by lower-case tag.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ParameterSet {
    entries: BTreeMap<String, Value>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(&key.to_ascii_lowercase())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Later entries win.
    pub fn merge(&mut self, other: &ParameterSet) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for ParameterSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CalculationState {
    New,
    #[serde(rename = "TOSUBMIT")]
    ToSubmit,
    Submitting,
    #[serde(rename = "WITHSCHEDULER")]
    WithScheduler,
    Computed,
    Retrieving,
    Parsing,
    Finished,
    Failed,
    #[serde(rename = "PARSINGFAILED")]
    ParsingFailed,
    #[serde(rename = "SUBMISSIONFAILED")]
    SubmissionFailed,
    #[serde(rename = "RETRIEVALFAILED")]
    RetrievalFailed,
}

impl CalculationState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::ToSubmit => "TOSUBMIT",
            Self::Submitting => "SUBMITTING",
            Self::WithScheduler => "WITHSCHEDULER",
            Self::Computed => "COMPUTED",
            Self::Retrieving => "RETRIEVING",
            Self::Parsing => "PARSING",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
            Self::ParsingFailed => "PARSINGFAILED",
            Self::SubmissionFailed => "SUBMISSIONFAILED",
            Self::RetrievalFailed => "RETRIEVALFAILED",
        }
    }

    /// States whose raw outputs were retrieved and are worth summarizing.
    pub const fn has_outputs(self) -> bool {
        matches!(self, Self::Finished | Self::ParsingFailed)
    }
}

impl Display for CalculationState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialInput {
    pub element: String,
    pub full_name: String,
    pub md5: String,
}

/// A submitted calculation as seen by the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub id: RunId,
    pub state: CalculationState,
    pub structure: StoredStructure,
    pub parameters: ParameterSet,
    pub kpoints: KpointMesh,
    #[serde(default)]
    pub potentials: Vec<PotentialInput>,
    #[serde(default)]
    pub extras: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_kpoints: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved_dir: Option<PathBuf>,
}

impl CalculationRecord {
    pub fn formula(&self) -> String {
        self.structure.structure.formula()
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras.get(key).map(String::as_str)
    }
}
