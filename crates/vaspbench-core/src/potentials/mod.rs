mod catalog;

pub use catalog::PotentialCatalog;

use crate::domain::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Element symbol -> potential identifier.
pub type PotentialAssignment = BTreeMap<String, String>;

/// Metadata of one potential in a family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialData {
    #[serde(default)]
    pub name: String,
    pub full_name: String,
    /// Valence electron count.
    pub zval: f64,
    /// Maximum recommended plane-wave cutoff (eV).
    pub enmax: f64,
    #[serde(default)]
    pub md5: String,
}

/// Assigned potentials with metadata, keyed by element symbol.
pub type AssignedPotentials = BTreeMap<String, PotentialData>;

pub trait PotentialProvider {
    fn potentials(
        &self,
        family: &str,
        assignment: &PotentialAssignment,
    ) -> BenchResult<AssignedPotentials>;
}

/// One potential family loaded as a table of identifier -> metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PotentialFamily {
    entries: BTreeMap<String, PotentialData>,
}

impl PotentialFamily {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identifier: impl Into<String>, mut data: PotentialData) {
        let identifier = identifier.into();
        if data.name.is_empty() {
            data.name = identifier.clone();
        }
        self.entries.insert(identifier, data);
    }

    pub fn get(&self, identifier: &str) -> Option<PotentialData> {
        self.entries.get(identifier).map(|data| {
            let mut data = data.clone();
            if data.name.is_empty() {
                data.name = identifier.to_string();
            }
            data
        })
    }

    pub fn assign(
        &self,
        family: &str,
        assignment: &PotentialAssignment,
    ) -> BenchResult<AssignedPotentials> {
        assignment
            .iter()
            .map(|(element, identifier)| {
                self.get(identifier)
                    .map(|data| (element.clone(), data))
                    .ok_or_else(|| missing_potential_error(family, element, identifier))
            })
            .collect()
    }
}

impl PotentialProvider for PotentialFamily {
    fn potentials(
        &self,
        family: &str,
        assignment: &PotentialAssignment,
    ) -> BenchResult<AssignedPotentials> {
        self.assign(family, assignment)
    }
}

pub(crate) fn missing_potential_error(family: &str, element: &str, identifier: &str) -> BenchError {
    BenchError::computation(
        "RUN.POTENTIAL_METADATA",
        format!(
            "potential family '{}' has no entry '{}' required for element '{}'",
            family, identifier, element
        ),
    )
}

pub(crate) fn unassigned_potential_error(element: &str) -> BenchError {
    BenchError::computation(
        "RUN.POTENTIAL_METADATA",
        format!("no potential is assigned to element '{}'", element),
    )
}
