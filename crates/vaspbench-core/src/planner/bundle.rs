use super::computer::ComputerOptions;
use crate::domain::{KpointMesh, ParameterSet, PotentialInput, StoredStructure};
use crate::potentials::PotentialAssignment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserSettings {
    pub add_kpoints: bool,
    pub add_parameters: bool,
}

/// Retrieval and parser settings shared by every benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverSettings {
    #[serde(rename = "ADDITIONAL_RETRIEVE_LIST")]
    pub additional_retrieve_list: Vec<String>,
    pub parser_settings: ParserSettings,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            additional_retrieve_list: vec!["IBZKPT".to_string()],
            parser_settings: ParserSettings {
                add_kpoints: true,
                add_parameters: true,
            },
        }
    }
}

/// Everything the execution engine needs to run one structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverInputBundle {
    pub code: String,
    pub structure: StoredStructure,
    pub kpoints: KpointMesh,
    pub potential_family: String,
    pub potential_mapping: PotentialAssignment,
    pub potentials: Vec<PotentialInput>,
    pub parameters: ParameterSet,
    pub options: ComputerOptions,
    pub settings: SolverSettings,
}

impl SolverInputBundle {
    pub fn formula(&self) -> String {
        self.structure.structure.formula()
    }
}

/// Provenance extras attached to a submitted run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunAnnotations {
    pub magnetism: String,
    pub cutoff: String,
}

impl RunAnnotations {
    pub const MAGNETISM_KEY: &'static str = "magnetism";
    pub const CUTOFF_KEY: &'static str = "cutoff";

    pub fn entries(&self) -> [(&'static str, &str); 2] {
        [
            (Self::MAGNETISM_KEY, self.magnetism.as_str()),
            (Self::CUTOFF_KEY, self.cutoff.as_str()),
        ]
    }

    pub fn to_extras(&self) -> BTreeMap<String, String> {
        self.entries()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{RunAnnotations, SolverSettings};
    use serde_json::json;

    #[test]
    fn settings_serialize_with_engine_key_names() {
        let value = serde_json::to_value(SolverSettings::default()).expect("settings serialize");
        assert_eq!(
            value,
            json!({
                "ADDITIONAL_RETRIEVE_LIST": ["IBZKPT"],
                "parser_settings": {"add_kpoints": true, "add_parameters": true}
            })
        );
    }

    #[test]
    fn annotations_become_run_extras() {
        let annotations = RunAnnotations {
            magnetism: "collinear-spin".to_string(),
            cutoff: "cutoff factor: 2".to_string(),
        };
        let extras = annotations.to_extras();
        assert_eq!(extras.get("magnetism").map(String::as_str), Some("collinear-spin"));
        assert_eq!(extras.get("cutoff").map(String::as_str), Some("cutoff factor: 2"));
    }
}
