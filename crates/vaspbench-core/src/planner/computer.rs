use crate::domain::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const HOUR: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub num_machines: u32,
    pub num_mpiprocs_per_machine: u32,
}

/// Scheduler options attached to every submission on one computer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputerOptions {
    pub max_wallclock_seconds: u64,
    pub resources: Resources,
    pub queue_name: String,
    pub computer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputerProfile {
    pub name: String,
    /// Solver code label, `vasp@<computer>`.
    pub code: String,
    pub options: ComputerOptions,
}

impl ComputerProfile {
    pub fn new(name: impl Into<String>, options: ComputerOptions) -> Self {
        let name = name.into();
        Self {
            code: format!("vasp@{}", name),
            name,
            options,
        }
    }

    pub fn deneb() -> Self {
        Self::new(
            "deneb",
            ComputerOptions {
                max_wallclock_seconds: 10 * HOUR,
                resources: Resources {
                    num_machines: 1,
                    num_mpiprocs_per_machine: 16,
                },
                queue_name: "parallel".to_string(),
                computer: "deneb".to_string(),
            },
        )
    }

    /// Processes sharing one machine; feeds the NCORE hint.
    pub fn core_count(&self) -> Option<u32> {
        Some(self.options.resources.num_mpiprocs_per_machine).filter(|cores| *cores > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComputerRegistry {
    profiles: BTreeMap<String, ComputerProfile>,
}

impl ComputerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.insert(ComputerProfile::deneb());
        registry
    }

    pub fn insert(&mut self, profile: ComputerProfile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn resolve(&self, name: &str) -> BenchResult<&ComputerProfile> {
        self.profiles.get(name).ok_or_else(|| {
            BenchError::input_validation(
                "INPUT.UNKNOWN_RESOURCE",
                format!(
                    "unknown computer '{}'; known computers: {}",
                    name,
                    self.names().collect::<Vec<_>>().join(", ")
                ),
            )
        })
    }
}
