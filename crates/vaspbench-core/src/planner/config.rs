use crate::domain::{BenchError, BenchResult, ParameterSet};
use crate::params::CutoffMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LEDGER_PATH: &str = "./run_info.json";
pub const PERTURBED_COLLECTION: &str = "teststructures_Borelli_Vinay_March2018_perturbed";
pub const NON_PERTURBED_COLLECTION: &str = "teststructures_Borelli_Vinay_March2018";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestSet {
    #[default]
    Perturbed,
    #[serde(alias = "non-perturbed")]
    NonPerturbed,
}

impl TestSet {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Perturbed => "perturbed",
            Self::NonPerturbed => "non_perturbed",
        }
    }

    /// Name of the structure collection holding this test set.
    pub const fn collection_name(self) -> &'static str {
        match self {
            Self::Perturbed => PERTURBED_COLLECTION,
            Self::NonPerturbed => NON_PERTURBED_COLLECTION,
        }
    }
}

impl Display for TestSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Experiment description as written in the YAML file; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExperimentFile {
    #[serde(default)]
    pub computer: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub potcar_family: Option<String>,
    #[serde(default)]
    pub test_set: Option<TestSet>,
    #[serde(default)]
    pub cutoff: Option<CutoffMode>,
    #[serde(default)]
    pub only_formulae: Option<Vec<String>>,
    #[serde(default)]
    pub outfile: Option<PathBuf>,
    #[serde(default)]
    pub incar: ParameterSet,
}

impl ExperimentFile {
    pub fn from_yaml_str(source: &str) -> BenchResult<Self> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(source).map_err(|error| {
            BenchError::input_validation(
                "INPUT.EXPERIMENT",
                format!("failed to parse experiment file: {}", error),
            )
        })
    }

    pub fn from_path(path: &Path) -> BenchResult<Self> {
        let source = fs::read_to_string(path).map_err(|error| {
            BenchError::io_system(
                "IO.EXPERIMENT",
                format!(
                    "failed to read experiment file '{}': {}",
                    path.display(),
                    error
                ),
            )
        })?;
        Self::from_yaml_str(&source)
    }
}

/// Values given directly on the command line; they always win over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExperimentOverrides {
    pub computer: Option<String>,
    pub test_set: Option<TestSet>,
    pub group_name: Option<String>,
    pub potcar_family: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    pub resource: String,
    pub test_set: TestSet,
    pub group_name: String,
    pub potential_family: String,
    pub cutoff: CutoffMode,
    pub only_formulae: Option<BTreeSet<String>>,
    pub ledger_path: PathBuf,
    pub overrides: ParameterSet,
    pub dry_run: bool,
}

impl ExperimentConfig {
    /// An absent or empty allow-list keeps every structure.
    pub fn selects_formula(&self, formula: &str) -> bool {
        match &self.only_formulae {
            Some(allowed) if !allowed.is_empty() => allowed.contains(formula),
            _ => true,
        }
    }
}

fn require(value: Option<String>, field: &'static str) -> BenchResult<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| BenchError::incomplete_config(field))
}

/// Merges command-line values with the optional experiment file.
///
/// `file_dir` is the directory the experiment file was read from; a relative
/// `outfile` is resolved against it.
pub fn resolve(
    file: Option<&ExperimentFile>,
    file_dir: Option<&Path>,
    overrides: &ExperimentOverrides,
) -> BenchResult<ExperimentConfig> {
    let empty = ExperimentFile::default();
    let file = file.unwrap_or(&empty);

    let resource = require(
        overrides.computer.clone().or_else(|| file.computer.clone()),
        "computer",
    )?;
    let group_name = require(
        overrides
            .group_name
            .clone()
            .or_else(|| file.group_name.clone()),
        "group_name",
    )?;
    let potential_family = require(
        overrides
            .potcar_family
            .clone()
            .or_else(|| file.potcar_family.clone()),
        "potcar_family",
    )?;

    let ledger_path = match &file.outfile {
        Some(outfile) if outfile.is_absolute() => outfile.clone(),
        Some(outfile) => file_dir.unwrap_or_else(|| Path::new(".")).join(outfile),
        None => PathBuf::from(DEFAULT_LEDGER_PATH),
    };

    Ok(ExperimentConfig {
        resource,
        test_set: overrides.test_set.or(file.test_set).unwrap_or_default(),
        group_name,
        potential_family,
        cutoff: file.cutoff.unwrap_or_default(),
        only_formulae: file
            .only_formulae
            .as_ref()
            .map(|formulae| formulae.iter().cloned().collect()),
        ledger_path,
        overrides: file.incar.clone(),
        dry_run: overrides.dry_run,
    })
}
