//! Directory-backed stand-in for the workflow engine's database.
//!
//! ```text
//! <root>/structures/<collection>.json    [StoredStructure]
//! <root>/potentials/<family>.json        {identifier: PotentialData}
//! <root>/magnetic_reference.json         {element: {spin, magmom}}
//! <root>/groups/<name>.json              {name, runs: [id]}
//! <root>/runs/<id>/calculation.json      CalculationRecord
//! <root>/runs/<id>/bundle.json           SolverInputBundle for the engine
//! <root>/runs/<id>/retrieved/            vasprun.xml, OUTCAR
//! ```
//!
//! The engine picks up runs in `TOSUBMIT`, and writes state, output
//! parameters and retrieved files back into the run directory.

mod error;

pub use error::StoreError;

use crate::domain::{
    BenchError, BenchResult, CalculationRecord, CalculationState, RunId, StoredStructure,
};
use crate::params::MagneticReferenceTable;
use crate::planner::{SolverInputBundle, StructureSource, SubmissionBackend};
use crate::potentials::{
    AssignedPotentials, PotentialAssignment, PotentialFamily, PotentialProvider,
};
use crate::serialization::write_json_artifact;
use crate::summary::{CalculationStore, GroupMember};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const STRUCTURES_DIR: &str = "structures";
const POTENTIALS_DIR: &str = "potentials";
const GROUPS_DIR: &str = "groups";
const RUNS_DIR: &str = "runs";
const RETRIEVED_DIR: &str = "retrieved";
const CALCULATION_FILE: &str = "calculation.json";
const BUNDLE_FILE: &str = "bundle.json";
const MAGNETIC_REFERENCE_FILE: &str = "magnetic_reference.json";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: String,
    #[serde(default)]
    pub runs: BTreeSet<RunId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    root: PathBuf,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    write_json_artifact(path, value).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn validate_name(kind: &'static str, name: &str) -> Result<(), StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name.starts_with('.')
        || name.contains(['/', '\\'])
    {
        return Err(StoreError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(STRUCTURES_DIR).join(format!("{}.json", name))
    }

    fn family_path(&self, name: &str) -> PathBuf {
        self.root.join(POTENTIALS_DIR).join(format!("{}.json", name))
    }

    fn group_path(&self, name: &str) -> PathBuf {
        self.root.join(GROUPS_DIR).join(format!("{}.json", name))
    }

    pub fn run_dir(&self, run_id: RunId) -> PathBuf {
        self.root.join(RUNS_DIR).join(run_id.to_string())
    }

    pub fn magnetic_reference(&self) -> BenchResult<MagneticReferenceTable> {
        let path = self.root.join(MAGNETIC_REFERENCE_FILE);
        if !path.exists() {
            return Err(BenchError::input_validation(
                "INPUT.MAGNETIC_REFERENCE",
                format!(
                    "store '{}' has no magnetic reference table ({})",
                    self.root.display(),
                    MAGNETIC_REFERENCE_FILE
                ),
            ));
        }
        MagneticReferenceTable::from_json_path(&path)
    }

    pub fn write_magnetic_reference(
        &self,
        table: &MagneticReferenceTable,
    ) -> Result<(), StoreError> {
        write_json(&self.root.join(MAGNETIC_REFERENCE_FILE), table)
    }

    pub fn write_collection(
        &self,
        name: &str,
        structures: &[StoredStructure],
    ) -> Result<(), StoreError> {
        validate_name("collection", name)?;
        write_json(&self.collection_path(name), &structures)
    }

    pub fn write_family(&self, name: &str, family: &PotentialFamily) -> Result<(), StoreError> {
        validate_name("potential family", name)?;
        write_json(&self.family_path(name), family)
    }

    pub fn load_family(&self, name: &str) -> Result<PotentialFamily, StoreError> {
        validate_name("potential family", name)?;
        let path = self.family_path(name);
        if !path.exists() {
            return Err(StoreError::UnknownFamily(name.to_string()));
        }
        read_json(&path)
    }

    pub fn load_group(&self, name: &str) -> Result<GroupRecord, StoreError> {
        validate_name("group", name)?;
        let path = self.group_path(name);
        if !path.exists() {
            return Err(StoreError::UnknownGroup(name.to_string()));
        }
        read_json(&path)
    }

    fn save_group(&self, group: &GroupRecord) -> Result<(), StoreError> {
        write_json(&self.group_path(&group.name), group)
    }

    pub fn load_calculation(&self, run_id: RunId) -> Result<CalculationRecord, StoreError> {
        let run_dir = self.run_dir(run_id);
        let path = run_dir.join(CALCULATION_FILE);
        if !path.exists() {
            return Err(StoreError::UnknownRun(run_id));
        }

        let mut record: CalculationRecord = read_json(&path)?;
        record.retrieved_dir = match record.retrieved_dir.take() {
            Some(dir) if dir.is_relative() => Some(run_dir.join(dir)),
            Some(dir) => Some(dir),
            None => Some(run_dir.join(RETRIEVED_DIR)).filter(|dir| dir.is_dir()),
        };
        Ok(record)
    }

    pub fn save_calculation(&self, record: &CalculationRecord) -> Result<(), StoreError> {
        write_json(&self.run_dir(record.id).join(CALCULATION_FILE), record)
    }

    /// Run ids present in the spool, ascending.
    pub fn run_ids(&self) -> Result<Vec<RunId>, StoreError> {
        let runs_dir = self.root.join(RUNS_DIR);
        if !runs_dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&runs_dir).map_err(|source| StoreError::Read {
            path: runs_dir.clone(),
            source,
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Read {
                path: runs_dir.clone(),
                source,
            })?;
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<RunId>().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn next_run_id(&self) -> Result<RunId, StoreError> {
        Ok(self.run_ids()?.last().map_or(1, |last| last + 1))
    }
}

impl StructureSource for FileStore {
    fn collection(&self, name: &str) -> BenchResult<Vec<StoredStructure>> {
        validate_name("collection", name)?;
        let path = self.collection_path(name);
        if !path.exists() {
            return Err(StoreError::UnknownCollection(name.to_string()).into());
        }
        Ok(read_json(&path)?)
    }
}

impl PotentialProvider for FileStore {
    fn potentials(
        &self,
        family: &str,
        assignment: &PotentialAssignment,
    ) -> BenchResult<AssignedPotentials> {
        self.load_family(family)?.assign(family, assignment)
    }
}

impl SubmissionBackend for FileStore {
    fn group_exists(&self, name: &str) -> BenchResult<bool> {
        validate_name("group", name)?;
        Ok(self.group_path(name).exists())
    }

    fn get_or_create_group(&self, name: &str) -> BenchResult<bool> {
        if self.group_exists(name)? {
            return Ok(false);
        }
        self.save_group(&GroupRecord {
            name: name.to_string(),
            runs: BTreeSet::new(),
        })?;
        debug!(group = name, "created group");
        Ok(true)
    }

    fn submit(&self, bundle: &SolverInputBundle) -> BenchResult<RunId> {
        let run_id = self.next_run_id()?;
        let run_dir = self.run_dir(run_id);
        write_json(&run_dir.join(BUNDLE_FILE), bundle)?;
        self.save_calculation(&CalculationRecord {
            id: run_id,
            state: CalculationState::ToSubmit,
            structure: bundle.structure.clone(),
            parameters: bundle.parameters.clone(),
            kpoints: bundle.kpoints,
            potentials: bundle.potentials.clone(),
            extras: BTreeMap::new(),
            output_parameters: None,
            computed_kpoints: None,
            retrieved_dir: None,
        })?;
        debug!(run_id, dir = %run_dir.display(), "spooled run");
        Ok(run_id)
    }

    fn annotate(&self, run_id: RunId, key: &str, value: &str) -> BenchResult<()> {
        let mut record = self.load_calculation(run_id)?;
        record.extras.insert(key.to_string(), value.to_string());
        // keep the stored record free of the resolved default directory
        if record.retrieved_dir == Some(self.run_dir(run_id).join(RETRIEVED_DIR)) {
            record.retrieved_dir = None;
        }
        Ok(self.save_calculation(&record)?)
    }

    fn add_to_group(&self, group: &str, run_id: RunId) -> BenchResult<()> {
        let mut record = self.load_group(group)?;
        if record.runs.insert(run_id) {
            self.save_group(&record)?;
        }
        Ok(())
    }
}

impl CalculationStore for FileStore {
    fn group_members(&self, name: &str) -> BenchResult<Vec<GroupMember>> {
        let group = self.load_group(name)?;
        let members = group
            .runs
            .into_iter()
            .map(|run_id| GroupMember {
                run_id,
                record: self.load_calculation(run_id).map_err(BenchError::from),
            })
            .collect();
        Ok(members)
    }
}
