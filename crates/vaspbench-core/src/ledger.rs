//! Persistent `{resource -> {structure id -> run id}}` bookkeeping.
//!
//! Each planner invocation reads the existing ledger, merges its new records
//! and rewrites the file whole. There is no locking: concurrent invocations
//! against the same file must be serialized by the caller.

use crate::domain::{BenchError, BenchResult, RunId, StructureId};
use crate::serialization::write_text_artifact;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRecord<'a> {
    pub resource: &'a str,
    pub structure_id: StructureId,
    pub run_id: RunId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunLedger {
    resources: BTreeMap<String, BTreeMap<String, RunId>>,
}

impl RunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later records for the same (resource, structure) overwrite the run id.
    pub fn record(&mut self, record: RunRecord<'_>) {
        self.resources
            .entry(record.resource.to_string())
            .or_default()
            .insert(record.structure_id.to_string(), record.run_id);
    }

    pub fn merge(&mut self, other: &RunLedger) {
        for (resource, runs) in &other.resources {
            let entry = self.resources.entry(resource.clone()).or_default();
            for (structure_id, run_id) in runs {
                entry.insert(structure_id.clone(), *run_id);
            }
        }
    }

    pub fn run_for(&self, resource: &str, structure_id: StructureId) -> Option<RunId> {
        self.resources
            .get(resource)
            .and_then(|runs| runs.get(&structure_id.to_string()))
            .copied()
    }

    pub fn runs_for(&self, resource: &str) -> Option<&BTreeMap<String, RunId>> {
        self.resources.get(resource)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.values().all(BTreeMap::is_empty)
    }

    pub fn len(&self) -> usize {
        self.resources.values().map(BTreeMap::len).sum()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to read run ledger '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse run ledger '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to create run ledger directory '{}': {source}", path.display())]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize run ledger '{}': {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write run ledger '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<LedgerError> for BenchError {
    fn from(error: LedgerError) -> Self {
        let message = error.to_string();
        match error {
            LedgerError::Parse { .. } => BenchError::input_validation("INPUT.LEDGER", message),
            LedgerError::Serialize { .. } => BenchError::internal("SYS.LEDGER", message),
            LedgerError::Read { .. }
            | LedgerError::Directory { .. }
            | LedgerError::Write { .. } => BenchError::io_system("IO.LEDGER", message),
        }
    }
}

/// Storage capability for the run ledger.
pub trait Ledger {
    fn location(&self) -> String;
    fn load(&self) -> BenchResult<RunLedger>;
    fn store(&self, ledger: &RunLedger) -> BenchResult<()>;

    /// Reads the current contents, merges `update` into them and writes the result.
    fn merge_and_store(&self, update: &RunLedger) -> BenchResult<RunLedger> {
        let mut merged = self.load()?;
        merged.merge(update);
        self.store(&merged)?;
        Ok(merged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonLedgerFile {
    path: PathBuf,
}

impl JsonLedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<RunLedger, LedgerError> {
        if !self.path.exists() {
            return Ok(RunLedger::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| LedgerError::Read {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(RunLedger::new());
        }
        serde_json::from_str(&content).map_err(|source| LedgerError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, ledger: &RunLedger) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| LedgerError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string(ledger).map_err(|source| LedgerError::Serialize {
            path: self.path.clone(),
            source,
        })?;
        write_text_artifact(&self.path, &content).map_err(|source| LedgerError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl Ledger for JsonLedgerFile {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> BenchResult<RunLedger> {
        Ok(self.read()?)
    }

    fn store(&self, ledger: &RunLedger) -> BenchResult<()> {
        Ok(self.write(ledger)?)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    contents: RefCell<RunLedger>,
    writes: RefCell<usize>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(ledger: RunLedger) -> Self {
        Self {
            contents: RefCell::new(ledger),
            writes: RefCell::new(0),
        }
    }

    pub fn contents(&self) -> RunLedger {
        self.contents.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }
}

impl Ledger for InMemoryLedger {
    fn location(&self) -> String {
        "<memory>".to_string()
    }

    fn load(&self) -> BenchResult<RunLedger> {
        Ok(self.contents.borrow().clone())
    }

    fn store(&self, ledger: &RunLedger) -> BenchResult<()> {
        *self.contents.borrow_mut() = ledger.clone();
        *self.writes.borrow_mut() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryLedger, JsonLedgerFile, Ledger, RunLedger, RunRecord};
    use serde_json::{Value, json};
    use std::fs;
    use tempfile::TempDir;

    fn single(resource: &str, structure_id: u64, run_id: u64) -> RunLedger {
        let mut ledger = RunLedger::new();
        ledger.record(RunRecord {
            resource,
            structure_id,
            run_id,
        });
        ledger
    }

    #[test]
    fn merging_keeps_prior_entries_for_the_same_resource() {
        let temp = TempDir::new().expect("tempdir should be created");
        let file = JsonLedgerFile::new(temp.path().join("run_info.json"));

        file.merge_and_store(&single("deneb", 3, 101))
            .expect("first write should succeed");
        file.merge_and_store(&single("deneb", 7, 202))
            .expect("second write should succeed");

        let written: Value = serde_json::from_str(
            &fs::read_to_string(file.path()).expect("ledger should be readable"),
        )
        .expect("ledger should be JSON");
        assert_eq!(written, json!({"deneb": {"3": 101, "7": 202}}));
    }

    #[test]
    fn later_runs_overwrite_the_same_structure_key() {
        let mut ledger = single("deneb", 3, 101);
        ledger.merge(&single("deneb", 3, 150));
        ledger.merge(&single("fidis", 3, 9));

        assert_eq!(ledger.run_for("deneb", 3), Some(150));
        assert_eq!(ledger.run_for("fidis", 3), Some(9));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn missing_or_empty_file_loads_as_empty_ledger() {
        let temp = TempDir::new().expect("tempdir should be created");
        let missing = JsonLedgerFile::new(temp.path().join("absent.json"));
        assert!(missing.load().expect("missing file is empty").is_empty());

        let empty_path = temp.path().join("empty.json");
        fs::write(&empty_path, "").expect("empty file should be written");
        assert!(JsonLedgerFile::new(&empty_path).load().expect("empty").is_empty());
    }

    #[test]
    fn malformed_ledger_is_an_input_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("broken.json");
        fs::write(&path, "{ not json").expect("file should be written");

        let error = JsonLedgerFile::new(&path)
            .load()
            .expect_err("malformed ledger should fail");
        assert_eq!(error.placeholder(), "INPUT.LEDGER");
    }

    #[test]
    fn in_memory_ledger_counts_writes() {
        let ledger = InMemoryLedger::with_contents(single("deneb", 1, 10));
        ledger
            .merge_and_store(&single("deneb", 2, 20))
            .expect("in-memory store cannot fail");

        assert_eq!(ledger.write_count(), 1);
        assert_eq!(ledger.contents().run_for("deneb", 1), Some(10));
        assert_eq!(ledger.contents().run_for("deneb", 2), Some(20));
    }
}
