use crate::domain::{BenchError, RunId};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read store file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse store file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write store file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("'{name}' is not a valid {kind} name")]
    InvalidName { kind: &'static str, name: String },
    #[error("structure collection '{0}' does not exist")]
    UnknownCollection(String),
    #[error("potential family '{0}' does not exist")]
    UnknownFamily(String),
    #[error("group '{0}' does not exist")]
    UnknownGroup(String),
    #[error("run {0} does not exist")]
    UnknownRun(RunId),
}

impl From<StoreError> for BenchError {
    fn from(error: StoreError) -> Self {
        let message = error.to_string();
        match error {
            StoreError::Read { .. } | StoreError::Write { .. } => {
                BenchError::io_system("IO.STORE", message)
            }
            StoreError::Parse { .. } => BenchError::input_validation("INPUT.STORE", message),
            StoreError::InvalidName { .. } => {
                BenchError::input_validation("INPUT.STORE_NAME", message)
            }
            StoreError::UnknownCollection(_) => {
                BenchError::input_validation("INPUT.UNKNOWN_COLLECTION", message)
            }
            StoreError::UnknownFamily(_) => {
                BenchError::input_validation("INPUT.UNKNOWN_POTENTIAL_FAMILY", message)
            }
            StoreError::UnknownGroup(_) => {
                BenchError::input_validation("INPUT.UNKNOWN_GROUP", message)
            }
            StoreError::UnknownRun(_) => BenchError::input_validation("INPUT.UNKNOWN_RUN", message),
        }
    }
}
