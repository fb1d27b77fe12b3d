use super::bundle::SolverInputBundle;
use crate::domain::{BenchResult, RunId, StoredStructure};

pub trait StructureSource {
    /// All structures of a named collection; an unknown name is an error.
    fn collection(&self, name: &str) -> BenchResult<Vec<StoredStructure>>;
}

/// Execution-engine side of planning: groups, submission and provenance.
pub trait SubmissionBackend {
    fn group_exists(&self, name: &str) -> BenchResult<bool>;

    /// Returns `true` when the group was created by this call.
    fn get_or_create_group(&self, name: &str) -> BenchResult<bool>;

    fn submit(&self, bundle: &SolverInputBundle) -> BenchResult<RunId>;

    fn annotate(&self, run_id: RunId, key: &str, value: &str) -> BenchResult<()>;

    /// Adding a run that is already a member is a no-op.
    fn add_to_group(&self, group: &str, run_id: RunId) -> BenchResult<()>;
}
