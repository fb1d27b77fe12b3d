mod cache;
mod outcar;
mod vasprun;

pub use cache::{LOG_FILE_NAME, LogError, OutputCache, ParsedCalculation, REPORT_FILE_NAME};
pub use outcar::OutcarLog;
pub use vasprun::{ReportError, VasprunReport};

#[cfg(test)]
pub(crate) use outcar::fixtures as log_fixtures;
#[cfg(test)]
pub(crate) use vasprun::fixtures as report_fixtures;
