use super::outcar::OutcarLog;
use super::vasprun::{ReportError, VasprunReport};
use crate::domain::{CalculationRecord, RunId};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

pub const REPORT_FILE_NAME: &str = "vasprun.xml";
pub const LOG_FILE_NAME: &str = "OUTCAR";

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("run has no retrieved output directory")]
    NotRetrieved,
    #[error("solver log '{}' could not be read: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub struct ParsedCalculation {
    pub report: Result<Rc<VasprunReport>, ReportError>,
    pub log: Result<Rc<OutcarLog>, LogError>,
}

/// Memoized raw outputs keyed by run id, owned by one summarizing pass.
///
/// Report outcomes are cached whether or not they parsed, so an unreadable
/// report is read once. Log read failures are not cached and are retried on
/// the next request.
#[derive(Debug, Default)]
pub struct OutputCache {
    reports: HashMap<RunId, Result<Rc<VasprunReport>, ReportError>>,
    logs: HashMap<RunId, Rc<OutcarLog>>,
    report_reads: usize,
}

impl OutputCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, calculation: &CalculationRecord) -> ParsedCalculation {
        ParsedCalculation {
            report: self.report(calculation),
            log: self.log(calculation),
        }
    }

    pub fn report(
        &mut self,
        calculation: &CalculationRecord,
    ) -> Result<Rc<VasprunReport>, ReportError> {
        if let Some(cached) = self.reports.get(&calculation.id) {
            return cached.clone();
        }

        self.report_reads += 1;
        let loaded = match &calculation.retrieved_dir {
            Some(dir) => VasprunReport::from_path(&dir.join(REPORT_FILE_NAME)).map(Rc::new),
            None => Err(ReportError::NotRetrieved),
        };
        self.reports.insert(calculation.id, loaded.clone());
        loaded
    }

    pub fn log(&mut self, calculation: &CalculationRecord) -> Result<Rc<OutcarLog>, LogError> {
        if let Some(cached) = self.logs.get(&calculation.id) {
            return Ok(Rc::clone(cached));
        }

        let dir = calculation
            .retrieved_dir
            .as_ref()
            .ok_or(LogError::NotRetrieved)?;
        let path = dir.join(LOG_FILE_NAME);
        let log = Rc::new(OutcarLog::from_path(&path).map_err(|source| LogError::Read {
            path: path.clone(),
            source,
        })?);
        self.logs.insert(calculation.id, Rc::clone(&log));
        Ok(log)
    }

    /// Number of report reads that reached the filesystem.
    pub fn report_reads(&self) -> usize {
        self.report_reads
    }
}
