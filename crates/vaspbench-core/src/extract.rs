//! Physical results pulled from a calculation's raw outputs.
//!
//! Every quantity degrades on its own: a missing log leaves the symmetry and
//! timing fields empty but still reports energy and forces from the
//! structured report.

use crate::domain::{CalculationRecord, KpointMesh};
use crate::outputs::{OutcarLog, OutputCache, VasprunReport};
use serde_json::Value;
use std::cmp::Ordering;
use tracing::warn;

/// Composite ordering of calculations in a summary: spin components, site
/// count, formula, cutoff, then wall-clock time, all ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub spin_components: usize,
    pub site_count: usize,
    pub formula: String,
    pub cutoff: f64,
    pub wall_clock: f64,
}

impl Eq for SortKey {}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.spin_components
            .cmp(&other.spin_components)
            .then(self.site_count.cmp(&other.site_count))
            .then_with(|| self.formula.cmp(&other.formula))
            .then(self.cutoff.total_cmp(&other.cutoff))
            .then(self.wall_clock.total_cmp(&other.wall_clock))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSymmetries {
    pub operations: Option<usize>,
    pub point_symmetry: Option<String>,
    /// Point group of the full space group; empty when the log omits it.
    pub space_group: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedResult {
    pub energy: Option<f64>,
    pub forces: Option<Vec<Vec<f64>>>,
    pub stress: Option<Vec<Vec<f64>>>,
    pub electron_count: Option<f64>,
    pub cutoff: Option<f64>,
    pub requested_kpoints: KpointMesh,
    pub computed_kpoints: Option<usize>,
    pub symmetries: Option<CellSymmetries>,
    pub wall_clock: Option<f64>,
    pub spin_components: Option<usize>,
    pub scf_iterations: Option<usize>,
    /// SCF steps of the final ionic step.
    pub final_scf_iterations: Option<usize>,
}

/// Human-readable reasons a calculation cannot be summarized; empty when it can.
pub fn sanity_notices(calculation: &CalculationRecord, cache: &mut OutputCache) -> Vec<String> {
    let mut notices = Vec::new();
    if !calculation.state.has_outputs() {
        notices.push(format!(
            "Calculation state is {}: skipping",
            calculation.state
        ));
    }
    if let Err(error) = cache.report(calculation) {
        notices.push(format!("vasprun.xml could not be read ({}): skipping", error));
    }
    notices
}

pub fn sanity_check(calculation: &CalculationRecord, cache: &mut OutputCache) -> bool {
    sanity_notices(calculation, cache).is_empty()
}

pub fn sort_key(calculation: &CalculationRecord, cache: &mut OutputCache) -> SortKey {
    let report = cache.report(calculation).ok();
    let spin_components = match &report {
        Some(report) => report.spin_count(),
        None => calculation
            .parameters
            .get_i64("ispin")
            .and_then(|ispin| usize::try_from(ispin).ok())
            .unwrap_or(1),
    };
    let cutoff = report
        .as_ref()
        .and_then(|report| report.scalar_f64("ENMAX"))
        .unwrap_or(0.0);
    let wall_clock = cache
        .log(calculation)
        .map(|log| wall_clock_time(&log))
        .unwrap_or(0.0);

    SortKey {
        spin_components,
        site_count: calculation.structure.structure.site_count(),
        formula: calculation.formula(),
        cutoff,
        wall_clock,
    }
}

/// Output parameters first, then the nested `energies` section, then the
/// structured report.
pub fn free_energy(calculation: &CalculationRecord, report: Option<&VasprunReport>) -> Option<f64> {
    let outputs = calculation.output_parameters.as_ref();
    outputs
        .and_then(|outputs| outputs.get("free_energy"))
        .and_then(Value::as_f64)
        .or_else(|| {
            outputs
                .and_then(|outputs| outputs.get("energies"))
                .and_then(|energies| energies.get("free_energy"))
                .and_then(Value::as_f64)
        })
        .or_else(|| report.and_then(VasprunReport::final_free_energy))
}

pub fn cell_symmetries(log: &OutcarLog) -> CellSymmetries {
    CellSymmetries {
        operations: log.space_group_operations(),
        point_symmetry: log.point_symmetry().map(str::to_string),
        space_group: log.space_group().unwrap_or_default().to_string(),
    }
}

pub fn wall_clock_time(log: &OutcarLog) -> f64 {
    log.elapsed_seconds().unwrap_or(0.0)
}

pub fn computed_kpoints(
    calculation: &CalculationRecord,
    report: Option<&VasprunReport>,
) -> Option<usize> {
    calculation
        .computed_kpoints
        .or_else(|| report.and_then(VasprunReport::kpoint_count))
}

pub fn extract(calculation: &CalculationRecord, cache: &mut OutputCache) -> ExtractedResult {
    let report = cache.report(calculation).ok();
    let report = report.as_deref();
    let log = match cache.log(calculation) {
        Ok(log) => Some(log),
        Err(error) => {
            warn!(run_id = calculation.id, %error, "solver log unavailable");
            None
        }
    };

    ExtractedResult {
        energy: free_energy(calculation, report),
        forces: report.and_then(|report| report.varray("forces")),
        stress: report.and_then(|report| report.varray("stress")),
        electron_count: report.and_then(|report| report.scalar_f64("NELECT")),
        cutoff: report.and_then(|report| report.scalar_f64("ENMAX")),
        requested_kpoints: calculation.kpoints,
        computed_kpoints: computed_kpoints(calculation, report),
        symmetries: log.as_deref().map(cell_symmetries),
        wall_clock: log.as_deref().map(wall_clock_time),
        spin_components: report.map(VasprunReport::spin_count),
        scf_iterations: report.map(VasprunReport::scf_step_count),
        final_scf_iterations: report.and_then(VasprunReport::final_ionic_scf_step_count),
    }
}
