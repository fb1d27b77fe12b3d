use crate::domain::{BenchError, BenchResult, CalculationRecord, RunId};
use crate::extract::{ExtractedResult, extract, sanity_notices, sort_key};
use crate::outputs::OutputCache;
use crate::planner::RunAnnotations;
use crate::serialization::format_vector_rows;
use tracing::{info, warn};

const MISSING: &str = "n/a";

/// A group member as read from the store. A record that cannot be read stays
/// in the list so it is reported in place of its summary block.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMember {
    pub run_id: RunId,
    pub record: BenchResult<CalculationRecord>,
}

pub trait CalculationStore {
    /// Members of a named group; only an unknown group is an error.
    fn group_members(&self, name: &str) -> BenchResult<Vec<GroupMember>>;
}

fn or_missing<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |value| value.to_string())
}

fn push_rows(report: &mut String, title: &str, rows: Option<&Vec<Vec<f64>>>) {
    report.push_str(&format!("{}:\n", title));
    match rows {
        Some(rows) if !rows.is_empty() => {
            report.push_str(&format!("{}\n", format_vector_rows(rows, 14, 8)));
        }
        _ => report.push_str(&format!("{}\n", MISSING)),
    }
}

/// Report block for one calculation that passed the sanity check.
pub fn render_result(calculation: &CalculationRecord, result: &ExtractedResult) -> String {
    let mut report = String::new();
    report.push_str(&format!(
        "Number of atoms / electrons: {}/{}\n",
        calculation.structure.structure.site_count(),
        or_missing(result.electron_count)
    ));

    report.push_str("POTCARs:\n");
    for potential in &calculation.potentials {
        report.push_str(&format!(
            "{}: {} ({})\n",
            potential.element, potential.full_name, potential.md5
        ));
    }

    report.push_str(&format!("Cutoff (rho/wfc) (eV): {}\n", or_missing(result.cutoff)));
    report.push_str(&format!(
        "Input k-point mesh: {:?} offset: {:?}\n",
        result.requested_kpoints.mesh, result.requested_kpoints.offset
    ));
    report.push_str(&format!("Computed k-points: {}\n", or_missing(result.computed_kpoints)));
    report.push_str(&format!("Total energy (eV): {}\n", or_missing(result.energy)));
    push_rows(&mut report, "Total forces (eV/Angstrom)", result.forces.as_ref());
    push_rows(&mut report, "Total stress (kBar)", result.stress.as_ref());

    match &result.symmetries {
        Some(symmetries) => {
            report.push_str(&format!("Cell symmetries: {}\n", or_missing(symmetries.operations)));
            let space_group = if symmetries.space_group.is_empty() {
                String::new()
            } else {
                format!(" ({})", symmetries.space_group)
            };
            report.push_str(&format!(
                "VASP computed point group(s): {}{}\n",
                symmetries.point_symmetry.as_deref().unwrap_or(MISSING),
                space_group
            ));
        }
        None => {
            report.push_str(&format!("Cell symmetries: {}\n", MISSING));
            report.push_str(&format!("VASP computed point group(s): {}\n", MISSING));
        }
    }

    report.push_str(&format!(
        "Magnetic treatment: {} ({} spin components)\n",
        calculation
            .extra(RunAnnotations::MAGNETISM_KEY)
            .unwrap_or("unknown"),
        or_missing(result.spin_components)
    ));
    // total, then the steps of the final ionic step
    report.push_str(&format!(
        "Number of SCF iterations (total): {} ({})\n",
        or_missing(result.scf_iterations),
        or_missing(result.final_scf_iterations)
    ));
    report.push_str(&format!("Wall-clock time: {}\n", or_missing(result.wall_clock)));
    report
}

fn render_unreadable(run_id: RunId, error: &BenchError) -> String {
    format!(
        "=== {} - unreadable ===\nCalculation record could not be read ({}): skipping\n",
        run_id,
        error.message()
    )
}

/// Orders and renders the calculations of benchmark groups.
pub struct SummaryRanker<'a> {
    store: &'a dyn CalculationStore,
}

impl<'a> SummaryRanker<'a> {
    pub fn new(store: &'a dyn CalculationStore) -> Self {
        Self { store }
    }

    pub fn rank(
        &self,
        mut calculations: Vec<CalculationRecord>,
        cache: &mut OutputCache,
    ) -> Vec<CalculationRecord> {
        calculations.sort_by_cached_key(|calculation| sort_key(calculation, cache));
        calculations
    }

    pub fn render_calculation(
        &self,
        calculation: &CalculationRecord,
        cache: &mut OutputCache,
    ) -> String {
        let mut block = format!("=== {} - {} ===\n", calculation.id, calculation.formula());

        let notices = sanity_notices(calculation, cache);
        if !notices.is_empty() {
            for notice in &notices {
                warn!(run_id = calculation.id, notice = %notice, "skipping calculation");
                block.push_str(notice);
                block.push('\n');
            }
            return block;
        }

        let result = extract(calculation, cache);
        block.push_str(&render_result(calculation, &result));
        block
    }

    /// Unreadable records come first in run order, then the ranked calculations.
    fn render_members(
        &self,
        name: &str,
        members: Vec<GroupMember>,
        cache: &mut OutputCache,
    ) -> String {
        info!(group = name, calculations = members.len(), "summarizing group");

        let mut report = format!("Group: {}\n\n", name);
        let mut calculations = Vec::with_capacity(members.len());
        for member in members {
            match member.record {
                Ok(calculation) => calculations.push(calculation),
                Err(error) => {
                    warn!(run_id = member.run_id, %error, "unreadable calculation record");
                    report.push_str(&render_unreadable(member.run_id, &error));
                    report.push('\n');
                }
            }
        }
        for calculation in self.rank(calculations, cache) {
            report.push_str(&self.render_calculation(&calculation, cache));
            report.push('\n');
        }
        report
    }

    pub fn render_group(&self, name: &str, cache: &mut OutputCache) -> BenchResult<String> {
        let members = self.store.group_members(name)?;
        Ok(self.render_members(name, members, cache))
    }

    /// Every group is resolved before anything is rendered, so an unknown
    /// name fails the whole summary.
    pub fn render(&self, names: &[String], cache: &mut OutputCache) -> BenchResult<String> {
        let mut groups = Vec::with_capacity(names.len());
        for name in names {
            groups.push((name, self.store.group_members(name)?));
        }

        let mut report = String::new();
        for (name, members) in groups {
            report.push_str(&self.render_members(name, members, cache));
        }
        Ok(report)
    }
}
