//! Planning and submission of one benchmark experiment.
//!
//! A run is linear: resolve the computer, load and filter the structure
//! collection, resolve the output group, then derive and dispatch one bundle
//! per structure. The ledger is merged and rewritten once, after the last
//! submission, and never during a dry run. A failure while deriving any
//! structure aborts the run; runs submitted before it stay submitted and
//! grouped but are not recorded in the ledger.

mod bundle;
mod computer;
mod config;
mod traits;

pub use bundle::{ParserSettings, RunAnnotations, SolverInputBundle, SolverSettings};
pub use computer::{ComputerOptions, ComputerProfile, ComputerRegistry, Resources};
pub use config::{
    DEFAULT_LEDGER_PATH, ExperimentConfig, ExperimentFile, ExperimentOverrides,
    NON_PERTURBED_COLLECTION, PERTURBED_COLLECTION, TestSet, resolve,
};
pub use traits::{StructureSource, SubmissionBackend};

use crate::common::constants::{KPOINT_DENSITY, KPOINT_OFFSET};
use crate::domain::{BenchResult, PotentialInput, RunId, StoredStructure, StructureId};
use crate::kpoints::mesh_from_density;
use crate::ledger::{Ledger, RunLedger, RunRecord};
use crate::params::ParameterDeriver;
use crate::potentials::{PotentialCatalog, PotentialProvider};
use tracing::{debug, info, warn};

/// A fully derived run for one structure, not yet dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRun {
    pub structure_id: StructureId,
    pub formula: String,
    pub bundle: SolverInputBundle,
    pub annotations: RunAnnotations,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    DryRun {
        formula: String,
        bundle: Box<SolverInputBundle>,
    },
    Submitted {
        structure_id: StructureId,
        formula: String,
        run_id: RunId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub group_name: String,
    pub group_created: bool,
    pub dry_run: bool,
    pub ledger_location: String,
    pub dispatches: Vec<Dispatch>,
    /// Ledger contents after the merge; `None` for dry runs.
    pub ledger: Option<RunLedger>,
}

impl RunOutcome {
    pub fn group_message(&self) -> String {
        format!(
            "Appending to {} group {}.",
            if self.group_created { "new" } else { "existing" },
            self.group_name
        )
    }

    pub fn submitted_count(&self) -> usize {
        self.dispatches
            .iter()
            .filter(|dispatch| matches!(dispatch, Dispatch::Submitted { .. }))
            .count()
    }
}

pub struct RunPlanner<'a> {
    structures: &'a dyn StructureSource,
    potentials: &'a dyn PotentialProvider,
    backend: &'a dyn SubmissionBackend,
    ledger: &'a dyn Ledger,
    deriver: ParameterDeriver,
    computers: ComputerRegistry,
    catalog: PotentialCatalog,
}

impl<'a> RunPlanner<'a> {
    pub fn new(
        structures: &'a dyn StructureSource,
        potentials: &'a dyn PotentialProvider,
        backend: &'a dyn SubmissionBackend,
        ledger: &'a dyn Ledger,
        deriver: ParameterDeriver,
    ) -> Self {
        Self {
            structures,
            potentials,
            backend,
            ledger,
            deriver,
            computers: ComputerRegistry::builtin(),
            catalog: PotentialCatalog,
        }
    }

    pub fn with_computers(mut self, computers: ComputerRegistry) -> Self {
        self.computers = computers;
        self
    }

    /// Structures of the configured test set that pass the formula allow-list.
    pub fn select_structures(
        &self,
        config: &ExperimentConfig,
    ) -> BenchResult<Vec<StoredStructure>> {
        let collection = config.test_set.collection_name();
        let structures = self.structures.collection(collection)?;
        let total = structures.len();
        let selected: Vec<StoredStructure> = structures
            .into_iter()
            .filter(|stored| config.selects_formula(&stored.structure.formula()))
            .collect();
        info!(
            collection,
            total,
            selected = selected.len(),
            "selected benchmark structures"
        );
        Ok(selected)
    }

    pub fn plan_structure(
        &self,
        config: &ExperimentConfig,
        profile: &ComputerProfile,
        stored: &StoredStructure,
    ) -> BenchResult<PlannedRun> {
        let structure = &stored.structure;
        let formula = structure.formula();

        let assignment = self.catalog.resolve(structure.elements())?;
        let potentials = self
            .potentials
            .potentials(&config.potential_family, &assignment)?;
        let derived = self.deriver.derive(
            structure,
            &potentials,
            config.cutoff,
            profile.core_count(),
            &config.overrides,
        )?;
        let parameters = derived.parameter_set(self.deriver.base());
        let kpoints = mesh_from_density(structure, KPOINT_DENSITY, KPOINT_OFFSET)?;

        debug!(
            structure_id = stored.id,
            formula = %formula,
            spin = derived.magnetism.spin_count(),
            cutoff = ?derived.cutoff,
            ncore = ?derived.parallelization_hint,
            mesh = ?kpoints.mesh,
            "derived solver parameters"
        );

        let bundle = SolverInputBundle {
            code: profile.code.clone(),
            structure: stored.clone(),
            kpoints,
            potential_family: config.potential_family.clone(),
            potentials: potentials
                .iter()
                .map(|(element, data)| PotentialInput {
                    element: element.clone(),
                    full_name: data.full_name.clone(),
                    md5: data.md5.clone(),
                })
                .collect(),
            potential_mapping: assignment,
            parameters,
            options: profile.options.clone(),
            settings: SolverSettings::default(),
        };

        Ok(PlannedRun {
            structure_id: stored.id,
            formula,
            bundle,
            annotations: RunAnnotations {
                magnetism: derived.magnetism_description().to_string(),
                cutoff: derived.cutoff_description(),
            },
        })
    }

    fn submit_planned(&self, group: &str, planned: &PlannedRun) -> BenchResult<RunId> {
        let run_id = self.backend.submit(&planned.bundle)?;
        for (key, value) in planned.annotations.entries() {
            self.backend.annotate(run_id, key, value)?;
        }
        self.backend.add_to_group(group, run_id)?;
        info!(
            structure_id = planned.structure_id,
            formula = %planned.formula,
            run_id,
            "submitted benchmark run"
        );
        Ok(run_id)
    }

    pub fn run(&self, config: &ExperimentConfig) -> BenchResult<RunOutcome> {
        let profile = self.computers.resolve(&config.resource)?;
        let ledger_location = self.ledger.location();

        // Fail on an unreadable ledger before anything is submitted.
        if !config.dry_run {
            let existing = self.ledger.load()?;
            debug!(entries = existing.len(), ledger = %ledger_location, "loaded run ledger");
        }

        let structures = self.select_structures(config)?;

        let group_created = if config.dry_run {
            !self.backend.group_exists(&config.group_name)?
        } else {
            self.backend.get_or_create_group(&config.group_name)?
        };

        let mut dispatches = Vec::with_capacity(structures.len());
        let mut update = RunLedger::new();
        for stored in &structures {
            let planned = match self.plan_structure(config, profile, stored) {
                Ok(planned) => planned,
                Err(error) => {
                    if !update.is_empty() {
                        warn!(
                            submitted = update.len(),
                            ledger = %ledger_location,
                            "aborting after earlier submissions; run ledger is not updated"
                        );
                    }
                    return Err(error);
                }
            };

            if config.dry_run {
                dispatches.push(Dispatch::DryRun {
                    formula: planned.formula,
                    bundle: Box::new(planned.bundle),
                });
                continue;
            }

            let run_id = self.submit_planned(&config.group_name, &planned)?;
            update.record(RunRecord {
                resource: &profile.name,
                structure_id: planned.structure_id,
                run_id,
            });
            dispatches.push(Dispatch::Submitted {
                structure_id: planned.structure_id,
                formula: planned.formula,
                run_id,
            });
        }

        let ledger = if config.dry_run {
            None
        } else {
            let merged = self.ledger.merge_and_store(&update)?;
            info!(ledger = %ledger_location, recorded = update.len(), "run ledger written");
            Some(merged)
        };

        Ok(RunOutcome {
            group_name: config.group_name.clone(),
            group_created,
            dry_run: config.dry_run,
            ledger_location,
            dispatches,
            ledger,
        })
    }
}
