//! Per-structure derivation of solver parameters.
//!
//! Everything here is a pure function of the structure, the assigned
//! potentials and the experiment settings, so repeated planning of the same
//! structure yields identical parameter sets.

mod cutoff;
mod magnetism;

pub use cutoff::{CutoffMode, derive_cutoff};
pub use magnetism::{
    MagneticReference, MagneticReferenceTable, Magnetism, SpinTreatment, derive_magnetism,
};

use crate::common::constants::{RY_TO_EV, SCF_EDIFF, SCF_SMEARING_RY};
use crate::domain::{BenchResult, ParameterSet, Structure};
use crate::potentials::AssignedPotentials;
use serde_json::json;

/// Accurate Gaussian-smeared SCF preset every benchmark run starts from.
pub fn scf_base_preset() -> ParameterSet {
    let mut preset = ParameterSet::new();
    preset.insert("prec", "Accurate");
    preset.insert("ismear", 0);
    preset.insert("sigma", SCF_SMEARING_RY * RY_TO_EV);
    preset.insert("ediff", SCF_EDIFF);
    preset
}

/// `floor(sqrt(cores))`, suitable for NCORE.
pub fn derive_parallelization_hint(core_count: Option<u32>) -> Option<u32> {
    let cores = u64::from(core_count.filter(|cores| *cores > 0)?);
    let mut hint = (cores as f64).sqrt().floor() as u64;
    while hint * hint > cores {
        hint -= 1;
    }
    while (hint + 1) * (hint + 1) <= cores {
        hint += 1;
    }
    u32::try_from(hint).ok()
}

/// Merges in the fixed order base < hint < magnetism < cutoff < explicit overrides.
pub fn build_parameter_set(
    base: &ParameterSet,
    magnetism: &Magnetism,
    cutoff: Option<f64>,
    hint: Option<u32>,
    explicit: &ParameterSet,
) -> ParameterSet {
    let mut parameters = base.clone();

    if let Some(hint) = hint {
        parameters.insert("ncore", hint);
    }

    if magnetism.treatment == SpinTreatment::CollinearSpin {
        parameters.insert("ispin", magnetism.spin_count());
        if let Some(moments) = &magnetism.moments {
            parameters.insert("magmom", json!(moments));
        }
    }

    if let Some(cutoff) = cutoff {
        parameters.insert("enmax", cutoff);
    }

    parameters.merge(explicit);
    parameters
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedParameters {
    pub magnetism: Magnetism,
    pub cutoff: Option<f64>,
    pub cutoff_mode: CutoffMode,
    pub parallelization_hint: Option<u32>,
    pub overrides: ParameterSet,
}

impl DerivedParameters {
    pub fn parameter_set(&self, base: &ParameterSet) -> ParameterSet {
        build_parameter_set(
            base,
            &self.magnetism,
            self.cutoff,
            self.parallelization_hint,
            &self.overrides,
        )
    }

    pub fn magnetism_description(&self) -> &'static str {
        self.magnetism.treatment.description()
    }

    pub fn cutoff_description(&self) -> String {
        self.cutoff_mode.description()
    }
}

#[derive(Debug, Clone)]
pub struct ParameterDeriver {
    reference: MagneticReferenceTable,
    base: ParameterSet,
}

impl ParameterDeriver {
    pub fn new(reference: MagneticReferenceTable) -> Self {
        Self {
            reference,
            base: scf_base_preset(),
        }
    }

    pub fn with_base(mut self, base: ParameterSet) -> Self {
        self.base = base;
        self
    }

    pub fn base(&self) -> &ParameterSet {
        &self.base
    }

    pub fn derive(
        &self,
        structure: &Structure,
        potentials: &AssignedPotentials,
        cutoff_mode: CutoffMode,
        core_count: Option<u32>,
        overrides: &ParameterSet,
    ) -> BenchResult<DerivedParameters> {
        let magnetism = derive_magnetism(structure, potentials, &self.reference)?;
        let cutoff = derive_cutoff(potentials, cutoff_mode)?;
        Ok(DerivedParameters {
            magnetism,
            cutoff,
            cutoff_mode,
            parallelization_hint: derive_parallelization_hint(core_count),
            overrides: overrides.clone(),
        })
    }
}
