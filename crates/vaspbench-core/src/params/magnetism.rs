use crate::domain::{BenchError, BenchResult, Structure};
use crate::potentials::{AssignedPotentials, unassigned_potential_error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagneticReference {
    pub spin: bool,
    #[serde(default)]
    pub magmom: f64,
}

/// Per-element reference flags deciding whether a structure is run spin-polarized.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MagneticReferenceTable {
    entries: BTreeMap<String, MagneticReference>,
}

impl MagneticReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_path(path: &Path) -> BenchResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| {
            BenchError::io_system(
                "IO.MAGNETIC_REFERENCE",
                format!(
                    "failed to read magnetic reference table '{}': {}",
                    path.display(),
                    source
                ),
            )
        })?;
        serde_json::from_str(&content).map_err(|source| {
            BenchError::input_validation(
                "INPUT.MAGNETIC_REFERENCE",
                format!(
                    "failed to parse magnetic reference table '{}': {}",
                    path.display(),
                    source
                ),
            )
        })
    }

    pub fn insert(&mut self, element: impl Into<String>, reference: MagneticReference) {
        self.entries.insert(element.into(), reference);
    }

    pub fn get(&self, element: &str) -> Option<&MagneticReference> {
        self.entries.get(element)
    }

    fn require(&self, element: &str) -> BenchResult<&MagneticReference> {
        self.get(element).ok_or_else(|| {
            BenchError::computation(
                "RUN.MAGNETIC_REFERENCE",
                format!("no magnetic reference entry for element '{}'", element),
            )
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinTreatment {
    NonSpinPolarized,
    CollinearSpin,
}

impl SpinTreatment {
    pub fn from_spin_count(spin_count: u8) -> BenchResult<Self> {
        match spin_count {
            1 => Ok(Self::NonSpinPolarized),
            2 => Ok(Self::CollinearSpin),
            other => Err(BenchError::invalid_spin_state(other)),
        }
    }

    pub const fn spin_count(self) -> u8 {
        match self {
            Self::NonSpinPolarized => 1,
            Self::CollinearSpin => 2,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::NonSpinPolarized => "non-spin-polarized",
            Self::CollinearSpin => "collinear-spin",
        }
    }
}

impl Display for SpinTreatment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Magnetism {
    pub treatment: SpinTreatment,
    /// One initial moment per site, in site order; present iff spin-polarized.
    pub moments: Option<Vec<f64>>,
}

impl Magnetism {
    pub fn spin_count(&self) -> u8 {
        self.treatment.spin_count()
    }
}

pub fn derive_magnetism(
    structure: &Structure,
    potentials: &AssignedPotentials,
    reference: &MagneticReferenceTable,
) -> BenchResult<Magnetism> {
    let elements = structure.elements();
    let mut is_magnetic = false;
    for element in &elements {
        is_magnetic |= reference.require(element)?.spin;
    }

    let spin_count: u8 = if is_magnetic { 2 } else { 1 };
    let treatment = SpinTreatment::from_spin_count(spin_count)?;
    if treatment == SpinTreatment::NonSpinPolarized {
        return Ok(Magnetism {
            treatment,
            moments: None,
        });
    }

    let mut start_moments: BTreeMap<&str, f64> = BTreeMap::new();
    for element in &elements {
        let potential = potentials
            .get(*element)
            .ok_or_else(|| unassigned_potential_error(element))?;
        if potential.zval <= 0.0 {
            return Err(BenchError::computation(
                "RUN.POTENTIAL_METADATA",
                format!(
                    "potential '{}' for element '{}' reports non-positive valence {}",
                    potential.name, element, potential.zval
                ),
            ));
        }
        let magmom = reference.require(element)?.magmom;
        start_moments.insert(*element, magmom / potential.zval);
    }

    let moments = structure
        .sites
        .iter()
        .map(|site| start_moments[site.element.as_str()])
        .collect();

    Ok(Magnetism {
        treatment,
        moments: Some(moments),
    })
}

#[cfg(test)]
mod tests {
    use super::{MagneticReference, MagneticReferenceTable, SpinTreatment, derive_magnetism};
    use crate::domain::{Site, Structure};
    use crate::potentials::{AssignedPotentials, PotentialData};

    fn potential(zval: f64) -> PotentialData {
        PotentialData {
            name: "test".to_string(),
            full_name: "PAW_PBE test".to_string(),
            zval,
            enmax: 400.0,
            md5: String::new(),
        }
    }

    fn cubic(sites: Vec<Site>) -> Structure {
        Structure::new(
            [[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 3.0]],
            sites,
        )
    }

    #[test]
    fn non_magnetic_structures_stay_unpolarized() {
        let structure = cubic(vec![
            Site::new("Si", [0.0, 0.0, 0.0]),
            Site::new("Si", [0.75, 0.75, 0.75]),
        ]);
        let potentials: AssignedPotentials =
            [("Si".to_string(), potential(4.0))].into_iter().collect();
        let mut reference = MagneticReferenceTable::new();
        reference.insert("Si", MagneticReference { spin: false, magmom: 0.0 });

        let magnetism =
            derive_magnetism(&structure, &potentials, &reference).expect("silicon should derive");
        assert_eq!(magnetism.spin_count(), 1);
        assert_eq!(magnetism.treatment, SpinTreatment::NonSpinPolarized);
        assert!(magnetism.moments.is_none());
    }

    #[test]
    fn magnetic_structures_get_one_moment_per_site_in_order() {
        let structure = cubic(vec![
            Site::new("O", [0.0, 0.0, 0.0]),
            Site::new("Zn", [1.5, 1.5, 1.5]),
            Site::new("Fe", [0.0, 1.5, 1.5]),
            Site::new("Zn", [1.5, 0.0, 0.0]),
        ]);
        let potentials: AssignedPotentials = [
            ("O".to_string(), potential(6.0)),
            ("Zn".to_string(), potential(12.0)),
            ("Fe".to_string(), potential(16.0)),
        ]
        .into_iter()
        .collect();
        let mut reference = MagneticReferenceTable::new();
        reference.insert("O", MagneticReference { spin: false, magmom: 0.0 });
        reference.insert("Zn", MagneticReference { spin: false, magmom: 0.0 });
        reference.insert("Fe", MagneticReference { spin: true, magmom: 4.0 });

        let magnetism =
            derive_magnetism(&structure, &potentials, &reference).expect("FeZn2O should derive");
        let moments = magnetism.moments.expect("moments should be present");

        assert_eq!(magnetism.treatment, SpinTreatment::CollinearSpin);
        assert_eq!(moments.len(), structure.site_count());
        assert_eq!(moments, vec![0.0, 0.0, 0.25, 0.0]);
    }

    #[test]
    fn missing_reference_entry_aborts_derivation() {
        let structure = cubic(vec![Site::new("Si", [0.0, 0.0, 0.0])]);
        let potentials: AssignedPotentials =
            [("Si".to_string(), potential(4.0))].into_iter().collect();

        let error = derive_magnetism(&structure, &potentials, &MagneticReferenceTable::new())
            .expect_err("empty reference table cannot classify Si");
        assert_eq!(error.placeholder(), "RUN.MAGNETIC_REFERENCE");
    }

    #[test]
    fn spin_counts_outside_one_and_two_are_rejected() {
        assert_eq!(
            SpinTreatment::from_spin_count(2).expect("2 is valid"),
            SpinTreatment::CollinearSpin
        );
        let error = SpinTreatment::from_spin_count(3).expect_err("3 is not a collinear spin count");
        assert_eq!(error.placeholder(), "RUN.INVALID_SPIN_STATE");
    }
}
