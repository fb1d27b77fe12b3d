use super::PotentialAssignment;
use crate::common::elements::canonical_symbol;
use crate::domain::{BenchError, BenchResult};

const GW_SUFFIX: &str = "_GW";

/// Recommended PAW variant per element for GW-ready SCF runs; the `_GW`
/// suffix is appended on lookup.
const GW_BASE_VARIANTS: &[(&str, &str)] = &[
    ("H", "H"),
    ("He", "He"),
    ("Li", "Li_sv"),
    ("Be", "Be_sv"),
    ("B", "B"),
    ("C", "C"),
    ("N", "N"),
    ("O", "O"),
    ("F", "F"),
    ("Ne", "Ne"),
    ("Na", "Na_sv"),
    ("Mg", "Mg_sv"),
    ("Al", "Al"),
    ("Si", "Si"),
    ("P", "P"),
    ("S", "S"),
    ("Cl", "Cl"),
    ("Ar", "Ar"),
    ("K", "K_sv"),
    ("Ca", "Ca_sv"),
    ("Sc", "Sc_sv"),
    ("Ti", "Ti_sv"),
    ("V", "V_sv"),
    ("Cr", "Cr_sv"),
    ("Mn", "Mn_sv"),
    ("Fe", "Fe_sv"),
    ("Co", "Co_sv"),
    ("Ni", "Ni_sv"),
    ("Cu", "Cu_sv"),
    ("Zn", "Zn_sv"),
    ("Ga", "Ga_d"),
    ("Ge", "Ge_d"),
    ("As", "As"),
    ("Se", "Se"),
    ("Br", "Br"),
    ("Kr", "Kr"),
    ("Rb", "Rb_sv"),
    ("Sr", "Sr_sv"),
    ("Y", "Y_sv"),
    ("Zr", "Zr_sv"),
    ("Nb", "Nb_sv"),
    ("Mo", "Mo_sv"),
    ("Tc", "Tc_sv"),
    ("Ru", "Ru_sv"),
    ("Rh", "Rh_sv"),
    ("Pd", "Pd_sv"),
    ("Ag", "Ag_sv"),
    ("Cd", "Cd_sv"),
    ("In", "In_d"),
    ("Sn", "Sn_d"),
    ("Sb", "Sb_d"),
    ("Te", "Te"),
    ("I", "I"),
    ("Xe", "Xe"),
    ("Cs", "Cs_sv"),
    ("Ba", "Ba_sv"),
    ("La", "La"),
    ("Hf", "Hf_sv"),
    ("Ta", "Ta_sv"),
    ("W", "W_sv"),
    ("Re", "Re_sv"),
    ("Os", "Os_sv"),
    ("Ir", "Ir"),
    ("Pt", "Pt"),
    ("Au", "Au"),
    ("Hg", "Hg"),
    ("Tl", "Tl_d"),
    ("Pb", "Pb_d"),
    ("Bi", "Bi_d"),
    ("Po", "Po_d"),
    ("Rn", "Rn"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PotentialCatalog;

impl PotentialCatalog {
    pub fn variant_for(&self, element: &str) -> Option<String> {
        let symbol = canonical_symbol(element)?;
        GW_BASE_VARIANTS
            .iter()
            .find(|(candidate, _)| *candidate == symbol)
            .map(|(_, base)| format!("{}{}", base, GW_SUFFIX))
    }

    /// Maps every requested element onto its potential variant, failing on the
    /// first element without an entry.
    pub fn resolve<'a, I>(&self, elements: I) -> BenchResult<PotentialAssignment>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut assignment = PotentialAssignment::new();
        for element in elements {
            let variant = self
                .variant_for(element)
                .ok_or_else(|| BenchError::unknown_element(element))?;
            assignment.insert(element.to_string(), variant);
        }
        Ok(assignment)
    }
}
