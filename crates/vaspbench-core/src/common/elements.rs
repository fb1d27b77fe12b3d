//! Periodic-table symbol lookups keyed by atomic number.

pub const MAX_ATOMIC_NUMBER: usize = 103;

pub const ELEMENT_SYMBOLS: [&str; MAX_ATOMIC_NUMBER] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr",
];

pub fn element_symbol(atomic_number: usize) -> Option<&'static str> {
    if atomic_number == 0 || atomic_number > MAX_ATOMIC_NUMBER {
        None
    } else {
        Some(ELEMENT_SYMBOLS[atomic_number - 1])
    }
}

pub fn atomic_number_for_symbol(symbol: &str) -> Option<usize> {
    let normalized = symbol.trim();
    if normalized.is_empty() {
        return None;
    }

    ELEMENT_SYMBOLS
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(normalized))
        .map(|index| index + 1)
}

/// Canonical capitalization for a symbol, e.g. `fe` -> `Fe`.
pub fn canonical_symbol(symbol: &str) -> Option<&'static str> {
    atomic_number_for_symbol(symbol).and_then(element_symbol)
}

#[cfg(test)]
mod tests {
    use super::{MAX_ATOMIC_NUMBER, atomic_number_for_symbol, canonical_symbol, element_symbol};

    #[test]
    fn lookup_rejects_out_of_range_atomic_numbers() {
        assert!(element_symbol(0).is_none());
        assert!(element_symbol(MAX_ATOMIC_NUMBER + 1).is_none());
    }

    #[test]
    fn known_symbol_roundtrip_matches_atomic_number() {
        assert_eq!(atomic_number_for_symbol("Fe"), Some(26));
        assert_eq!(atomic_number_for_symbol(" fe "), Some(26));
        assert_eq!(atomic_number_for_symbol("U"), Some(92));
        assert_eq!(element_symbol(103), Some("Lr"));
        assert_eq!(atomic_number_for_symbol(""), None);
        assert_eq!(atomic_number_for_symbol("Xx"), None);
    }

    #[test]
    fn canonical_symbol_restores_capitalization() {
        assert_eq!(canonical_symbol("co"), Some("Co"));
        assert_eq!(canonical_symbol("CO"), Some("Co"));
        assert_eq!(canonical_symbol("Qq"), None);
    }
}
