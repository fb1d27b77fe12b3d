//! Reader for the solver's structured XML report (`vasprun.xml`).
//!
//! The document is machine-written with a stable layout, so values are pulled
//! out with anchored regular expressions rather than a full XML parse. A
//! report is only accepted once its `</modeling>` root is closed; a run that
//! died mid-write leaves a truncated file that is rejected up front.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

// Robust floating-point token: 1.23, -0.032, 1.2E-04, .5
const FLOAT: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";

static MODELING_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</modeling>\s*$").expect("modeling close regex is valid"));

static SCSTEP_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<scstep>.*?</scstep>").expect("scstep regex is valid"));

static SCSTEP_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<scstep>").expect("scstep open regex is valid"));

static CALCULATION_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<calculation>(.*?)</calculation>").expect("calculation regex is valid")
});

static NAMED_SCALAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<i\b[^>]*\bname="([^"]*)"[^>]*>([^<]*)</i>"#)
        .expect("named scalar regex is valid")
});

static NAMED_VARRAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<varray\s+name="([^"]*)"\s*>(.*?)</varray>"#)
        .expect("named varray regex is valid")
});

static ENERGY_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<energy>(.*?)</energy>").expect("energy regex is valid"));

static EIGENVALUE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<eigenvalues>(.*?)</eigenvalues>").expect("eigenvalues regex is valid")
});

static SPIN_SET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<set\s+comment="spin\s*(\d+)"\s*>"#).expect("spin set regex is valid")
});

static VECTOR_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<v\b[^>]*>(.*?)</v>").expect("vector row regex is valid"));

static FLOAT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(FLOAT).expect("float token regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("run has no retrieved output directory")]
    NotRetrieved,
    #[error("structured report '{}' could not be read: {message}", path.display())]
    Read { path: PathBuf, message: String },
    #[error("structured report '{}' is truncated", path.display())]
    Truncated { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VasprunReport {
    content: String,
}

impl VasprunReport {
    /// `path` is only used in the error for a truncated document.
    pub fn parse(content: String, path: &Path) -> Result<Self, ReportError> {
        if !MODELING_CLOSE.is_match(&content) {
            return Err(ReportError::Truncated {
                path: path.to_path_buf(),
            });
        }
        Ok(Self { content })
    }

    /// The report declares ISO-8859-1, so bytes outside UTF-8 are replaced
    /// rather than failing the read.
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let bytes = fs::read(path).map_err(|error| ReportError::Read {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
        Self::parse(String::from_utf8_lossy(&bytes).into_owned(), path)
    }

    /// First `<i name="...">` value in document order, trimmed.
    pub fn scalar(&self, name: &str) -> Option<&str> {
        scalar_in(&self.content, name)
    }

    pub fn scalar_f64(&self, name: &str) -> Option<f64> {
        self.scalar(name)?.parse().ok()
    }

    /// Rows of the last `<varray name="...">` block.
    pub fn varray(&self, name: &str) -> Option<Vec<Vec<f64>>> {
        let block = NAMED_VARRAY
            .captures_iter(&self.content)
            .filter(|captures| &captures[1] == name)
            .last()?
            .get(2)?
            .as_str();

        let rows = VECTOR_ROW
            .captures_iter(block)
            .filter_map(|row| row.get(1))
            .map(|row| {
                FLOAT_TOKEN
                    .find_iter(row.as_str())
                    .filter_map(|token| token.as_str().parse::<f64>().ok())
                    .collect::<Vec<_>>()
            })
            .collect();
        Some(rows)
    }

    /// `e_fr_energy` of the last calculation-level energy block; energies
    /// reported inside SCF steps are ignored.
    pub fn final_free_energy(&self) -> Option<f64> {
        let without_steps = SCSTEP_BLOCK.replace_all(&self.content, "");
        ENERGY_BLOCK
            .captures_iter(&without_steps)
            .filter_map(|block| block.get(1))
            .filter_map(|block| scalar_in(block.as_str(), "e_fr_energy")?.parse::<f64>().ok())
            .last()
    }

    /// Spin components in the eigenvalue block; 1 when the block is absent.
    pub fn spin_count(&self) -> usize {
        let Some(block) = EIGENVALUE_BLOCK
            .captures(&self.content)
            .and_then(|captures| captures.get(1))
        else {
            return 1;
        };

        let spins: BTreeSet<&str> = SPIN_SET
            .captures_iter(block.as_str())
            .filter_map(|set| set.get(1).map(|spin| spin.as_str()))
            .collect();
        spins.len().max(1)
    }

    pub fn scf_step_count(&self) -> usize {
        SCSTEP_OPEN.find_iter(&self.content).count()
    }

    /// SCF steps of the last ionic step (`<calculation>` block).
    pub fn final_ionic_scf_step_count(&self) -> Option<usize> {
        let block = CALCULATION_BLOCK
            .captures_iter(&self.content)
            .last()?
            .get(1)?;
        Some(SCSTEP_OPEN.find_iter(block.as_str()).count())
    }

    pub fn kpoint_count(&self) -> Option<usize> {
        self.varray("kpointlist").map(|rows| rows.len())
    }
}

fn scalar_in<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    NAMED_SCALAR
        .captures_iter(content)
        .find(|captures| &captures[1] == name)?
        .get(2)
        .map(|value| value.as_str().trim())
}
