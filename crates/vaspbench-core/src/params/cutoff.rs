use crate::domain::{BenchError, BenchResult};
use crate::potentials::AssignedPotentials;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutoffMode {
    #[default]
    Default,
    Scale(u32),
}

impl CutoffMode {
    pub const fn scale_factor(self) -> u32 {
        match self {
            Self::Default => 1,
            Self::Scale(factor) => factor,
        }
    }

    pub const fn overrides_cutoff(self) -> bool {
        self.scale_factor() != 1
    }

    /// Human-readable annotation stored on submitted runs.
    pub fn description(self) -> String {
        if self.overrides_cutoff() {
            format!("cutoff factor: {}", self.scale_factor())
        } else {
            "default".to_string()
        }
    }
}

impl Display for CutoffMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description())
    }
}

impl FromStr for CutoffMode {
    type Err = BenchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("default") {
            return Ok(Self::Default);
        }

        match trimmed.parse::<u32>() {
            Ok(0) | Err(_) => Err(BenchError::input_validation(
                "CONFIG.CUTOFF_MODE",
                format!(
                    "cutoff must be 'default' or a positive integer scale factor, got '{}'",
                    value
                ),
            )),
            Ok(factor) => Ok(Self::Scale(factor)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCutoff {
    Factor(u32),
    Text(String),
}

impl<'de> Deserialize<'de> for CutoffMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let parsed: Result<Self, BenchError> = match RawCutoff::deserialize(deserializer)? {
            RawCutoff::Factor(factor) => factor.to_string().parse(),
            RawCutoff::Text(text) => text.parse(),
        };
        parsed.map_err(|error| serde::de::Error::custom(error.message()))
    }
}

impl Serialize for CutoffMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Default => serializer.serialize_str("default"),
            Self::Scale(factor) => serializer.serialize_u32(*factor),
        }
    }
}

/// Scaled plane-wave cutoff, or `None` when the solver default applies.
pub fn derive_cutoff(
    potentials: &AssignedPotentials,
    mode: CutoffMode,
) -> BenchResult<Option<f64>> {
    if !mode.overrides_cutoff() {
        return Ok(None);
    }

    let max_enmax = potentials
        .values()
        .map(|potential| potential.enmax)
        .fold(None, |current: Option<f64>, enmax| {
            Some(current.map_or(enmax, |value| value.max(enmax)))
        })
        .ok_or_else(|| {
            BenchError::computation(
                "RUN.POTENTIAL_METADATA",
                "cannot scale the cutoff of a structure without assigned potentials",
            )
        })?;

    Ok(Some(f64::from(mode.scale_factor()) * max_enmax))
}
