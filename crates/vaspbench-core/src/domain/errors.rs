use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BenchResult<T> = Result<T, BenchError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BenchErrorCategory {
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl BenchErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchError {
    category: BenchErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl BenchError {
    pub fn new(
        category: BenchErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            BenchErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(BenchErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(BenchErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(BenchErrorCategory::InternalError, placeholder, message)
    }

    /// A required experiment field could not be resolved from flags or file.
    pub fn incomplete_config(field: &str) -> Self {
        Self::input_validation(
            "CONFIG.INCOMPLETE",
            format!(
                "experiment field '{}' is not set; pass it as a flag or in the experiment file",
                field
            ),
        )
    }

    pub fn unknown_element(symbol: &str) -> Self {
        Self::input_validation(
            "INPUT.UNKNOWN_ELEMENT",
            format!("no potential variant is registered for element '{}'", symbol),
        )
    }

    /// Only collinear (1) and spin-polarized (2) treatments are supported.
    pub fn invalid_spin_state(spin_count: u8) -> Self {
        Self::computation(
            "RUN.INVALID_SPIN_STATE",
            format!(
                "derived spin count {} is neither 1 nor 2; \
                 non-collinear magnetism is not supported",
                spin_count
            ),
        )
    }

    pub const fn category(&self) -> BenchErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for BenchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for BenchError {}

#[cfg(test)]
mod tests {
    use super::{BenchError, BenchErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (BenchErrorCategory::InputValidationError, 2),
            (BenchErrorCategory::IoSystemError, 3),
            (BenchErrorCategory::ComputationError, 4),
            (BenchErrorCategory::InternalError, 5),
        ];

        for (category, exit_code) in cases {
            assert_eq!(category.exit_code(), exit_code);
        }
    }

    #[test]
    fn incomplete_config_names_the_missing_field() {
        let error = BenchError::incomplete_config("group_name");

        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.placeholder(), "CONFIG.INCOMPLETE");
        assert!(error.diagnostic_line().starts_with("ERROR: [CONFIG.INCOMPLETE]"));
        assert!(error.message().contains("'group_name'"));
        assert_eq!(error.fatal_exit_line(), "FATAL EXIT CODE: 2");
    }

    #[test]
    fn invalid_spin_state_is_a_computation_error() {
        let error = BenchError::invalid_spin_state(4);
        assert_eq!(error.category(), BenchErrorCategory::ComputationError);
        assert_eq!(error.placeholder(), "RUN.INVALID_SPIN_STATE");
        assert!(error.to_string().contains("spin count 4"));
    }
}
