use thiserror::Error;

/// Errors that can occur while evaluating a calculator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    // Input validation errors
    #[error("Insufficient data: {valid} usable rows (need at least {required})")]
    InsufficientData { valid: usize, required: usize },

    #[error("Empty input: {field} cannot be empty")]
    EmptyInput { field: &'static str },

    #[error("Dimension mismatch: {left} has {left_len} elements, {right} has {right_len}")]
    DimensionMismatch {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    #[error("Invalid confidence level: {0} (must be in (0, 1))")]
    InvalidConfidenceLevel(f64),

    // Numerical errors
    #[error("Probability {0} is outside the open interval (0, 1)")]
    ProbabilityOutOfRange(f64),

    #[error("Degenerate regression: all doses are equal (zero variance in log dose)")]
    DegenerateRegression,

    #[error("Fitted slope is zero or not finite; the response does not depend on dose")]
    ZeroSlope,

    #[error("{quantity} is outside the representable dose range (log10 = {log10_value}); the slope is too shallow for this dose range")]
    DoseOutOfRange {
        quantity: &'static str,
        log10_value: f64,
    },

    #[error("Distribution error: {0}")]
    Distribution(String),

    // Boundary errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CalcError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        CalcError::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

/// Result type for calculator operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Require a finite, strictly positive value
pub(crate) fn require_positive(field: &'static str, value: f64) -> CalcResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CalcError::invalid(
            field,
            format!("{} (must be a finite positive number)", value),
        ));
    }
    Ok(value)
}

/// Require a finite, non-negative value
pub(crate) fn require_non_negative(field: &'static str, value: f64) -> CalcResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(CalcError::invalid(
            field,
            format!("{} (must be a finite non-negative number)", value),
        ));
    }
    Ok(value)
}

/// Require a finite value
pub(crate) fn require_finite(field: &'static str, value: f64) -> CalcResult<f64> {
    if !value.is_finite() {
        return Err(CalcError::invalid(field, format!("{} (must be finite)", value)));
    }
    Ok(value)
}
