use crate::core::band::Band;
use thiserror::Error;

/// Reasons a valuation step produced no number.
///
/// `MissingData` and `ImplausibleData` mean "no estimate" and are expected
/// outcomes for noisy inputs. `ConstraintViolation` and `ArithmeticError`
/// point at a malformed request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValuationError {
    #[error("missing required input '{field}'")]
    MissingData { field: &'static str },

    #[error("'{field}' = {value} is outside the plausible range {band}")]
    ImplausibleData {
        field: &'static str,
        value: f64,
        band: Band,
    },

    #[error("'{upper}' ({upper_value}) must be greater than '{lower}' ({lower_value})")]
    ConstraintViolation {
        upper: &'static str,
        upper_value: f64,
        lower: &'static str,
        lower_value: f64,
    },

    #[error("degenerate denominator '{field}' = {value}")]
    ArithmeticError { field: &'static str, value: f64 },
}

impl ValuationError {
    /// True for the data-quality outcomes that callers render as "N/A".
    pub fn is_no_estimate(&self) -> bool {
        matches!(
            self,
            ValuationError::MissingData { .. } | ValuationError::ImplausibleData { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ValuationError>;

pub(crate) fn require(field: &'static str, value: Option<f64>) -> Result<f64> {
    value.ok_or(ValuationError::MissingData { field })
}

pub(crate) fn check_band(field: &'static str, value: f64, band: Band) -> Result<f64> {
    if band.contains(value) {
        Ok(value)
    } else {
        Err(ValuationError::ImplausibleData { field, value, band })
    }
}

pub(crate) fn require_greater(
    upper: &'static str,
    upper_value: f64,
    lower: &'static str,
    lower_value: f64,
) -> Result<()> {
    if upper_value > lower_value {
        Ok(())
    } else {
        Err(ValuationError::ConstraintViolation {
            upper,
            upper_value,
            lower,
            lower_value,
        })
    }
}
