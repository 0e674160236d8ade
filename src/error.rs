//! Error taxonomy for the forecasting engine.
//!
//! Every validation failure is raised synchronously at the offending call;
//! no partial result is ever returned and nothing is retried internally.
//! Documented defaults exist only for optional tunables; a genuinely
//! missing required field always surfaces as an error.

use thiserror::Error;

/// Errors surfaced by the probability engines and the momentum tracker.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// A probability argument fell outside [0, 1] (NaN included).
    #[error("probability out of range: {name} = {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    /// A score is negative, already decided, or unreachable in real play.
    #[error("invalid score state: {0}")]
    InvalidScoreState(String),

    /// A structural parameter is out of range (best-of count, window size, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Blend weight outside [0, 1].
    #[error("blend weight out of range: {value}")]
    InvalidWeight { value: f64 },

    /// A required input component was absent from the snapshot.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A parameter needed by the evaluation path was not supplied.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// A calculation produced NaN or infinity.
    #[error("numeric instability: {0}")]
    NumericInstability(String),
}

pub type Result<T> = std::result::Result<T, ForecastError>;

/// Range-check a probability argument. NaN fails the range test and is
/// rejected with the same error.
pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ForecastError::InvalidProbability { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_probability_accepts_bounds() {
        assert!(check_probability("p", 0.0).is_ok());
        assert!(check_probability("p", 1.0).is_ok());
        assert!(check_probability("p", 0.5).is_ok());
    }

    #[test]
    fn test_check_probability_rejects_out_of_range() {
        assert!(matches!(
            check_probability("p", -0.01),
            Err(ForecastError::InvalidProbability { name: "p", .. })
        ));
        assert!(matches!(
            check_probability("p", 1.01),
            Err(ForecastError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn test_check_probability_rejects_nan() {
        assert!(check_probability("p", f64::NAN).is_err());
    }

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = ForecastError::MissingField("first_serve_in_rate");
        assert_eq!(err.to_string(), "missing required field: first_serve_in_rate");
    }
}
