use thiserror::Error;

/// The primary error type for the `forecaster` crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Not enough data to fit the {model} model: needed at least {needed}, got {got}.")]
    InsufficientData {
        model: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("Failed to fit the {model} model: {reason}")]
    ModelFit { model: &'static str, reason: String },

    #[error("Invalid model parameter: {0}")]
    InvalidParameter(String),
}
