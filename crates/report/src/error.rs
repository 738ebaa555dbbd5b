use thiserror::Error;

/// The primary error type for the `report` crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    #[error("Failed to render report chart: {0}")]
    Render(String),

    #[error("Forecast is inconsistent with the report: {0}")]
    Inconsistent(String),
}

impl From<std::fmt::Error> for ReportError {
    fn from(e: std::fmt::Error) -> Self {
        ReportError::Render(e.to_string())
    }
}
