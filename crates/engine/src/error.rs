use thiserror::Error;

/// Every way a report request can fail. Messages are passed through unchanged
/// from the stage that failed, so callers can show them as-is.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    ApiClient(#[from] api_client::error::ApiError),

    #[error(transparent)]
    Analytics(#[from] analytics::AnalyticsError),

    #[error(transparent)]
    Forecast(#[from] forecaster::ForecastError),

    #[error(transparent)]
    Report(#[from] report::ReportError),

    #[error("Report task failed: {0}")]
    Task(String),
}
