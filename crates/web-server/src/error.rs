use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Pipeline(#[from] engine::error::EngineError),
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Every pipeline failure is reported as `400` with the failing stage's own
/// message in `{"error": ...}`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Pipeline(err) = self;
        tracing::error!(error = %err, "Prediction request failed.");

        let body = Json(json!({ "error": err.to_string() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
