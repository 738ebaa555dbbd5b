use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, State},
};
use report::ReportPayload;
use std::sync::Arc;

/// # GET /predict/:coin_id
/// Runs the full report pipeline for one asset.
pub async fn predict(
    Path(coin_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReportPayload>, AppError> {
    let payload = state.pipeline.run(&coin_id).await?;
    Ok(Json(payload))
}

/// # GET /api/health
pub async fn health() -> &'static str {
    "OK"
}
