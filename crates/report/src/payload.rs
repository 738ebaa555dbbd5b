use core_types::KurtosisClass;
use serde::Serialize;

/// The JSON document returned for one asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPayload {
    pub coin_id: String,
    /// Trend forecast for the next `horizon` days.
    pub predictions_xgb: Vec<f64>,
    /// Daily volatility forecast for the next `horizon` days.
    pub forecasted_volatility: Vec<f64>,
    pub kurtosis: f64,
    pub skew: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub kurtosis_classification: KurtosisClass,
    /// Base64-encoded chart. Absent when the report was built without a renderer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_plot: Option<String>,
}
