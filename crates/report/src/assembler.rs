use crate::error::ReportError;
use crate::payload::ReportPayload;
use crate::renderer::{RenderInput, ReportRenderer};
use analytics::RiskReport;
use core_types::ObservationSeries;
use forecaster::ForecastResult;
use std::sync::Arc;

/// Merges forecasts and risk statistics into a `ReportPayload`.
///
/// Values are copied, never recomputed. When a renderer is attached the chart
/// is rendered from the same inputs and stored as `ml_plot`.
#[derive(Clone)]
pub struct ReportAssembler {
    renderer: Option<Arc<dyn ReportRenderer>>,
    recent_window: usize,
}

impl ReportAssembler {
    pub fn new(renderer: Arc<dyn ReportRenderer>, recent_window: usize) -> Self {
        Self {
            renderer: Some(renderer),
            recent_window,
        }
    }

    /// An assembler that leaves `ml_plot` empty.
    pub fn without_plot() -> Self {
        Self {
            renderer: None,
            recent_window: 0,
        }
    }

    pub fn assemble(
        &self,
        coin_id: &str,
        series: &ObservationSeries,
        forecast: &ForecastResult,
        risk: &RiskReport,
    ) -> Result<ReportPayload, ReportError> {
        if forecast.trend_points.len() != forecast.volatility_forecast.len() {
            return Err(ReportError::Inconsistent(format!(
                "{} trend points but {} volatility points",
                forecast.trend_points.len(),
                forecast.volatility_forecast.len()
            )));
        }

        let ml_plot = match &self.renderer {
            Some(renderer) => Some(renderer.render(&RenderInput {
                coin_id,
                series,
                forecast,
                risk,
                recent: series.tail(self.recent_window),
            })?),
            None => None,
        };

        Ok(ReportPayload {
            coin_id: coin_id.to_string(),
            predictions_xgb: forecast.trend_points.clone(),
            forecasted_volatility: forecast.volatility_forecast.clone(),
            kurtosis: risk.kurtosis,
            skew: risk.skew,
            sharpe_ratio: risk.sharpe_ratio,
            sortino_ratio: risk.sortino_ratio,
            kurtosis_classification: risk.kurtosis_class,
            ml_plot,
        })
    }
}
