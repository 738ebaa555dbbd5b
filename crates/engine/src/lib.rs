use crate::error::EngineError;
use analytics::{AnalyticsEngine, ReturnSeriesBuilder};
use api_client::MarketDataClient;
use configuration::Config;
use core_types::MarketHistory;
use forecaster::Forecaster;
use report::{ReportAssembler, ReportPayload, ReportRenderer};
use std::sync::Arc;

pub mod error;

/// The CPU-bound stages of a report, shared with the blocking pool.
struct Stages {
    builder: ReturnSeriesBuilder,
    analytics: AnalyticsEngine,
    forecaster: Forecaster,
    assembler: ReportAssembler,
}

impl Stages {
    fn compute(&self, coin_id: &str, history: &MarketHistory) -> Result<ReportPayload, EngineError> {
        let series = self.builder.build_from_history(history)?;
        let risk = self.analytics.compute(&series);
        let forecast = self.forecaster.forecast(&series)?;

        tracing::info!(
            coin_id,
            observations = series.len(),
            sharpe = risk.sharpe_ratio,
            sortino = risk.sortino_ratio,
            kurtosis = risk.kurtosis,
            class = %risk.kurtosis_class,
            "Computed risk report."
        );

        Ok(self.assembler.assemble(coin_id, &series, &forecast, &risk)?)
    }
}

/// The end-to-end report pipeline: fetch, build returns, measure risk,
/// forecast, assemble.
///
/// Holds no per-request state; one instance serves every request.
#[derive(Clone)]
pub struct ReportPipeline {
    client: Arc<dyn MarketDataClient>,
    currency: String,
    lookback_days: u32,
    stages: Arc<Stages>,
}

impl ReportPipeline {
    /// Creates a pipeline. Without a renderer the payloads carry no `ml_plot`.
    pub fn new(
        config: &Config,
        client: Arc<dyn MarketDataClient>,
        renderer: Option<Arc<dyn ReportRenderer>>,
    ) -> Self {
        let assembler = match renderer {
            Some(renderer) => ReportAssembler::new(renderer, config.analytics.recent_window),
            None => ReportAssembler::without_plot(),
        };

        Self {
            client,
            currency: config.provider.currency.clone(),
            lookback_days: config.provider.lookback_days,
            stages: Arc::new(Stages {
                builder: ReturnSeriesBuilder::new(),
                analytics: AnalyticsEngine::new(&config.analytics),
                forecaster: Forecaster::from_config(&config.forecast),
                assembler,
            }),
        }
    }

    /// Produces the report for one asset.
    pub async fn run(&self, coin_id: &str) -> Result<ReportPayload, EngineError> {
        tracing::info!(coin_id, "Building report.");

        let history = self
            .client
            .fetch_history(coin_id, self.lookback_days, &self.currency)
            .await?;

        let stages = Arc::clone(&self.stages);
        let coin = coin_id.to_string();
        tokio::task::spawn_blocking(move || stages.compute(&coin, &history))
            .await
            .map_err(|e| EngineError::Task(e.to_string()))?
            .inspect_err(|e| tracing::warn!(coin_id, error = %e, "Report failed."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::error::ApiError;
    use async_trait::async_trait;
    use core_types::{KurtosisClass, PricePoint, VolumePoint};
    use report::SvgReportRenderer;

    const DAY_MS: i64 = 86_400_000;
    const START_MS: i64 = 1_704_067_200_000;

    /// Serves a fixed history (or error) for every asset.
    struct StubClient {
        outcome: Result<MarketHistory, ApiError>,
    }

    #[async_trait]
    impl MarketDataClient for StubClient {
        async fn fetch_history(
            &self,
            _asset_id: &str,
            _lookback_days: u32,
            _currency: &str,
        ) -> Result<MarketHistory, ApiError> {
            self.outcome.clone()
        }
    }

    fn history(prices: &[f64], volume: f64) -> MarketHistory {
        let price_points = prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint {
                timestamp_ms: START_MS + i as i64 * DAY_MS,
                price: *p,
            })
            .collect();
        let volume_points = (0..prices.len())
            .map(|i| VolumePoint {
                timestamp_ms: START_MS + i as i64 * DAY_MS,
                volume,
            })
            .collect();
        MarketHistory::new(price_points, volume_points).unwrap()
    }

    fn pipeline(outcome: Result<MarketHistory, ApiError>, plot: bool) -> ReportPipeline {
        let renderer: Option<Arc<dyn ReportRenderer>> = if plot {
            Some(Arc::new(SvgReportRenderer::default()))
        } else {
            None
        };
        ReportPipeline::new(&Config::default(), Arc::new(StubClient { outcome }), renderer)
    }

    #[tokio::test]
    async fn steady_growth_produces_a_calm_report() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let min = prices[0];
        let max = prices[prices.len() - 1];

        let payload = pipeline(Ok(history(&prices, 1000.0)), true)
            .run("steady")
            .await
            .unwrap();

        assert_eq!(payload.coin_id, "steady");
        assert_eq!(payload.sortino_ratio, 0.0);
        assert_eq!(payload.predictions_xgb.len(), 10);
        for p in &payload.predictions_xgb {
            assert!(*p >= min && *p <= 2.0 * max, "prediction {p} out of range");
        }
        assert_eq!(payload.forecasted_volatility.len(), 10);
        assert!(payload.forecasted_volatility.iter().all(|v| *v >= 0.0));
        assert_eq!(payload.kurtosis_classification, KurtosisClass::Platykurtic);
        assert!(payload.ml_plot.is_some());
    }

    #[tokio::test]
    async fn upstream_errors_keep_their_message() {
        let err = pipeline(Err(ApiError::Upstream { status: 404 }), false)
            .run("missing")
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::ApiClient(ApiError::Upstream { status: 404 })));
        assert_eq!(
            err.to_string(),
            "Failed to fetch historical data from CoinGecko. Status: 404"
        );
    }

    #[tokio::test]
    async fn too_short_history_is_insufficient_data() {
        let err = pipeline(Ok(history(&[100.0, 101.0], 1000.0)), false)
            .run("short")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Analytics(analytics::AnalyticsError::InsufficientData { .. })
        ));
    }

    #[tokio::test]
    async fn plotless_pipeline_omits_the_chart() {
        let prices: Vec<f64> = (0..40)
            .map(|i| 50.0 + 5.0 * (i as f64 * 0.7).sin())
            .collect();
        let payload = pipeline(Ok(history(&prices, 250.0)), false)
            .run("wave")
            .await
            .unwrap();
        assert!(payload.ml_plot.is_none());
        assert_eq!(payload.predictions_xgb.len(), 10);
    }
}
