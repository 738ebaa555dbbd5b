//! # Forecaster
//!
//! Point forecasts of the price trend and of conditional volatility for an
//! `ObservationSeries`.
//!
//! Both models sit behind narrow traits (`TrendModel`, `VolatilityModel`) that
//! fit a training set into a `FittedModel`, which then projects forward. The
//! defaults are a gradient-boosted tree ensemble for the trend and a
//! GARCH(1,1) for volatility.

pub mod error;
pub mod model;
pub mod trend;
pub mod volatility;

pub use error::ForecastError;
pub use model::{FittedModel, TrendModel, VolatilityModel};
pub use trend::GradientBoostedTrend;
pub use volatility::Garch11;

use chrono::{DateTime, Duration, Utc};
use configuration::ForecastConfig;
use core_types::ObservationSeries;
use serde::Serialize;

/// The forecasts produced for one series. Built once per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Trend forecast for days `1..=horizon` after the last observation.
    pub trend_points: Vec<f64>,
    /// Trend forecast for days `1..=horizon + extended_extra`.
    pub trend_points_extended: Vec<f64>,
    /// Daily volatility forecast for days `1..=horizon`.
    pub volatility_forecast: Vec<f64>,
    /// The calendar days the `horizon` forecasts refer to.
    pub forecast_dates: Vec<DateTime<Utc>>,
}

/// Runs both models over a series.
pub struct Forecaster {
    trend: Box<dyn TrendModel>,
    volatility: Box<dyn VolatilityModel>,
    horizon: usize,
    extended_horizon: usize,
}

impl Forecaster {
    pub fn new(
        trend: Box<dyn TrendModel>,
        volatility: Box<dyn VolatilityModel>,
        horizon: usize,
        extended_horizon: usize,
    ) -> Self {
        Self {
            trend,
            volatility,
            horizon,
            extended_horizon: extended_horizon.max(horizon),
        }
    }

    /// The default model pair, configured from `config`.
    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(
            Box::new(GradientBoostedTrend::new(config)),
            Box::new(Garch11::new(config)),
            config.horizon,
            config.extended_horizon(),
        )
    }

    pub fn forecast(&self, series: &ObservationSeries) -> Result<ForecastResult, ForecastError> {
        let last_date = series.last_date().ok_or(ForecastError::InsufficientData {
            model: self.trend.name(),
            needed: 2,
            got: 0,
        })?;

        // One fit serves both horizons; the short forecast is the prefix.
        let trend = self.trend.fit(&series.prices())?;
        let trend_points_extended = trend.forecast(self.extended_horizon);
        let trend_points = trend_points_extended[..self.horizon].to_vec();

        let volatility_forecast = self.volatility.fit(&series.returns())?.forecast(self.horizon);

        let forecast_dates = (1..=self.horizon as i64)
            .map(|day| last_date + Duration::days(day))
            .collect();

        tracing::debug!(
            trend_model = self.trend.name(),
            volatility_model = self.volatility.name(),
            horizon = self.horizon,
            "Forecast complete."
        );

        Ok(ForecastResult {
            trend_points,
            trend_points_extended,
            volatility_forecast,
            forecast_dates,
        })
    }
}
