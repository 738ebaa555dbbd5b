use analytics::{AnalyticsEngine, RiskReport};
use chrono::{Duration, TimeZone, Utc};
use core_types::{Observation, ObservationSeries};
use forecaster::ForecastResult;

/// A wavy `n`-day series with hand-built forecasts (10 days, 70 extended).
pub fn fixture(n: usize) -> (ObservationSeries, ForecastResult, RiskReport) {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let mut price = 250.0;
    let observations: Vec<Observation> = (0..n)
        .map(|i| {
            let ret = 0.03 * ((i as f64) * 0.9).sin();
            price *= 1.0 + ret;
            Observation {
                date: start + Duration::days(i as i64),
                price,
                volume: 1_000.0 + 50.0 * i as f64,
                ret,
            }
        })
        .collect();
    let series = ObservationSeries::new(observations).unwrap();
    let risk = AnalyticsEngine::default().compute(&series);

    let last = series.last_date().unwrap();
    let forecast = ForecastResult {
        trend_points: vec![price; 10],
        trend_points_extended: vec![price; 70],
        volatility_forecast: (1..=10).map(|d| 0.02 + 0.001 * d as f64).collect(),
        forecast_dates: (1..=10).map(|d| last + Duration::days(d)).collect(),
    };
    (series, forecast, risk)
}
