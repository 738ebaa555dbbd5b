use crate::error::AnalyticsError;
use chrono::{DateTime, TimeZone, Utc};
use core_types::{MarketHistory, Observation, ObservationSeries, PricePoint, VolumePoint};

/// Minimum number of observations that must survive cleaning.
pub const MIN_USABLE_ROWS: usize = 2;

/// Converts raw provider points into a time-ordered return series.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReturnSeriesBuilder;

impl ReturnSeriesBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build_from_history(
        &self,
        history: &MarketHistory,
    ) -> Result<ObservationSeries, AnalyticsError> {
        self.build(&history.prices, &history.volumes)
    }

    /// Builds the observation series.
    ///
    /// 1. Pairs prices and volumes by position and converts timestamps to dates.
    /// 2. Drops incomplete rows (non-finite values, non-positive prices).
    /// 3. Sorts by date; for duplicated timestamps the later row wins.
    /// 4. Computes `price[i] / price[i - 1] - 1` and drops the first row, which
    ///    has no predecessor.
    pub fn build(
        &self,
        prices: &[PricePoint],
        volumes: &[VolumePoint],
    ) -> Result<ObservationSeries, AnalyticsError> {
        if prices.len() != volumes.len() {
            return Err(AnalyticsError::MisalignedInput {
                prices: prices.len(),
                volumes: volumes.len(),
            });
        }

        let mut rows: Vec<(DateTime<Utc>, f64, f64)> = Vec::with_capacity(prices.len());
        for (price, volume) in prices.iter().zip(volumes) {
            let date = Utc
                .timestamp_millis_opt(price.timestamp_ms)
                .single()
                .ok_or(AnalyticsError::InvalidTimestamp(price.timestamp_ms))?;
            let complete = price.price.is_finite() && price.price > 0.0 && volume.volume.is_finite();
            if complete {
                rows.push((date, price.price, volume.volume));
            }
        }

        // Stable sort keeps arrival order among equal dates.
        rows.sort_by_key(|(date, _, _)| *date);
        let mut deduped: Vec<(DateTime<Utc>, f64, f64)> = Vec::with_capacity(rows.len());
        for row in rows {
            match deduped.last_mut() {
                Some(last) if last.0 == row.0 => *last = row,
                _ => deduped.push(row),
            }
        }

        let observations: Vec<Observation> = deduped
            .windows(2)
            .map(|w| Observation {
                date: w[1].0,
                price: w[1].1,
                volume: w[1].2,
                ret: w[1].1 / w[0].1 - 1.0,
            })
            .collect();

        if observations.len() < MIN_USABLE_ROWS {
            return Err(AnalyticsError::InsufficientData {
                usable: observations.len(),
            });
        }

        tracing::debug!(
            raw = prices.len(),
            usable = observations.len(),
            "Built return series."
        );
        Ok(ObservationSeries::new(observations)?)
    }
}
