use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single price sample as delivered by the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub price: f64,
}

/// A single traded-volume sample, aligned by position with a `PricePoint`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumePoint {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub volume: f64,
}

/// The raw price and volume history returned by one fetch.
///
/// Both series share the same implicit time index, so they always have the
/// same length. A fetch whose series disagree is rejected before it gets here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketHistory {
    pub prices: Vec<PricePoint>,
    pub volumes: Vec<VolumePoint>,
}

impl MarketHistory {
    pub fn new(prices: Vec<PricePoint>, volumes: Vec<VolumePoint>) -> Result<Self, CoreError> {
        if prices.len() != volumes.len() {
            return Err(CoreError::InvalidInput(
                "market history".to_string(),
                format!(
                    "{} prices but {} volumes",
                    prices.len(),
                    volumes.len()
                ),
            ));
        }
        Ok(Self { prices, volumes })
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// One row of the cleaned observation series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
    /// Simple return against the previous observation: `price / prev_price - 1`.
    #[serde(rename = "return")]
    pub ret: f64,
}

/// A time-ordered sequence of observations with a defined return on every row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationSeries {
    observations: Vec<Observation>,
}

impl ObservationSeries {
    /// Wraps observations after checking that dates strictly increase and that
    /// every return is finite.
    pub fn new(observations: Vec<Observation>) -> Result<Self, CoreError> {
        for (i, window) in observations.windows(2).enumerate() {
            if window[1].date <= window[0].date {
                return Err(CoreError::UnorderedObservations(i + 1));
            }
        }
        if let Some(bad) = observations.iter().position(|o| !o.ret.is_finite()) {
            return Err(CoreError::InvalidInput(
                "observation series".to_string(),
                format!("return at index {bad} is not finite"),
            ));
        }
        Ok(Self { observations })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.price).collect()
    }

    pub fn returns(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.ret).collect()
    }

    pub fn dates(&self) -> Vec<DateTime<Utc>> {
        self.observations.iter().map(|o| o.date).collect()
    }

    pub fn last_date(&self) -> Option<DateTime<Utc>> {
        self.observations.last().map(|o| o.date)
    }

    /// The most recent `n` observations (or all of them if there are fewer).
    pub fn tail(&self, n: usize) -> &[Observation] {
        let start = self.observations.len().saturating_sub(n);
        &self.observations[start..]
    }
}
