use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Not enough data to compute returns: {usable} usable observation(s), at least 2 required")]
    InsufficientData { usable: usize },

    #[error("Price and volume series are misaligned ({prices} prices, {volumes} volumes)")]
    MisalignedInput { prices: usize, volumes: usize },

    #[error("Invalid timestamp from market data: {0}")]
    InvalidTimestamp(i64),

    #[error("Observation series rejected: {0}")]
    Core(#[from] CoreError),
}
