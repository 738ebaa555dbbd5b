use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Failed to build the HTTP client: {0}")]
    ClientBuild(String),

    /// A non-200, non-429 response. Never retried.
    #[error("Failed to fetch historical data from CoinGecko. Status: {status}")]
    Upstream { status: u16 },

    /// HTTP 429. Retried with backoff.
    #[error("Rate limited by the market-data provider")]
    RateLimited,

    /// Connection failure or timeout. Retried with backoff.
    #[error("Network failure while contacting the market-data provider: {0}")]
    Network(String),

    #[error(
        "Failed to fetch historical data from CoinGecko after multiple retries due to rate limit or network issue."
    )]
    UpstreamExhausted {
        attempts: u32,
        #[source]
        last: Box<ApiError>,
    },

    #[error("No price/volume data available from CoinGecko.")]
    EmptyData,

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// Whether the retry policy should try again after this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::RateLimited | ApiError::Network(_))
    }
}
