use crate::error::ConfigError;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section falls back to its `Default` so an empty source is a valid,
/// fully-populated configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub forecast: ForecastConfig,
    pub analytics: AnalyticsConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Rejects parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

        if self.provider.max_attempts == 0 {
            return invalid("provider.max_attempts must be at least 1");
        }
        if self.provider.lookback_days == 0 {
            return invalid("provider.lookback_days must be at least 1");
        }
        if self.forecast.horizon == 0 {
            return invalid("forecast.horizon must be at least 1");
        }
        if self.forecast.n_trees == 0 {
            return invalid("forecast.n_trees must be at least 1");
        }
        if !(self.forecast.learning_rate > 0.0 && self.forecast.learning_rate.is_finite()) {
            return invalid("forecast.learning_rate must be a positive number");
        }
        if !(self.forecast.subsample > 0.0 && self.forecast.subsample <= 1.0) {
            return invalid("forecast.subsample must be in (0, 1]");
        }
        if !(self.forecast.volatility_scale > 0.0 && self.forecast.volatility_scale.is_finite()) {
            return invalid("forecast.volatility_scale must be a positive number");
        }
        if self.analytics.periods_per_year == 0 {
            return invalid("analytics.periods_per_year must be at least 1");
        }
        Ok(())
    }
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5001,
        }
    }
}

/// Settings for the upstream market-data provider and the retry policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the CoinGecko-compatible REST API, without a trailing slash.
    pub base_url: String,
    /// Quote currency for prices and volumes (e.g., "usd").
    pub currency: String,
    /// Number of days of daily history to request.
    pub lookback_days: u32,
    /// Connect + read timeout for a single upstream call.
    pub timeout_secs: u64,
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after every retry.
    pub initial_backoff_ms: u64,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            currency: "usd".to_string(),
            lookback_days: 365,
            timeout_secs: 10,
            max_attempts: 5,
            initial_backoff_ms: 2000,
        }
    }
}

/// Parameters for the trend and volatility models.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of future steps reported in the payload.
    pub horizon: usize,
    /// Extra steps appended to the horizon for the extended display forecast.
    pub extended_extra: usize,
    /// Number of boosting rounds (trees) in the trend model.
    pub n_trees: usize,
    pub learning_rate: f64,
    pub max_depth: u16,
    /// Fraction of rows sampled for each tree. 1.0 disables sampling.
    pub subsample: f64,
    pub seed: u64,
    /// Returns are multiplied by this before the GARCH fit.
    pub volatility_scale: f64,
    pub garch_max_iterations: usize,
}

impl ForecastConfig {
    pub fn extended_horizon(&self) -> usize {
        self.horizon + self.extended_extra
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 10,
            extended_extra: 60,
            n_trees: 150,
            learning_rate: 0.1,
            max_depth: 6,
            subsample: 1.0,
            seed: 42,
            volatility_scale: 100.0,
            garch_max_iterations: 5000,
        }
    }
}

/// Parameters for the risk statistics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Periods per year used to annualize daily statistics.
    pub periods_per_year: u32,
    /// Number of most recent observations handed to the renderer's scatter panel.
    pub recent_window: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            periods_per_year: 365,
            recent_window: 30,
        }
    }
}

/// Logging destinations and verbosity.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "riskcast.log".to_string(),
        }
    }
}
