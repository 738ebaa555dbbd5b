use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    AnalyticsConfig, Config, ForecastConfig, LoggingConfig, ProviderConfig, ServerConfig,
};

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "riskcast.toml";
/// Environment variable that points at an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "RISKCAST_CONFIG";
/// Environment variable that selects the listening port.
pub const PORT_ENV: &str = "PORT";

/// Loads the application configuration.
///
/// Sources are layered in increasing priority: built-in defaults, the TOML file
/// named by `RISKCAST_CONFIG` (or `riskcast.toml`, which may be absent),
/// `RISKCAST_*` environment variables using `__` between sections
/// (e.g. `RISKCAST_PROVIDER__CURRENCY=eur`), and finally `PORT`.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    load_config_from(Path::new(&path))
}

/// Same as [`load_config`] but reads the given file instead of the default one.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("RISKCAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("server.port", std::env::var(PORT_ENV).ok())?
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

/// Command-line overrides shared by every binary in the workspace.
#[cfg(feature = "clap")]
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigOverrides {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Quote currency (e.g., "usd").
    #[arg(long, global = true)]
    pub currency: Option<String>,

    /// Days of history to fetch.
    #[arg(long, global = true)]
    pub days: Option<u32>,
}

#[cfg(feature = "clap")]
impl ConfigOverrides {
    /// Loads the configuration and applies the overrides on top of it.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)?,
            None => load_config()?,
        };
        if let Some(currency) = &self.currency {
            config.provider.currency = currency.clone();
        }
        if let Some(days) = self.days {
            config.provider.lookback_days = days;
        }
        config.validate()?;
        Ok(config)
    }
}
