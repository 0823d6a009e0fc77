pub mod config;
pub mod error;
pub mod interval;
pub mod models;

pub use config::{
    CollectorConfig, Config, DatabaseConfig, LoggingConfig, ProviderConfig, ValidationResult,
};
pub use error::{
    user_message, ConfigError, DatabaseError, NetworkError, ReqwestErrorExt, RusqliteErrorExt,
};
pub use interval::parse_interval;
pub use models::{City, Forecast, ForecastSummary};

use anyhow::Result;

/// Initialize tracing/logging.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` is used.
pub fn init(default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!("Skycast core initialized");
    Ok(())
}
