use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::interval::parse_interval;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Prefix for environment overrides, e.g. `SKYCAST__COLLECTOR__PARALLEL=true`.
pub const ENV_PREFIX: &str = "SKYCAST";

const DEFAULT_GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
const DEFAULT_FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Summarize all errors in one line
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite storage
    pub database: DatabaseConfig,

    /// Remote weather provider
    pub provider: ProviderConfig,

    /// Ingestion pipeline
    pub collector: CollectorConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|d| d.join("skycast").join("skycast.db"))
            .unwrap_or_else(|| PathBuf::from("skycast.db"));
        Self { path }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// OpenWeather API key; falls back to `OPENWEATHER_API_KEY`
    pub api_key: Option<String>,

    /// Geocoding lookup endpoint
    pub geocoding_url: String,

    /// 5 day / 3 hour forecast endpoint
    pub forecast_url: String,

    /// Units requested from the provider (standard, metric, imperial)
    pub units: String,

    /// Per-request timeout. Unset means no timeout.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            units: "metric".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Start the ingestion pipeline
    pub enabled: bool,

    /// Optional file with one city name per line, ingested before the first pass
    pub cities_file: Option<PathBuf>,

    /// Interval between forecast passes, e.g. "1m", "1h30m"
    pub interval: String,

    /// Fan out one task per city instead of processing them in order
    pub parallel: bool,

    /// Re-list cities from the store on every tick instead of using the
    /// snapshot taken before the recurring loop starts
    pub refresh_cities_each_tick: bool,

    /// Retries per remote fetch on transient network failures
    pub max_retries: u32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cities_file: None,
            interval: "1m".to_string(),
            parallel: false,
            refresh_cities_each_tick: false,
            max_retries: 0,
        }
    }
}

impl CollectorConfig {
    /// Parsed `interval`.
    pub fn interval_duration(&self) -> Result<Duration, ConfigError> {
        parse_interval(&self.interval)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.display().to_string()));
                }
                builder = builder.add_source(config::File::from(p).required(true));
            }
            None => {
                if let Some(default_path) = Self::config_path() {
                    builder = builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }

        Ok(config)
    }

    /// Validate the configuration and fail on errors.
    ///
    /// Warnings are logged and returned alongside the config.
    pub fn into_validated(self) -> Result<(Self, ValidationResult), ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((self, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.provider.geocoding_url, "provider.geocoding_url", &mut result);
        self.validate_url(&self.provider.forecast_url, "provider.forecast_url", &mut result);

        if !matches!(self.provider.units.as_str(), "standard" | "metric" | "imperial") {
            result.add_error(
                "provider.units",
                format!("Unknown units '{}', expected standard, metric or imperial", self.provider.units),
            );
        }

        if self.provider.request_timeout_secs == Some(0) {
            result.add_error("provider.request_timeout_secs", "Timeout must be greater than 0");
        }

        if let Err(e) = self.collector.interval_duration() {
            result.add_error("collector.interval", e.to_string());
        }

        if self.collector.enabled {
            let has_key = self
                .provider
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty());
            if !has_key {
                result.add_error(
                    "provider.api_key",
                    format!("API key is required when the collector is enabled (set {})", API_KEY_ENV),
                );
            }
        }

        if let Some(file) = &self.collector.cities_file {
            if !file.exists() {
                result.add_warning(
                    "collector.cities_file",
                    format!("File does not exist: {}", file.display()),
                );
            }
        }

        if self.collector.max_retries > 10 {
            result.add_warning("collector.max_retries", "More than 10 retries per fetch");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Default location of the configuration file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("skycast").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_enabled_collector_requires_api_key() {
        let mut config = Config::default();
        config.collector.enabled = true;
        config.provider.api_key = None;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "provider.api_key"));

        config.provider.api_key = Some("secret".to_string());
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_invalid_interval() {
        let mut config = Config::default();
        config.collector.interval = "soon".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "collector.interval"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.provider.forecast_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_unknown_units() {
        let mut config = Config::default();
        config.provider.units = "kelvin".to_string();
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_missing_cities_file_is_warning() {
        let mut config = Config::default();
        config.collector.cities_file = Some(PathBuf::from("/definitely/not/here.txt"));
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "collector.cities_file"));
    }

    #[test]
    fn test_into_validated_rejects_errors() {
        let mut config = Config::default();
        config.collector.interval = "0s".to_string();
        let err = config.into_validated().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("collector.interval")));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[database]
path = "/tmp/skycast-test.db"

[provider]
api_key = "file-key"

[collector]
enabled = true
interval = "5m"
parallel = true
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/skycast-test.db"));
        assert_eq!(config.provider.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.provider.units, "metric");
        assert!(config.collector.enabled);
        assert!(config.collector.parallel);
        assert_eq!(config.collector.interval_duration().unwrap(), Duration::from_secs(300));
        assert!(!config.collector.refresh_cities_each_tick);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
