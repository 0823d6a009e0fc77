use serde::Deserialize;
use skycast_core::NetworkError;

/// One entry of the geocoding response array
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GeocodingEntry {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

/// Forecast response envelope. Items stay untyped so they can be stored verbatim.
#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    pub list: Vec<serde_json::Value>,
}

/// The modeled subset of a forecast item
#[derive(Debug, Deserialize)]
pub(crate) struct ForecastItemHead {
    pub dt: i64,
    pub main: MainData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MainData {
    pub temp: f32,
}

/// Remote fetch errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No results found for {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("Decode error: {0}")]
    Decode(String),
}

impl FetchError {
    /// Transient network failures are worth retrying; nothing else is.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_transient(),
            _ => false,
        }
    }
}
