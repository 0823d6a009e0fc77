use reqwest::Client;
use serde::de::DeserializeOwned;
use skycast_core::{NetworkError, ProviderConfig, ReqwestErrorExt};
use std::sync::Arc;
use url::Url;

use crate::types::FetchError;

const USER_AGENT: &str = "Skycast/0.1.0";

/// HTTP client for the OpenWeather geocoding and forecast endpoints.
///
/// Stateless apart from the pooled connection; safe to share across tasks.
/// No retry happens here, callers own the retry policy.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    geocoding_url: Url,
    forecast_url: Url,
    units: String,
}

impl WeatherProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Network(e.into_network_error()))?;

        let geocoding_url = Url::parse(&config.geocoding_url)
            .map_err(|e| FetchError::InvalidInput(format!("geocoding url: {}", e)))?;
        let forecast_url = Url::parse(&config.forecast_url)
            .map_err(|e| FetchError::InvalidInput(format!("forecast url: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            geocoding_url,
            forecast_url,
            units: config.units.clone(),
        })
    }

    pub(crate) fn geocoding_url(&self) -> &Url {
        &self.geocoding_url
    }

    pub(crate) fn forecast_url(&self) -> &Url {
        &self.forecast_url
    }

    pub(crate) fn units(&self) -> &str {
        &self.units
    }

    /// GET `url` with `query`, check the status and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.into_network_error()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.into_network_error()))?;

        if !status.is_success() {
            return Err(FetchError::Network(NetworkError::ServerError {
                status: status.as_u16(),
                message: extract_message(&body),
            }));
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// OpenWeather error bodies look like `{"cod":401,"message":"Invalid API key..."}`.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_new_rejects_bad_url() {
        let config = ProviderConfig {
            geocoding_url: "not a url".to_string(),
            ..ProviderConfig::default()
        };
        let err = WeatherProvider::new(&config).unwrap_err();
        assert!(matches!(err, FetchError::InvalidInput(_)));
    }

    #[test]
    fn test_extract_message_from_provider_error() {
        let body = r#"{"cod":401,"message":"Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."}"#;
        assert!(extract_message(body).starts_with("Invalid API key"));
    }

    #[test]
    fn test_extract_message_falls_back_to_body() {
        assert_eq!(extract_message("Bad Gateway"), "Bad Gateway");
    }
}
