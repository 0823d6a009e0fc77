//! Forward geocoding: resolve a city name to a `City` with coordinates.

use skycast_core::City;
use tracing::instrument;

use crate::provider::WeatherProvider;
use crate::types::{FetchError, GeocodingEntry};

impl WeatherProvider {
    /// Look a city up by name and return the best match.
    ///
    /// The provider ranks results; only the first one is used.
    #[instrument(skip(self, api_key), level = "debug")]
    pub async fn fetch_city(&self, name: &str, api_key: &str) -> Result<City, FetchError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FetchError::InvalidInput("city name cannot be empty".to_string()));
        }

        let query = [
            ("q", name.to_string()),
            ("limit", "1".to_string()),
            ("appid", api_key.to_string()),
        ];

        let entries: Vec<GeocodingEntry> = self.get_json(self.geocoding_url(), &query).await?;

        let best = entries
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::NotFound(format!("city: {}", name)))?;

        tracing::debug!("Geocoded '{}' to {}, {} ({}, {})", name, best.name, best.country, best.lat, best.lon);

        Ok(City::new(best.name, best.country, best.lat, best.lon))
    }
}
