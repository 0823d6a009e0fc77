use std::sync::Arc;

use skycast_core::City;
use skycast_store::{StoreClient, StoreResult};
use skycast_weather::{FetchError, WeatherProvider};

/// City lookups against the provider and the store.
///
/// Fetching and persisting are separate calls so callers can tell a remote
/// failure from a rejected write.
#[derive(Clone)]
pub struct CityService {
    provider: WeatherProvider,
    store: StoreClient,
    api_key: Arc<str>,
}

impl CityService {
    pub fn new(provider: WeatherProvider, store: StoreClient, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            provider,
            store,
            api_key: api_key.into(),
        }
    }

    /// Geocode a city by name. Nothing is persisted.
    pub async fn fetch_city(&self, name: &str) -> Result<City, FetchError> {
        self.provider.fetch_city(name, &self.api_key).await
    }

    /// Insert or update a city, returning its stored id.
    pub async fn create_city(&self, city: City) -> StoreResult<i64> {
        let name = city.name.clone();
        let id = self.store.create_or_update_city(city).await?;
        tracing::debug!("Stored city {} as {}", name, id);
        Ok(id)
    }

    pub async fn list_cities(&self) -> StoreResult<Vec<City>> {
        self.store.list_cities().await
    }

    pub async fn get_city(&self, id: i64) -> StoreResult<City> {
        self.store.get_city(id).await
    }
}
