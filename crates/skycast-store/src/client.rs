//! Async access to the repositories.
//!
//! Repository calls are synchronous; `StoreClient` runs each one on the
//! blocking pool so callers on the runtime never hold a database lock.

use std::sync::Arc;

use skycast_core::{City, Forecast};

use crate::repository::{CityRepository, ForecastRepository, StoreError, StoreResult};
use crate::sqlite::SqliteStore;

/// Cloneable async handle over a city and a forecast repository.
#[derive(Clone)]
pub struct StoreClient {
    cities: Arc<dyn CityRepository>,
    forecasts: Arc<dyn ForecastRepository>,
}

impl StoreClient {
    /// Build a client from separate repository implementations.
    pub fn new(cities: Arc<dyn CityRepository>, forecasts: Arc<dyn ForecastRepository>) -> Self {
        Self { cities, forecasts }
    }

    /// Serve both contracts from one SQLite store.
    pub fn sqlite(store: SqliteStore) -> Self {
        let store = Arc::new(store);
        Self {
            cities: store.clone(),
            forecasts: store,
        }
    }

    pub async fn create_or_update_city(&self, city: City) -> StoreResult<i64> {
        let repo = self.cities.clone();
        run_blocking(move || repo.create_or_update_city(&city)).await
    }

    pub async fn list_cities(&self) -> StoreResult<Vec<City>> {
        let repo = self.cities.clone();
        run_blocking(move || repo.list_cities()).await
    }

    /// # Errors
    /// Returns `StoreError::NotFound` if no city has this id.
    pub async fn get_city(&self, id: i64) -> StoreResult<City> {
        let repo = self.cities.clone();
        run_blocking(move || repo.get_city(id)).await
    }

    pub async fn create_or_update_forecast(&self, forecast: Forecast) -> StoreResult<i64> {
        let repo = self.forecasts.clone();
        run_blocking(move || repo.create_or_update_forecast(&forecast)).await
    }

    /// All forecasts for a city, oldest first.
    pub async fn list_forecasts(&self, city_id: i64) -> StoreResult<Vec<Forecast>> {
        let repo = self.forecasts.clone();
        run_blocking(move || repo.list_forecasts(city_id)).await
    }
}

async fn run_blocking<T, F>(f: F) -> StoreResult<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
}
