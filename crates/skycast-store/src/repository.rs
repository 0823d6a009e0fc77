//! Storage contracts and error types.
//!
//! The ingestion pipeline writes through these traits and the read path
//! queries through them; neither cares which engine sits behind.

use skycast_core::{City, DatabaseError, Forecast};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store rejected a write.
    #[error("Persist failed: {0}")]
    Persist(#[source] DatabaseError),

    /// A read failed.
    #[error("Query failed: {0}")]
    Query(#[source] DatabaseError),

    /// The blocking worker running the operation died.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// City persistence.
pub trait CityRepository: Send + Sync {
    /// Insert a city, or update its coordinates when `(name, country)` already exists.
    ///
    /// Returns the stored id either way.
    fn create_or_update_city(&self, city: &City) -> StoreResult<i64>;

    /// All cities ordered by name.
    fn list_cities(&self) -> StoreResult<Vec<City>>;

    /// # Errors
    /// Returns `StoreError::NotFound` if no city has this id.
    fn get_city(&self, id: i64) -> StoreResult<City>;
}

/// Forecast persistence.
pub trait ForecastRepository: Send + Sync {
    /// Insert a forecast, or update temperature and payload when
    /// `(city_id, date)` already exists.
    ///
    /// Returns the stored id either way.
    fn create_or_update_forecast(&self, forecast: &Forecast) -> StoreResult<i64>;

    /// All forecasts stored for a city, oldest first.
    fn list_forecasts(&self, city_id: i64) -> StoreResult<Vec<Forecast>>;
}
