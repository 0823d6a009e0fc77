//! Persistence for cities and forecasts.
//!
//! `CityRepository` / `ForecastRepository` are the storage contracts,
//! `SqliteStore` implements both, and `StoreClient` exposes them to async code.

pub mod client;
pub mod repository;
pub mod sqlite;

pub use client::StoreClient;
pub use repository::{CityRepository, ForecastRepository, StoreError, StoreResult};
pub use sqlite::SqliteStore;
