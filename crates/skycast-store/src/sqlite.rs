// crates/skycast-store/src/sqlite.rs

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use skycast_core::{City, DatabaseError, Forecast, RusqliteErrorExt};
use std::path::Path;

use crate::repository::{CityRepository, ForecastRepository, StoreError, StoreResult};

const SCHEMA_VERSION: i32 = 1;

/// SQLite storage for cities and forecasts.
///
/// One connection guarded by a mutex; callers on the async side go through
/// `StoreClient`, which moves each call onto the blocking pool.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::ConnectionFailed(format!("{}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| DatabaseError::ConnectionFailed(format!("{}: {}", path.display(), e)))?;

        let store = Self { conn: Mutex::new(conn) };
        store.init_schema()?;
        tracing::debug!("Opened store at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        let store = Self { conn: Mutex::new(conn) };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.conn.lock();

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);

            CREATE TABLE IF NOT EXISTS cities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                country TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                UNIQUE (name, country)
            );

            CREATE TABLE IF NOT EXISTS forecasts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city_id INTEGER NOT NULL,
                temp REAL NOT NULL,
                date INTEGER NOT NULL,
                forecast_json TEXT NOT NULL,
                UNIQUE (city_id, date),
                FOREIGN KEY (city_id) REFERENCES cities(id)
            );

            CREATE INDEX IF NOT EXISTS idx_forecasts_city ON forecasts(city_id);",
        )
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let version: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
            .optional()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        match version {
            None => {
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
            }
            Some(v) if v > SCHEMA_VERSION => {
                return Err(DatabaseError::MigrationFailed(format!(
                    "database schema v{} is newer than supported v{}",
                    v, SCHEMA_VERSION
                )));
            }
            Some(_) => {}
        }

        Ok(())
    }

    fn row_to_city(row: &rusqlite::Row) -> rusqlite::Result<City> {
        Ok(City {
            id: row.get(0)?,
            name: row.get(1)?,
            country: row.get(2)?,
            latitude: row.get(3)?,
            longitude: row.get(4)?,
        })
    }

    fn row_to_forecast(row: &rusqlite::Row) -> rusqlite::Result<Forecast> {
        let temp: f64 = row.get(2)?;
        let secs: i64 = row.get(3)?;
        let json_str: String = row.get(4)?;

        let date = DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(3, secs))?;
        let forecast_json = serde_json::from_str(&json_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Forecast {
            id: row.get(0)?,
            city_id: row.get(1)?,
            temp: temp as f32,
            date,
            forecast_json,
        })
    }
}

impl CityRepository for SqliteStore {
    fn create_or_update_city(&self, city: &City) -> StoreResult<i64> {
        self.conn
            .lock()
            .query_row(
                "INSERT INTO cities (name, country, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(name, country) DO UPDATE SET
                    latitude = excluded.latitude,
                    longitude = excluded.longitude
                 RETURNING id",
                params![city.name, city.country, city.latitude, city.longitude],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::Persist(e.into_database_error()))
    }

    fn list_cities(&self) -> StoreResult<Vec<City>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT id, name, country, latitude, longitude FROM cities ORDER BY name")
            .map_err(|e| StoreError::Query(e.into_database_error()))?;

        let cities = stmt
            .query_map([], Self::row_to_city)
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| StoreError::Query(e.into_database_error()))?;

        Ok(cities)
    }

    fn get_city(&self, id: i64) -> StoreResult<City> {
        self.conn
            .lock()
            .query_row(
                "SELECT id, name, country, latitude, longitude FROM cities WHERE id = ?1",
                params![id],
                Self::row_to_city,
            )
            .optional()
            .map_err(|e| StoreError::Query(e.into_database_error()))?
            .ok_or_else(|| StoreError::not_found(format!("city {}", id)))
    }
}

impl ForecastRepository for SqliteStore {
    fn create_or_update_forecast(&self, forecast: &Forecast) -> StoreResult<i64> {
        let json = serde_json::to_string(&forecast.forecast_json)
            .map_err(|e| StoreError::Persist(DatabaseError::QueryFailed(e.to_string())))?;

        self.conn
            .lock()
            .query_row(
                "INSERT INTO forecasts (city_id, temp, date, forecast_json)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(city_id, date) DO UPDATE SET
                    temp = excluded.temp,
                    forecast_json = excluded.forecast_json
                 RETURNING id",
                params![
                    forecast.city_id,
                    f64::from(forecast.temp),
                    forecast.date.timestamp(),
                    json,
                ],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::Persist(e.into_database_error()))
    }

    fn list_forecasts(&self, city_id: i64) -> StoreResult<Vec<Forecast>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, city_id, temp, date, forecast_json
                 FROM forecasts WHERE city_id = ?1 ORDER BY date",
            )
            .map_err(|e| StoreError::Query(e.into_database_error()))?;

        let forecasts = stmt
            .query_map(params![city_id], Self::row_to_forecast)
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| StoreError::Query(e.into_database_error()))?;

        Ok(forecasts)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn forecast(city_id: i64, hour: u32, temp: f32) -> Forecast {
        Forecast {
            id: 0,
            city_id,
            temp,
            date: Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap(),
            forecast_json: serde_json::json!({ "main": { "temp": temp, "humidity": 70 } }),
        }
    }

    #[test]
    fn test_create_and_list_city() {
        let store = SqliteStore::in_memory().unwrap();

        let id = store.create_or_update_city(&City::new("Lviv", "UA", 49.84, 24.03)).unwrap();
        assert!(id > 0);

        let cities = store.list_cities().unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].id, id);
        assert_eq!(cities[0].name, "Lviv");
    }

    #[test]
    fn test_city_upsert_updates_coordinates() {
        let store = SqliteStore::in_memory().unwrap();

        let first = store.create_or_update_city(&City::new("Paris", "FR", 48.0, 2.0)).unwrap();
        let second = store.create_or_update_city(&City::new("Paris", "FR", 48.8566, 2.3522)).unwrap();

        assert_eq!(first, second);
        let cities = store.list_cities().unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].latitude, 48.8566);
        assert_eq!(cities[0].longitude, 2.3522);
    }

    #[test]
    fn test_same_name_different_country_is_distinct() {
        let store = SqliteStore::in_memory().unwrap();

        store.create_or_update_city(&City::new("Paris", "FR", 48.8566, 2.3522)).unwrap();
        store.create_or_update_city(&City::new("Paris", "US", 33.66, -95.55)).unwrap();

        assert_eq!(store.list_cities().unwrap().len(), 2);
    }

    #[test]
    fn test_cities_ordered_by_name() {
        let store = SqliteStore::in_memory().unwrap();
        store.create_or_update_city(&City::new("Warsaw", "PL", 52.23, 21.01)).unwrap();
        store.create_or_update_city(&City::new("Berlin", "DE", 52.52, 13.40)).unwrap();

        let names: Vec<_> = store.list_cities().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Berlin", "Warsaw"]);
    }

    #[test]
    fn test_get_missing_city_is_not_found() {
        let store = SqliteStore::in_memory().unwrap();
        let err = store.get_city(404).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_forecast_upsert_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        let city_id = store.create_or_update_city(&City::new("Oslo", "NO", 59.91, 10.75)).unwrap();

        let first = store.create_or_update_forecast(&forecast(city_id, 12, 1.5)).unwrap();
        let second = store.create_or_update_forecast(&forecast(city_id, 12, -2.0)).unwrap();

        assert_eq!(first, second);
        let stored = store.list_forecasts(city_id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].temp, -2.0);
        assert_eq!(stored[0].forecast_json["main"]["temp"], -2.0);
        assert_eq!(stored[0].date, Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_forecasts_listed_oldest_first_per_city() {
        let store = SqliteStore::in_memory().unwrap();
        let oslo = store.create_or_update_city(&City::new("Oslo", "NO", 59.91, 10.75)).unwrap();
        let rome = store.create_or_update_city(&City::new("Rome", "IT", 41.90, 12.50)).unwrap();

        store.create_or_update_forecast(&forecast(oslo, 15, 3.0)).unwrap();
        store.create_or_update_forecast(&forecast(oslo, 9, 1.0)).unwrap();
        store.create_or_update_forecast(&forecast(rome, 9, 14.0)).unwrap();

        let stored = store.list_forecasts(oslo).unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored[0].date < stored[1].date);
        assert!(stored.iter().all(|f| f.city_id == oslo));
    }

    #[test]
    fn test_forecast_for_unknown_city_is_persist_error() {
        let store = SqliteStore::in_memory().unwrap();
        let err = store.create_or_update_forecast(&forecast(999, 0, 1.0)).unwrap_err();
        assert!(matches!(err, StoreError::Persist(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("skycast.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.create_or_update_city(&City::new("Kyiv", "UA", 50.45, 30.52)).unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        assert_eq!(store.list_cities().unwrap().len(), 1);
    }
}
