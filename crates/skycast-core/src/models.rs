//! Domain models shared by the fetchers, the store and the services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked city.
///
/// `id` is assigned by the store on first persist; freshly fetched cities
/// carry `0`. The `(name, country)` pair is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    /// Create an unsaved city.
    pub fn new(name: impl Into<String>, country: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            country: country.into(),
            latitude,
            longitude,
        }
    }
}

/// One timestamped forecast point for a city.
///
/// `forecast_json` is the provider's item kept verbatim, including fields
/// that are not modeled here (humidity, wind, clouds...).
/// The `(city_id, date)` pair is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub id: i64,
    pub city_id: i64,
    pub temp: f32,
    pub date: DateTime<Utc>,
    pub forecast_json: serde_json::Value,
}

/// Short per-day view of a city's upcoming forecasts. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub country: String,
    pub city: String,
    pub avg_temp: f32,
    pub available_dates: Vec<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_new_city_is_unsaved() {
        let city = City::new("Kyiv", "UA", 50.45, 30.52);
        assert_eq!(city.id, 0);
        assert_eq!(city.country, "UA");
    }

    #[test]
    fn test_summary_serialization_field_names() {
        let summary = ForecastSummary {
            country: "GB".to_string(),
            city: "London".to_string(),
            avg_temp: 12.5,
            available_dates: vec!["2026-01-02".to_string()],
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["city"], "London");
        assert_eq!(json["avg_temp"], 12.5);
        assert_eq!(json["available_dates"][0], "2026-01-02");
    }
}
