//! Forecast ingestion facade and the read-side aggregation.
//!
//! Calendar days are UTC days throughout: the summary's `available_dates`
//! and the detail filter use the same boundary.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use thiserror::Error;

use skycast_core::{City, Forecast, ForecastSummary};
use skycast_store::{StoreClient, StoreError, StoreResult};
use skycast_weather::{FetchError, WeatherProvider};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Read-path errors. "Nothing matched" is kept apart from "something failed".
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS")]
    InvalidDate(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ForecastError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            other => Self::Store(other),
        }
    }
}

/// Records of one city matching a detail query.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedForecast {
    pub city: City,
    pub forecasts: Vec<Forecast>,
}

#[derive(Clone)]
pub struct ForecastService {
    provider: WeatherProvider,
    store: StoreClient,
    api_key: Arc<str>,
}

impl ForecastService {
    pub fn new(provider: WeatherProvider, store: StoreClient, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            provider,
            store,
            api_key: api_key.into(),
        }
    }

    /// Fetch the forecast series for a stored city. Nothing is persisted.
    pub async fn fetch_forecasts(&self, city: &City) -> Result<Vec<Forecast>, FetchError> {
        self.provider.fetch_forecasts(city, &self.api_key).await
    }

    /// Insert or update one forecast record, returning its stored id.
    pub async fn create_forecast(&self, forecast: Forecast) -> StoreResult<i64> {
        self.store.create_or_update_forecast(forecast).await
    }

    /// Upcoming dates and mean temperature for a city, evaluated now.
    pub async fn short_summary(&self, city_id: i64) -> Result<ForecastSummary, ForecastError> {
        let city = self.store.get_city(city_id).await?;
        let records = self.store.list_forecasts(city_id).await?;
        Ok(summarize(&city, &records, Utc::now()))
    }

    /// Records of a city on the target's day, or at the exact target time
    /// when it is not midnight.
    ///
    /// # Errors
    /// Returns `ForecastError::NotFound` if the city is unknown or no record matches.
    pub async fn detailed_forecast(
        &self,
        city_id: i64,
        target: DateTime<Utc>,
    ) -> Result<DetailedForecast, ForecastError> {
        let city = self.store.get_city(city_id).await?;
        let records = self.store.list_forecasts(city_id).await?;

        let forecasts = filter_by_target(records, target);
        if forecasts.is_empty() {
            return Err(ForecastError::NotFound(format!(
                "forecast for {} at {}",
                city.name,
                target.format(DATETIME_FORMAT)
            )));
        }

        Ok(DetailedForecast { city, forecasts })
    }
}

/// Summarize the records strictly later than `now`.
///
/// The mean runs over every qualifying record, so days with more samples
/// weigh more. No qualifying records gives a mean of zero.
pub fn summarize(city: &City, records: &[Forecast], now: DateTime<Utc>) -> ForecastSummary {
    let upcoming: Vec<&Forecast> = records.iter().filter(|f| f.date > now).collect();

    let dates: BTreeSet<NaiveDate> = upcoming.iter().map(|f| f.date.date_naive()).collect();

    let avg_temp = if upcoming.is_empty() {
        0.0
    } else {
        let sum: f64 = upcoming.iter().map(|f| f64::from(f.temp)).sum();
        (sum / upcoming.len() as f64) as f32
    };

    ForecastSummary {
        country: city.country.clone(),
        city: city.name.clone(),
        avg_temp,
        available_dates: dates.iter().map(|d| d.format(DATE_FORMAT).to_string()).collect(),
    }
}

/// Keep records on `target`'s UTC day; a non-midnight target also pins the
/// time of day to the second. The result is ordered by timestamp.
pub fn filter_by_target(records: Vec<Forecast>, target: DateTime<Utc>) -> Vec<Forecast> {
    let day = target.date_naive();
    let time = target.time();
    let exact = time != NaiveTime::MIN;

    let mut matched: Vec<Forecast> = records
        .into_iter()
        .filter(|f| f.date.date_naive() == day)
        .filter(|f| !exact || f.date.time() == time)
        .collect();
    matched.sort_by_key(|f| f.date);
    matched
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` as a UTC instant.
pub fn parse_target(input: &str) -> Result<DateTime<Utc>, ForecastError> {
    let input = input.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(input, DATETIME_FORMAT) {
        return Ok(dt.and_utc());
    }

    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| ForecastError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::{Duration, TimeZone};

    fn city() -> City {
        City {
            id: 1,
            ..City::new("London", "GB", 51.5073, -0.1276)
        }
    }

    fn record(date: DateTime<Utc>, temp: f32) -> Forecast {
        Forecast {
            id: 0,
            city_id: 1,
            temp,
            date,
            forecast_json: serde_json::json!({ "main": { "temp": temp } }),
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_summary_mean_and_dates() {
        let now = at(2026, 6, 1, 12);
        let records = vec![
            record(now + Duration::hours(48), 22.5),
            record(now + Duration::hours(24), 20.5),
        ];

        let summary = summarize(&city(), &records, now);

        assert_eq!(summary.avg_temp, 21.5);
        assert_eq!(summary.available_dates, vec!["2026-06-02", "2026-06-03"]);
        assert_eq!(summary.city, "London");
        assert_eq!(summary.country, "GB");
    }

    #[test]
    fn test_summary_without_future_records_is_zero() {
        let now = at(2026, 6, 1, 12);
        let records = vec![record(now - Duration::hours(3), 30.0), record(now, 25.0)];

        let summary = summarize(&city(), &records, now);

        assert_eq!(summary.avg_temp, 0.0);
        assert!(summary.available_dates.is_empty());
    }

    #[test]
    fn test_summary_mean_weighs_by_sample_count() {
        let now = at(2026, 6, 1, 0);
        let records = vec![
            record(at(2026, 6, 2, 3), 10.0),
            record(at(2026, 6, 2, 6), 10.0),
            record(at(2026, 6, 2, 9), 10.0),
            record(at(2026, 6, 3, 3), 30.0),
        ];

        let summary = summarize(&city(), &records, now);

        assert_eq!(summary.avg_temp, 15.0);
        assert_eq!(summary.available_dates, vec!["2026-06-02", "2026-06-03"]);
    }

    #[test]
    fn test_date_only_target_keeps_whole_day_sorted() {
        let records = vec![
            record(at(2026, 6, 2, 21), 3.0),
            record(at(2026, 6, 3, 0), 4.0),
            record(at(2026, 6, 2, 0), 1.0),
            record(at(2026, 6, 2, 12), 2.0),
        ];

        let matched = filter_by_target(records, parse_target("2026-06-02").unwrap());

        let temps: Vec<f32> = matched.iter().map(|f| f.temp).collect();
        assert_eq!(temps, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_timestamp_target_pins_time_of_day() {
        let records = vec![
            record(at(2026, 6, 2, 9), 1.0),
            record(at(2026, 6, 2, 12), 2.0),
            record(at(2026, 6, 3, 12), 3.0),
        ];

        let matched = filter_by_target(records, parse_target("2026-06-02 12:00:00").unwrap());

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].temp, 2.0);
    }

    #[test]
    fn test_target_with_unmatched_date_is_empty() {
        let records = vec![record(at(2026, 6, 2, 9), 1.0)];
        assert!(filter_by_target(records, parse_target("2026-07-01").unwrap()).is_empty());
    }

    #[test]
    fn test_parse_target_formats() {
        assert_eq!(parse_target("2026-06-02").unwrap(), at(2026, 6, 2, 0));
        assert_eq!(parse_target(" 2026-06-02 15:00:00 ").unwrap(), at(2026, 6, 2, 15));
        assert!(matches!(parse_target("02/06/2026"), Err(ForecastError::InvalidDate(_))));
        assert!(matches!(parse_target("2026-06-02T15:00:00"), Err(ForecastError::InvalidDate(_))));
    }

    #[test]
    fn test_store_not_found_becomes_not_found() {
        let err: ForecastError = StoreError::not_found("city 3").into();
        assert!(matches!(err, ForecastError::NotFound(_)));

        let err: ForecastError = StoreError::Unavailable("worker panicked".into()).into();
        assert!(matches!(err, ForecastError::Store(_)));
    }
}
