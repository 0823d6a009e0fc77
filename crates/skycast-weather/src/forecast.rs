//! Multi-step forecast lookup for a city's coordinates.

use chrono::DateTime;
use skycast_core::{City, Forecast};
use tracing::instrument;

use crate::provider::WeatherProvider;
use crate::types::{FetchError, ForecastItemHead, ForecastResponse};

impl WeatherProvider {
    /// Fetch the forecast series for `city`.
    ///
    /// Each list item becomes one `Forecast`; the item itself is kept as the
    /// raw payload. Returned records carry `city.id` and an unsaved id.
    #[instrument(skip(self, city, api_key), fields(city = %city.name), level = "debug")]
    pub async fn fetch_forecasts(&self, city: &City, api_key: &str) -> Result<Vec<Forecast>, FetchError> {
        let query = [
            ("lat", city.latitude.to_string()),
            ("lon", city.longitude.to_string()),
            ("units", self.units().to_string()),
            ("appid", api_key.to_string()),
        ];

        let response: ForecastResponse = self.get_json(self.forecast_url(), &query).await?;

        let forecasts = response
            .list
            .into_iter()
            .map(|item| to_forecast(city.id, item))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Fetched {} forecast points for {}", forecasts.len(), city.name);
        Ok(forecasts)
    }
}

fn to_forecast(city_id: i64, item: serde_json::Value) -> Result<Forecast, FetchError> {
    let head: ForecastItemHead =
        serde_json::from_value(item.clone()).map_err(|e| FetchError::Decode(e.to_string()))?;

    let date = DateTime::from_timestamp(head.dt, 0)
        .ok_or_else(|| FetchError::Decode(format!("timestamp out of range: {}", head.dt)))?;

    Ok(Forecast {
        id: 0,
        city_id,
        temp: head.main.temp,
        date,
        forecast_json: item,
    })
}
