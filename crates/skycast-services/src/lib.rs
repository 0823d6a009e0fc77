//! Fetch-and-persist facades over the weather provider and the store,
//! plus the read-side forecast aggregation.

pub mod city;
pub mod forecast;

pub use city::CityService;
pub use forecast::{
    filter_by_target, parse_target, summarize, DetailedForecast, ForecastError, ForecastService,
};
