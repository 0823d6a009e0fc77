//! OpenWeather fetchers for Skycast
//!
//! Looks cities up by name through the geocoding API and pulls the
//! multi-step forecast for a city's coordinates.

pub mod forecast;
pub mod geocode;
pub mod provider;
pub mod types;

pub use provider::WeatherProvider;
pub use types::FetchError;
