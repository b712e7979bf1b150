//! `OpenWeatherMap` client producing the farm-location weather panel.

pub mod client;
pub mod error;
pub mod report;
pub mod types;

pub use client::WeatherClient;
pub use error::WeatherError;
pub use report::{daily_forecast, CurrentConditions, DailyForecast, WeatherReport, FORECAST_DAYS};
