//! Raw `OpenWeatherMap` response shapes (`/weather` and `/forecast`, metric units).
//!
//! Only the fields the dashboard reads are modelled. Everything is defaulted
//! so that a sparse payload still deserializes.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MainBlock {
    #[serde(default)]
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub temp_min: f64,
    #[serde(default)]
    pub temp_max: f64,
    #[serde(default)]
    pub humidity: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub id: u32,
    /// Condition group, e.g. `"Rain"` or `"Clouds"`.
    #[serde(default)]
    pub main: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Wind {
    /// Metres per second.
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sys {
    #[serde(default)]
    pub country: Option<String>,
}

/// `GET /weather`.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sys: Option<Sys>,
    pub main: MainBlock,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Option<Wind>,
    /// Metres.
    #[serde(default)]
    pub visibility: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rain {
    #[serde(default, rename = "3h")]
    pub three_hours: Option<f64>,
}

/// One 3-hourly entry of `GET /forecast`.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntry {
    /// Unix seconds, UTC.
    pub dt: i64,
    #[serde(default)]
    pub main: MainBlock,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub rain: Option<Rain>,
}

/// `GET /forecast`.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
}
