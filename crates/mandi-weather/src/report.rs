//! Dashboard-ready weather values derived from the raw API payloads.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::types::{Condition, CurrentResponse, ForecastResponse};

/// Most days shown in the forecast strip.
pub const FORECAST_DAYS: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    /// °C, rounded.
    pub temperature: i64,
    pub condition: String,
    pub condition_code: u32,
    /// Percent.
    pub humidity: u32,
    /// km/h, rounded.
    pub wind_speed_kmh: i64,
    pub visibility_km: f64,
    /// °C, rounded.
    pub feels_like: i64,
    /// `"<name>, <country>"`, leaving out whichever is missing.
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub high: i64,
    pub low: i64,
    pub condition: String,
    pub condition_code: u32,
    /// Millimetres over the sampled 3-hour window, rounded; 0 when absent.
    pub rainfall_mm: i64,
    pub humidity: u32,
}

impl DailyForecast {
    /// `"Today"` for `today`, otherwise the short weekday name (`"Mon"`).
    #[must_use]
    pub fn day_label(&self, today: NaiveDate) -> String {
        if self.date == today {
            "Today".to_string()
        } else {
            self.date.format("%a").to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    /// Empty when the forecast could not be fetched.
    pub forecast: Vec<DailyForecast>,
}

impl From<CurrentResponse> for CurrentConditions {
    fn from(raw: CurrentResponse) -> Self {
        let condition = primary(&raw.weather);
        let location = [
            raw.name.as_deref(),
            raw.sys.as_ref().and_then(|s| s.country.as_deref()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            temperature: round_half_up(raw.main.temp),
            condition: condition.main.clone(),
            condition_code: condition.id,
            humidity: raw.main.humidity,
            wind_speed_kmh: round_half_up(raw.wind.map_or(0.0, |w| w.speed) * 3.6),
            visibility_km: raw.visibility.unwrap_or(0.0) / 1000.0,
            feels_like: round_half_up(raw.main.feels_like),
            location,
        }
    }
}

/// Reduces 3-hourly entries to one per UTC calendar day.
///
/// The first entry seen for a date represents it; later entries for the same
/// date are ignored. At most [`FORECAST_DAYS`] days are returned, in input
/// order. Entries with an out-of-range timestamp are skipped.
#[must_use]
pub fn daily_forecast(raw: ForecastResponse) -> Vec<DailyForecast> {
    let mut days: Vec<DailyForecast> = Vec::with_capacity(FORECAST_DAYS);

    for entry in raw.list {
        let Some(date) = DateTime::from_timestamp(entry.dt, 0).map(|t| t.date_naive()) else {
            continue;
        };
        if days.iter().any(|d| d.date == date) {
            continue;
        }

        let condition = primary(&entry.weather);
        days.push(DailyForecast {
            date,
            high: round_half_up(entry.main.temp_max),
            low: round_half_up(entry.main.temp_min),
            condition: condition.main.clone(),
            condition_code: condition.id,
            rainfall_mm: round_half_up(
                entry.rain.and_then(|r| r.three_hours).unwrap_or(0.0),
            ),
            humidity: entry.main.humidity,
        });

        if days.len() == FORECAST_DAYS {
            break;
        }
    }

    days
}

fn primary(conditions: &[Condition]) -> Condition {
    conditions.first().cloned().unwrap_or_default()
}

/// Rounds half-way values toward positive infinity (`-2.5` becomes `-2`).
#[allow(clippy::cast_possible_truncation)]
fn round_half_up(value: f64) -> i64 {
    if value.is_finite() {
        (value + 0.5).floor() as i64
    } else {
        0
    }
}
