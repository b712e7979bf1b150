use anyhow::Context;
use chrono::Utc;
use mandi_core::{AppConfig, Coordinates};
use mandi_weather::{WeatherClient, WeatherReport};

/// Print current conditions and the daily forecast at `(lat, lon)`.
///
/// # Errors
///
/// Returns an error if `OPENWEATHER_API_KEY` is unset, the coordinates are
/// out of range, or current conditions cannot be fetched.
pub(crate) async fn run_weather(
    config: &AppConfig,
    lat: f64,
    lon: f64,
    json: bool,
) -> anyhow::Result<()> {
    let api_key = config.require_weather_api_key()?;
    let client = WeatherClient::with_base_url(
        api_key,
        config.request_timeout_secs,
        &config.user_agent,
        &config.weather_base_url,
    )
    .context("failed to build weather API client")?;

    let report = client
        .report(&Coordinates::new(lat, lon))
        .await
        .context("failed to fetch weather")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report, Utc::now().date_naive()));
    }
    Ok(())
}

fn render(report: &WeatherReport, today: chrono::NaiveDate) -> String {
    let c = &report.current;
    let mut out = String::new();
    let location = if c.location.is_empty() {
        "Farm location"
    } else {
        c.location.as_str()
    };
    out.push_str(&format!(
        "{location}: {}\u{b0}C, {} (feels like {}\u{b0}C)\n",
        c.temperature, c.condition, c.feels_like
    ));
    out.push_str(&format!(
        "Humidity {}% \u{b7} Wind {} km/h \u{b7} Visibility {} km\n",
        c.humidity, c.wind_speed_kmh, c.visibility_km
    ));

    if report.forecast.is_empty() {
        out.push_str("\nForecast unavailable.\n");
        return out;
    }

    out.push_str(&format!(
        "\n{:<7}{:<8}{:>6}{:>6}{:>8}{:>6}  CONDITION\n",
        "DAY", "DATE", "HIGH", "LOW", "RAIN", "HUM"
    ));
    for day in &report.forecast {
        let label = day.day_label(today);
        let date = day.date.format("%b %d").to_string();
        let rain = format!("{}mm", day.rainfall_mm);
        let humidity = format!("{}%", day.humidity);
        out.push_str(&format!(
            "{label:<7}{date:<8}{:>6}{:>6}{rain:>8}{humidity:>6}  {}\n",
            day.high, day.low, day.condition
        ));
    }
    out
}
