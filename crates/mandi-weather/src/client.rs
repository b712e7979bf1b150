//! HTTP client for the `OpenWeatherMap` 2.5 API.

use std::time::Duration;

use mandi_core::{AppConfig, Coordinates};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::WeatherError;
use crate::report::{daily_forecast, CurrentConditions, DailyForecast, WeatherReport};
use crate::types::{CurrentResponse, ForecastResponse};

pub use mandi_core::config::DEFAULT_WEATHER_BASE_URL;

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Client for current conditions and the 5-day/3-hour forecast.
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl WeatherClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::MissingApiKey`] for an empty key, or
    /// [`WeatherError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, WeatherError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_WEATHER_BASE_URL)
    }

    /// Creates a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::MissingApiKey`] when `OPENWEATHER_API_KEY` is
    /// unset, plus the errors of [`WeatherClient::with_base_url`].
    pub fn from_config(config: &AppConfig) -> Result<Self, WeatherError> {
        let api_key = config
            .weather_api_key
            .as_deref()
            .ok_or(WeatherError::MissingApiKey)?;
        Self::with_base_url(
            api_key,
            config.request_timeout_secs,
            &config.user_agent,
            &config.weather_base_url,
        )
    }

    /// Creates a client with a custom API root (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::MissingApiKey`] for an empty key,
    /// [`WeatherError::InvalidBaseUrl`] if `base_url` does not parse, or
    /// [`WeatherError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, WeatherError> {
        if api_key.trim().is_empty() {
            return Err(WeatherError::MissingApiKey);
        }

        // Url::join replaces the last segment unless the base ends with '/'.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalized).map_err(|e| WeatherError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: parsed,
        })
    }

    /// Current conditions at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::InvalidLocation`] before any request is sent
    /// when the coordinates are out of range, otherwise the request errors of
    /// [`WeatherClient::report`].
    pub async fn current(&self, location: &Coordinates) -> Result<CurrentConditions, WeatherError> {
        let raw: CurrentResponse = self.request("weather", location).await?;
        Ok(CurrentConditions::from(raw))
    }

    /// Up to seven daily summaries, one per UTC calendar day.
    ///
    /// # Errors
    ///
    /// Same as [`WeatherClient::current`].
    pub async fn forecast(&self, location: &Coordinates) -> Result<Vec<DailyForecast>, WeatherError> {
        let raw: ForecastResponse = self.request("forecast", location).await?;
        Ok(daily_forecast(raw))
    }

    /// Current conditions plus the daily forecast.
    ///
    /// Current conditions are mandatory. A failed forecast is logged and
    /// reported as an empty list.
    ///
    /// # Errors
    ///
    /// - [`WeatherError::InvalidLocation`] for out-of-range coordinates.
    /// - [`WeatherError::Http`] on network failure.
    /// - [`WeatherError::UnexpectedStatus`] on a non-2xx status.
    /// - [`WeatherError::Deserialize`] if the body is not the expected JSON.
    pub async fn report(&self, location: &Coordinates) -> Result<WeatherReport, WeatherError> {
        let current = self.current(location).await?;
        let forecast = match self.forecast(location).await {
            Ok(days) => days,
            Err(e) => {
                tracing::warn!(error = %e, "forecast request failed; showing current conditions only");
                Vec::new()
            }
        };
        Ok(WeatherReport { current, forecast })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        location: &Coordinates,
    ) -> Result<T, WeatherError> {
        if !location.is_valid() {
            return Err(WeatherError::InvalidLocation {
                latitude: location.latitude,
                longitude: location.longitude,
            });
        }

        let url = self.build_url(endpoint, location)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::UnexpectedStatus {
                endpoint,
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| WeatherError::Http(e.without_url()))?;
        serde_json::from_str(&body).map_err(|e| WeatherError::Deserialize {
            context: endpoint.to_string(),
            source: e,
        })
    }

    fn build_url(&self, endpoint: &str, location: &Coordinates) -> Result<Url, WeatherError> {
        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|e| WeatherError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("lat", &location.latitude.to_string())
            .append_pair("lon", &location.longitude.to_string())
            .append_pair("appid", &self.api_key)
            .append_pair("units", "metric");
        Ok(url)
    }
}
