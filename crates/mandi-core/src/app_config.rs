use std::net::SocketAddr;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Key for the data.gov.in price-records resource. Market features are
    /// unavailable without it.
    pub data_gov_api_key: Option<String>,
    /// Key for the `OpenWeatherMap` API. Weather features are unavailable
    /// without it.
    pub weather_api_key: Option<String>,
    pub market_base_url: String,
    pub weather_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub page_size: u32,
    pub rate_limit_per_minute: usize,
}

impl AppConfig {
    /// The price API key, or an error naming the variable to set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `DATA_GOV_API_KEY` is unset.
    pub fn require_data_gov_api_key(&self) -> Result<&str, ConfigError> {
        self.data_gov_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATA_GOV_API_KEY".to_string()))
    }

    /// The weather API key, or an error naming the variable to set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `OPENWEATHER_API_KEY` is unset.
    pub fn require_weather_api_key(&self) -> Result<&str, ConfigError> {
        self.weather_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENWEATHER_API_KEY".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "data_gov_api_key",
                &self.data_gov_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "weather_api_key",
                &self.weather_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("market_base_url", &self.market_base_url)
            .field("weather_base_url", &self.weather_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("page_size", &self.page_size)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}
