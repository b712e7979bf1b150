use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_MARKET_BASE_URL: &str =
    "https://api.data.gov.in/resource/9ef84268-d588-465a-a308-a864a43d0070";
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_USER_AGENT: &str = "mandi/0.1 (farmer-dashboard)";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// API keys are optional here. Their absence is reported by the feature that
/// needs them, so the weather view can still work when only the price key is
/// missing and vice versa.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank keys count as missing; a `.env` line like `DATA_GOV_API_KEY=` is common.
    let optional_key = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("MANDI_ENV", "development"))?;

    let bind_addr = or_default("MANDI_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("MANDI_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("MANDI_LOG_LEVEL", "info");

    let data_gov_api_key = optional_key("DATA_GOV_API_KEY");
    let weather_api_key = optional_key("OPENWEATHER_API_KEY");

    let market_base_url = or_default("MANDI_MARKET_BASE_URL", DEFAULT_MARKET_BASE_URL);
    let weather_base_url = or_default("MANDI_WEATHER_BASE_URL", DEFAULT_WEATHER_BASE_URL);

    let request_timeout_secs = parse_u64("MANDI_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("MANDI_USER_AGENT", DEFAULT_USER_AGENT);

    let page_size = parse_u32("MANDI_PAGE_SIZE", "20")?;
    if page_size == 0 {
        return Err(invalid("MANDI_PAGE_SIZE", "must be at least 1".to_string()));
    }

    let rate_limit_per_minute = parse_usize("MANDI_RATE_LIMIT_PER_MINUTE", "120")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        data_gov_api_key,
        weather_api_key,
        market_base_url,
        weather_base_url,
        request_timeout_secs,
        user_agent,
        page_size,
        rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MANDI_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
