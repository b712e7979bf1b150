use thiserror::Error;

/// Errors returned by the weather client.
///
/// Messages never include the request URL, which carries the API key.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather API key is empty; set OPENWEATHER_API_KEY")]
    MissingApiKey,

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Latitude/longitude not finite or out of range.
    #[error("invalid location: lat={latitude}, lon={longitude}")]
    InvalidLocation { latitude: f64, longitude: f64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {endpoint}: {body}")]
    UnexpectedStatus {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
