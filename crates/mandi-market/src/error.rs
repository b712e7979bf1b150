use thiserror::Error;

/// Errors returned by the price-records client.
///
/// Messages never include the request URL, which carries the API key.
#[derive(Debug, Error)]
pub enum MarketError {
    /// The client was constructed without an API key.
    #[error("price API key is empty; set DATA_GOV_API_KEY")]
    MissingApiKey,

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The resource answered with a non-2xx status.
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The resource answered 2xx with an error envelope.
    #[error("price API error: {0}")]
    ApiError(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
