//! HTTP client for the data.gov.in mandi price resource.
//!
//! Wraps `reqwest` with API key management, `filters[<field>]` query
//! construction, and lenient record parsing. [`MarketClient::try_fetch_records`]
//! reports failures; [`MarketClient::fetch_records`] logs them and returns an
//! empty page, which is what the dashboard table wants.

use std::time::Duration;

use mandi_core::{narrow, AppConfig, Coordinates, MarketRecord, RecordQuery};
use reqwest::{Client, Url};

use crate::error::MarketError;
use crate::types::RecordsResponse;

pub use mandi_core::config::DEFAULT_MARKET_BASE_URL;

/// Longest upstream error body kept in [`MarketError::UnexpectedStatus`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Client for the price-records resource.
///
/// Use [`MarketClient::new`] for production, [`MarketClient::from_config`] to
/// build from [`AppConfig`], or [`MarketClient::with_base_url`] to point at a
/// mock server in tests.
pub struct MarketClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl MarketClient {
    /// Creates a client pointed at the production resource.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::MissingApiKey`] for an empty key, or
    /// [`MarketError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, MarketError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_MARKET_BASE_URL)
    }

    /// Creates a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::MissingApiKey`] when `DATA_GOV_API_KEY` is unset,
    /// plus the errors of [`MarketClient::with_base_url`].
    pub fn from_config(config: &AppConfig) -> Result<Self, MarketError> {
        let api_key = config
            .data_gov_api_key
            .as_deref()
            .ok_or(MarketError::MissingApiKey)?;
        Self::with_base_url(
            api_key,
            config.request_timeout_secs,
            &config.user_agent,
            &config.market_base_url,
        )
    }

    /// Creates a client with a custom resource URL (for testing with wiremock).
    ///
    /// The URL is the full resource path; it is used as-is with query
    /// parameters appended.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::MissingApiKey`] for an empty key,
    /// [`MarketError::InvalidBaseUrl`] if `base_url` does not parse, or
    /// [`MarketError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, MarketError> {
        if api_key.trim().is_empty() {
            return Err(MarketError::MissingApiKey);
        }

        let parsed = Url::parse(base_url).map_err(|e| MarketError::InvalidBaseUrl {
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

    /// Fetches one page of price records, logging and swallowing any failure.
    ///
    /// An empty result therefore means either "no matching records" or "the
    /// request failed". Callers that need to tell the two apart use
    /// [`MarketClient::try_fetch_records`].
    pub async fn fetch_records(&self, query: &RecordQuery) -> Vec<MarketRecord> {
        match self.try_fetch_records(query).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    query = %describe(query),
                    "price records request failed; returning empty page"
                );
                Vec::new()
            }
        }
    }

    /// Fetches one page and narrows it client-side by free text and distance.
    pub async fn fetch_narrowed(
        &self,
        query: &RecordQuery,
        search: Option<&str>,
        geo: Option<&Coordinates>,
    ) -> Vec<MarketRecord> {
        let records = self.fetch_records(query).await;
        narrow(&records, search, geo)
    }

    /// Fetches one page of price records.
    ///
    /// Sends a single GET request; there is no retry. Entries of the
    /// `records` array that are not record objects are skipped.
    ///
    /// # Errors
    ///
    /// - [`MarketError::Http`] on network failure or an unreadable body.
    /// - [`MarketError::UnexpectedStatus`] on a non-2xx status.
    /// - [`MarketError::ApiError`] if the envelope reports an error.
    /// - [`MarketError::Deserialize`] if the body is not the expected JSON.
    pub async fn try_fetch_records(
        &self,
        query: &RecordQuery,
    ) -> Result<Vec<MarketRecord>, MarketError> {
        let url = self.build_url(query);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MarketError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::UnexpectedStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketError::Http(e.without_url()))?;
        let envelope: RecordsResponse =
            serde_json::from_str(&body).map_err(|e| MarketError::Deserialize {
                context: describe(query),
                source: e,
            })?;

        if let Some(message) = envelope.error_message() {
            return Err(MarketError::ApiError(message.to_string()));
        }

        let total = envelope.records.len();
        let records: Vec<MarketRecord> = envelope
            .records
            .into_iter()
            .filter_map(|v| serde_json::from_value::<MarketRecord>(v).ok())
            .collect();

        if records.len() < total {
            tracing::debug!(
                skipped = total - records.len(),
                "skipped malformed price record entries"
            );
        }

        Ok(records)
    }

    /// Builds the request URL with properly percent-encoded query parameters.
    ///
    /// Emits `api-key`, `format`, `limit`, `offset`, then one
    /// `filters[<field>]` pair per non-empty field filter.
    fn build_url(&self, query: &RecordQuery) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-key", &self.api_key);
            pairs.append_pair("format", "json");
            pairs.append_pair("limit", &query.effective_limit().to_string());
            pairs.append_pair("offset", &query.effective_offset().to_string());
            for (field, value) in query.field_filters() {
                pairs.append_pair(&format!("filters[{field}]"), value);
            }
        }
        url
    }
}

/// Log/error context for a query. Never includes the API key.
fn describe(query: &RecordQuery) -> String {
    let mut parts: Vec<String> = query
        .field_filters()
        .map(|(field, value)| format!("{field}={value}"))
        .collect();
    parts.push(format!("limit={}", query.effective_limit()));
    parts.push(format!("offset={}", query.effective_offset()));
    format!("records({})", parts.join(", "))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
