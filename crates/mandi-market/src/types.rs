//! Response envelope of the data.gov.in resource API.
//!
//! A successful call looks like
//! `{"status": "ok", "total": 1234, "count": 10, "records": [ ... ]}`.
//! Error envelopes carry `"status": "error"` and a `message`. Records are kept
//! as raw JSON here and parsed one by one so that a single malformed entry
//! does not reject the page.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RecordsResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// `null` and a missing key both mean an empty page.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub records: Vec<serde_json::Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl RecordsResponse {
    /// The error message when the envelope reports failure.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        let failed = self
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("error"));
        failed.then(|| self.message.as_deref().unwrap_or("unknown error"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_records_defaults_to_empty() {
        let resp: RecordsResponse = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(resp.records.is_empty());
        assert!(resp.error_message().is_none());
    }

    #[test]
    fn null_records_is_empty() {
        let resp: RecordsResponse =
            serde_json::from_str(r#"{"status":"ok","records":null}"#).unwrap();
        assert!(resp.records.is_empty());
    }

    #[test]
    fn error_envelope_exposes_message() {
        let resp: RecordsResponse =
            serde_json::from_str(r#"{"status":"error","message":"Invalid key"}"#).unwrap();
        assert_eq!(resp.error_message(), Some("Invalid key"));
    }

    #[test]
    fn error_envelope_without_message() {
        let resp: RecordsResponse = serde_json::from_str(r#"{"status":"ERROR"}"#).unwrap();
        assert_eq!(resp.error_message(), Some("unknown error"));
    }
}
