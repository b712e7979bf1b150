//! The price-record shape returned by the data.gov.in mandi price resource.
//!
//! The upstream data is loosely typed: prices arrive as JSON numbers, numeric
//! strings, empty strings, or not at all, and coordinates arrive as text.
//! Deserialization is lenient so that one malformed field never rejects the
//! whole record; anything unparseable becomes `None` and is skipped by the
//! aggregates downstream.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::selection::FilterField;

/// One reported price quotation for a commodity at a market on a date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    #[serde(default, alias = "State", deserialize_with = "lenient_text")]
    pub state: Option<String>,
    #[serde(default, alias = "District", deserialize_with = "lenient_text")]
    pub district: Option<String>,
    #[serde(default, alias = "Market", deserialize_with = "lenient_text")]
    pub market: Option<String>,
    #[serde(default, alias = "Commodity", deserialize_with = "lenient_text")]
    pub commodity: Option<String>,
    #[serde(default, alias = "Variety", deserialize_with = "lenient_text")]
    pub variety: Option<String>,
    #[serde(default, alias = "Grade", deserialize_with = "lenient_text")]
    pub grade: Option<String>,
    #[serde(default, alias = "Min_Price", deserialize_with = "lenient_price")]
    pub min_price: Option<f64>,
    #[serde(default, alias = "Max_Price", deserialize_with = "lenient_price")]
    pub max_price: Option<f64>,
    #[serde(default, alias = "Modal_Price", deserialize_with = "lenient_price")]
    pub modal_price: Option<f64>,
    /// Arrival date as reported, normally `YYYY-MM-DD`.
    #[serde(default, alias = "Arrival_Date", deserialize_with = "lenient_text")]
    pub arrival_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub longitude: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
}

impl MarketRecord {
    /// Returns the text of one of the four location/commodity fields.
    #[must_use]
    pub fn field(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::State => self.state.as_deref(),
            FilterField::District => self.district.as_deref(),
            FilterField::Market => self.market.as_deref(),
            FilterField::Commodity => self.commodity.as_deref(),
        }
    }

    /// True when `field` equals `value` exactly. An empty `value` matches
    /// every record.
    #[must_use]
    pub fn field_equals(&self, field: FilterField, value: &str) -> bool {
        value.is_empty() || self.field(field) == Some(value)
    }

    /// Parsed arrival date, or `None` when absent or malformed.
    #[must_use]
    pub fn arrival(&self) -> Option<NaiveDate> {
        self.arrival_date.as_deref().and_then(parse_arrival_date)
    }

    /// Parsed `(latitude, longitude)` when both are present and numeric.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = parse_degrees(self.latitude.as_deref()?)?;
        let lon = parse_degrees(self.longitude.as_deref()?)?;
        Some((lat, lon))
    }
}

/// Parses an arrival date.
///
/// Accepts `YYYY-MM-DD` and the `DD/MM/YYYY` form the live resource emits.
#[must_use]
pub fn parse_arrival_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .ok()
}

fn parse_degrees(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn price_from_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|p| p.is_finite())
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(price_from_value))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: serde_json::Value) -> MarketRecord {
        serde_json::from_value(value).expect("record should deserialize")
    }

    #[test]
    fn prices_accept_numbers_and_numeric_strings() {
        let rec = parse(serde_json::json!({
            "min_price": 1800,
            "max_price": "2100.5",
            "modal_price": " 2000 "
        }));
        assert_eq!(rec.min_price, Some(1800.0));
        assert_eq!(rec.max_price, Some(2100.5));
        assert_eq!(rec.modal_price, Some(2000.0));
    }

    #[test]
    fn malformed_prices_become_none() {
        let rec = parse(serde_json::json!({
            "min_price": "",
            "max_price": "NA",
            "modal_price": null
        }));
        assert!(rec.min_price.is_none());
        assert!(rec.max_price.is_none());
        assert!(rec.modal_price.is_none());
    }

    #[test]
    fn non_finite_price_strings_are_rejected() {
        let rec = parse(serde_json::json!({ "modal_price": "NaN", "min_price": "inf" }));
        assert!(rec.modal_price.is_none());
        assert!(rec.min_price.is_none());
    }

    #[test]
    fn missing_fields_default_to_none() {
        let rec = parse(serde_json::json!({}));
        assert_eq!(rec, MarketRecord::default());
    }

    #[test]
    fn capitalized_keys_are_accepted() {
        let rec = parse(serde_json::json!({
            "State": "Bihar",
            "District": "Patna",
            "Market": "Patna",
            "Commodity": "Wheat",
            "Arrival_Date": "01/02/2024",
            "Modal_Price": "2300"
        }));
        assert_eq!(rec.state.as_deref(), Some("Bihar"));
        assert_eq!(rec.commodity.as_deref(), Some("Wheat"));
        assert_eq!(rec.modal_price, Some(2300.0));
        assert_eq!(rec.arrival(), NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn numeric_coordinates_and_id_become_text() {
        let rec = parse(serde_json::json!({ "latitude": 25.6, "longitude": "85.1", "id": 7 }));
        assert_eq!(rec.latitude.as_deref(), Some("25.6"));
        assert_eq!(rec.id.as_deref(), Some("7"));
        assert_eq!(rec.coordinates(), Some((25.6, 85.1)));
    }

    #[test]
    fn numeric_text_fields_keep_the_record() {
        let rec = parse(serde_json::json!({
            "district": 5,
            "arrival_date": 20_240_101,
            "market": ["not", "text"],
            "modal_price": "2000"
        }));
        assert_eq!(rec.district.as_deref(), Some("5"));
        assert_eq!(rec.arrival_date.as_deref(), Some("20240101"));
        assert!(rec.arrival().is_none());
        assert!(rec.market.is_none());
        assert_eq!(rec.modal_price, Some(2000.0));
    }

    #[test]
    fn coordinates_require_both_parts() {
        let rec = MarketRecord {
            latitude: Some("25.6".to_string()),
            longitude: Some(String::new()),
            ..MarketRecord::default()
        };
        assert!(rec.coordinates().is_none());
    }

    #[test]
    fn parse_arrival_date_formats() {
        assert_eq!(
            parse_arrival_date("2024-01-05"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        assert_eq!(
            parse_arrival_date("05/01/2024"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        assert!(parse_arrival_date("yesterday").is_none());
        assert!(parse_arrival_date("").is_none());
    }

    #[test]
    fn field_equals_treats_empty_as_unconstrained() {
        let rec = MarketRecord {
            state: Some("Kerala".to_string()),
            ..MarketRecord::default()
        };
        assert!(rec.field_equals(FilterField::State, ""));
        assert!(rec.field_equals(FilterField::State, "Kerala"));
        assert!(!rec.field_equals(FilterField::State, "kerala"));
        assert!(!rec.field_equals(FilterField::District, "Ernakulam"));
    }
}
