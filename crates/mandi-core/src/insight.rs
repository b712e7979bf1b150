//! Price trend series and the plain-language price summary shown beside it.

use chrono::NaiveDate;
use serde::Serialize;

use crate::records::MarketRecord;

/// Most recent points kept for the trend chart.
pub const SERIES_CAP: usize = 20;

/// Returned by [`summarize`] when no record carries a usable modal price.
pub const NO_DATA_MESSAGE: &str = "No data available for the current filters.";

/// Above `mean * HIGH_FACTOR` the maximum counts as unusually high.
const HIGH_FACTOR: f64 = 1.1;
/// Below `mean * LOW_FACTOR` the minimum counts as unusually low.
const LOW_FACTOR: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
    pub market: Option<String>,
    pub commodity: Option<String>,
}

/// Builds the modal-price trend series.
///
/// Optionally restricts to one market and/or commodity (exact match; `None`
/// or empty means unrestricted), drops records without a parseable arrival
/// date or modal price, orders by date ascending (stable for equal dates),
/// and keeps the newest [`SERIES_CAP`] points.
#[must_use]
pub fn build_series(
    records: &[MarketRecord],
    market: Option<&str>,
    commodity: Option<&str>,
) -> Vec<PricePoint> {
    let wanted = |actual: Option<&str>, filter: Option<&str>| {
        filter.filter(|f| !f.is_empty()).is_none_or(|f| actual == Some(f))
    };

    let mut points: Vec<PricePoint> = records
        .iter()
        .filter(|r| wanted(r.commodity.as_deref(), commodity))
        .filter(|r| wanted(r.market.as_deref(), market))
        .filter_map(|r| {
            Some(PricePoint {
                date: r.arrival()?,
                price: r.modal_price?,
                market: r.market.clone(),
                commodity: r.commodity.clone(),
            })
        })
        .collect();

    points.sort_by_key(|p| p.date);
    let excess = points.len().saturating_sub(SERIES_CAP);
    points.drain(..excess);
    points
}

/// Overall price level relative to the mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceLevel {
    HigherThanUsual,
    LowerThanUsual,
    Typical,
}

impl PriceLevel {
    /// High takes precedence over low when both thresholds are crossed.
    #[must_use]
    pub fn classify(average: f64, min: f64, max: f64) -> Self {
        if max > average * HIGH_FACTOR {
            PriceLevel::HigherThanUsual
        } else if min < average * LOW_FACTOR {
            PriceLevel::LowerThanUsual
        } else {
            PriceLevel::Typical
        }
    }

    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            PriceLevel::HigherThanUsual => "higher than usual",
            PriceLevel::LowerThanUsual => "lower than usual",
            PriceLevel::Typical => "around the typical range",
        }
    }
}

impl std::fmt::Display for PriceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// Summary statistics over the modal prices of a record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceInsight {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub level: PriceLevel,
    /// Number of records that contributed a price.
    pub sample_size: usize,
    /// First record, in input order, whose modal price equals `min`.
    pub min_record: MarketRecord,
    /// First record, in input order, whose modal price equals `max`.
    pub max_record: MarketRecord,
}

/// Computes mean/min/max over the parseable modal prices.
///
/// Returns `None` when no record has a usable modal price.
#[must_use]
pub fn analyze(records: &[MarketRecord]) -> Option<PriceInsight> {
    let prices: Vec<f64> = records.iter().filter_map(|r| r.modal_price).collect();
    if prices.is_empty() {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let average = prices.iter().sum::<f64>() / prices.len() as f64;
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let first_at = |price: f64| records.iter().find(|r| r.modal_price == Some(price)).cloned();

    Some(PriceInsight {
        average,
        min,
        max,
        level: PriceLevel::classify(average, min, max),
        sample_size: prices.len(),
        min_record: first_at(min)?,
        max_record: first_at(max)?,
    })
}

impl PriceInsight {
    /// Renders the insight as the sentence shown on the dashboard.
    ///
    /// `commodity` and `state` are the active selections, used only to phrase
    /// the context ("for Wheat in Bihar").
    #[must_use]
    pub fn describe(&self, commodity: Option<&str>, state: Option<&str>) -> String {
        let commodity = commodity.filter(|c| !c.is_empty());
        let state = state.filter(|s| !s.is_empty());
        let context = match (commodity, state) {
            (Some(c), Some(s)) => format!("for {c} in {s}"),
            (Some(c), None) => format!("for {c}"),
            (None, Some(s)) => format!("in {s}"),
            (None, None) => "overall".to_string(),
        };

        format!(
            "Average modal price {context} is around \u{20b9}{:.0}. \
             Current prices look {}. \
             Highest price is \u{20b9}{}{}. \
             Lowest price is \u{20b9}{}{}.",
            self.average.round(),
            self.level,
            format_price(self.max),
            where_reported(&self.max_record),
            format_price(self.min),
            where_reported(&self.min_record),
        )
    }
}

/// Summarizes a record set in one short paragraph, or [`NO_DATA_MESSAGE`].
#[must_use]
pub fn summarize(records: &[MarketRecord], commodity: Option<&str>, state: Option<&str>) -> String {
    match analyze(records) {
        Some(insight) => insight.describe(commodity, state),
        None => NO_DATA_MESSAGE.to_string(),
    }
}

/// `" for Wheat at Patna, Patna"`, leaving out whatever the record lacks.
fn where_reported(record: &MarketRecord) -> String {
    fn present(v: &Option<String>) -> Option<&str> {
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    let mut out = String::new();
    if let Some(commodity) = present(&record.commodity) {
        out.push_str(" for ");
        out.push_str(commodity);
    }
    let place: Vec<&str> = [&record.market, &record.district]
        .into_iter()
        .filter_map(present)
        .collect();
    if !place.is_empty() {
        out.push_str(" at ");
        out.push_str(&place.join(", "));
    }
    out
}

/// Formats a price with thousands separators and at most two decimals.
fn format_price(price: f64) -> String {
    let fixed = format!("{:.2}", price.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let frac = frac.trim_end_matches('0');
    let sign = if price < 0.0 { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}
