//! Client-side narrowing of a fetched record page by free text and distance.

use crate::geo::{haversine_km, Coordinates};
use crate::records::MarketRecord;

/// True when `needle` (already lowercased) occurs in market, state, district,
/// or commodity, ignoring case.
#[must_use]
pub fn matches_search(record: &MarketRecord, needle: &str) -> bool {
    [
        &record.market,
        &record.state,
        &record.district,
        &record.commodity,
    ]
    .into_iter()
    .flatten()
    .any(|text| text.to_lowercase().contains(needle))
}

/// True when the record carries coordinates within `geo.radius()` km of `geo`.
/// Records without usable coordinates never match.
#[must_use]
pub fn within_radius(record: &MarketRecord, geo: &Coordinates) -> bool {
    record.coordinates().is_some_and(|(lat, lon)| {
        haversine_km(geo.latitude, geo.longitude, lat, lon) <= geo.radius()
    })
}

/// Narrows `records` by an optional free-text query and an optional geo radius.
///
/// Both filters are independent predicates combined with AND; input order is
/// preserved. An absent or empty query leaves the list untouched.
#[must_use]
pub fn narrow(
    records: &[MarketRecord],
    query: Option<&str>,
    geo: Option<&Coordinates>,
) -> Vec<MarketRecord> {
    let needle = query.filter(|q| !q.is_empty()).map(str::to_lowercase);

    records
        .iter()
        .filter(|r| needle.as_deref().is_none_or(|q| matches_search(r, q)))
        .filter(|r| geo.is_none_or(|g| within_radius(r, g)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str, district: &str, market: &str, commodity: &str) -> MarketRecord {
        MarketRecord {
            state: Some(state.to_string()),
            district: Some(district.to_string()),
            market: Some(market.to_string()),
            commodity: Some(commodity.to_string()),
            ..MarketRecord::default()
        }
    }

    fn located(lat: &str, lon: &str) -> MarketRecord {
        MarketRecord {
            latitude: Some(lat.to_string()),
            longitude: Some(lon.to_string()),
            ..record("Bihar", "Patna", "Patna", "Wheat")
        }
    }

    fn sample() -> Vec<MarketRecord> {
        vec![
            record("Uttar Pradesh", "Kanpur Nagar", "Kanpur", "Wheat"),
            record("Delhi", "North Delhi", "Azadpur", "Onion"),
            record("Kerala", "Ernakulam", "Aluva", "Banana"),
        ]
    }

    #[test]
    fn no_query_passes_everything_through() {
        let records = sample();
        assert_eq!(narrow(&records, None, None), records);
        assert_eq!(narrow(&records, Some(""), None), records);
    }

    #[test]
    fn query_is_case_insensitive_substring() {
        let out = narrow(&sample(), Some("KANPUR"), None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].market.as_deref(), Some("Kanpur"));
    }

    #[test]
    fn query_matches_any_designated_field() {
        let records = sample();
        assert_eq!(narrow(&records, Some("delhi"), None).len(), 1);
        assert_eq!(narrow(&records, Some("onion"), None).len(), 1);
        assert_eq!(narrow(&records, Some("kerala"), None).len(), 1);
        assert_eq!(narrow(&records, Some("ernak"), None).len(), 1);
    }

    #[test]
    fn query_ignores_variety_and_grade() {
        let rec = MarketRecord {
            variety: Some("Sharbati".to_string()),
            grade: Some("FAQ".to_string()),
            ..record("Madhya Pradesh", "Sehore", "Sehore", "Wheat")
        };
        assert!(narrow(&[rec], Some("sharbati"), None).is_empty());
    }

    #[test]
    fn every_result_matches_and_is_from_input() {
        let records = sample();
        let out = narrow(&records, Some("a"), None);
        for r in &out {
            assert!(records.contains(r));
            assert!(matches_search(r, "a"));
        }
    }

    #[test]
    fn geo_filter_keeps_nearby_and_drops_far() {
        let near = located("25.60", "85.14");
        let far = located("28.70", "77.10");
        let patna = Coordinates::new(25.5941, 85.1376);
        let out = narrow(&[near.clone(), far], None, Some(&patna));
        assert_eq!(out, vec![near]);
    }

    #[test]
    fn geo_filter_excludes_missing_coordinates() {
        let rec = record("Bihar", "Patna", "Patna", "Wheat");
        let patna = Coordinates::new(25.5941, 85.1376).with_radius(10_000.0);
        assert!(narrow(&[rec], None, Some(&patna)).is_empty());
    }

    #[test]
    fn geo_filter_excludes_unparseable_coordinates() {
        let rec = located("north", "85.14");
        let patna = Coordinates::new(25.5941, 85.1376);
        assert!(narrow(&[rec], None, Some(&patna)).is_empty());
    }

    #[test]
    fn query_and_geo_compose_with_and() {
        let wheat = located("25.60", "85.14");
        let rice = MarketRecord {
            commodity: Some("Rice".to_string()),
            ..located("25.61", "85.13")
        };
        let patna = Coordinates::new(25.5941, 85.1376);
        let out = narrow(&[wheat.clone(), rice], Some("wheat"), Some(&patna));
        assert_eq!(out, vec![wheat]);
    }
}
