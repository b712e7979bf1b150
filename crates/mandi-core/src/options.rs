//! Cascading dropdown choices derived from the records currently on screen.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::records::MarketRecord;
use crate::selection::{FilterField, FilterSelection};

/// Valid next-level choices for the district, market, and commodity
/// dropdowns. Each list is sorted ascending, distinct, and free of blanks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub districts: Vec<String>,
    pub markets: Vec<String>,
    pub commodities: Vec<String>,
}

/// Derives the dropdown choices reachable under the higher-level selections.
///
/// Districts come from the state-scoped subset, markets from the
/// state+district subset, commodities from the state+district+market subset.
/// The commodity selection itself never narrows any list.
#[must_use]
pub fn derive_options(records: &[MarketRecord], selection: &FilterSelection) -> FilterOptions {
    let by_state: Vec<&MarketRecord> = records
        .iter()
        .filter(|r| r.field_equals(FilterField::State, &selection.state))
        .collect();
    let by_district: Vec<&MarketRecord> = by_state
        .iter()
        .copied()
        .filter(|r| r.field_equals(FilterField::District, &selection.district))
        .collect();
    let by_market = by_district
        .iter()
        .copied()
        .filter(|r| r.field_equals(FilterField::Market, &selection.market));

    FilterOptions {
        districts: distinct_values(by_state.iter().copied(), FilterField::District),
        markets: distinct_values(by_district.iter().copied(), FilterField::Market),
        commodities: distinct_values(by_market, FilterField::Commodity),
    }
}

fn distinct_values<'a>(
    records: impl Iterator<Item = &'a MarketRecord>,
    field: FilterField,
) -> Vec<String> {
    records
        .filter_map(|r| r.field(field))
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
