//! Dashboard filter state and the server-side query derived from it.

use serde::{Deserialize, Serialize};

/// Page size the upstream resource is asked for when the caller sets none.
pub const DEFAULT_FETCH_LIMIT: u32 = 500;

/// Page size of the dashboard table.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// The four cascading exact-match fields, highest level first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    State,
    District,
    Market,
    Commodity,
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [
        FilterField::State,
        FilterField::District,
        FilterField::Market,
        FilterField::Commodity,
    ];

    /// Name of the field in the upstream record and in `filters[<name>]`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FilterField::State => "state",
            FilterField::District => "district",
            FilterField::Market => "market",
            FilterField::Commodity => "commodity",
        }
    }

    /// Fields that must be cleared when this one changes.
    #[must_use]
    pub fn dependents(self) -> &'static [FilterField] {
        match self {
            FilterField::State => &[
                FilterField::District,
                FilterField::Market,
                FilterField::Commodity,
            ],
            FilterField::District => &[FilterField::Market, FilterField::Commodity],
            FilterField::Market => &[FilterField::Commodity],
            FilterField::Commodity => &[],
        }
    }
}

impl std::fmt::Display for FilterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active query state of the market dashboard.
///
/// Empty strings mean "unconstrained". Mutate through the methods so that the
/// cascade and pagination invariants hold: choosing a field clears every field
/// below it, and any change other than a page move puts `offset` back to 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub state: String,
    pub district: String,
    pub market: String,
    pub commodity: String,
    pub search: String,
    pub limit: u32,
    pub offset: u32,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl FilterSelection {
    /// An unconstrained selection with the given page size (minimum 1).
    #[must_use]
    pub fn with_page_size(limit: u32) -> Self {
        Self {
            state: String::new(),
            district: String::new(),
            market: String::new(),
            commodity: String::new(),
            search: String::new(),
            limit: limit.max(1),
            offset: 0,
        }
    }

    #[must_use]
    pub fn get(&self, field: FilterField) -> &str {
        match field {
            FilterField::State => &self.state,
            FilterField::District => &self.district,
            FilterField::Market => &self.market,
            FilterField::Commodity => &self.commodity,
        }
    }

    fn slot(&mut self, field: FilterField) -> &mut String {
        match field {
            FilterField::State => &mut self.state,
            FilterField::District => &mut self.district,
            FilterField::Market => &mut self.market,
            FilterField::Commodity => &mut self.commodity,
        }
    }

    /// Sets `field` to `value`, clears its dependents, and resets `offset`.
    pub fn select(&mut self, field: FilterField, value: impl Into<String>) {
        *self.slot(field) = value.into();
        for dependent in field.dependents() {
            self.slot(*dependent).clear();
        }
        self.offset = 0;
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
        self.offset = 0;
    }

    pub fn clear_search(&mut self) {
        self.set_search(String::new());
    }

    pub fn set_page_size(&mut self, limit: u32) {
        self.limit = limit.max(1);
        self.offset = 0;
    }

    /// Returns to the first page without touching the filters.
    pub fn refresh(&mut self) {
        self.offset = 0;
    }

    /// 1-based page number.
    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.offset / self.limit.max(1) + 1
    }

    #[must_use]
    pub fn can_go_prev(&self) -> bool {
        self.offset > 0
    }

    /// A full page suggests there may be more rows. The upstream resource
    /// does not report a total, so a short page is the only end signal.
    #[must_use]
    pub fn can_go_next(&self, received_rows: usize) -> bool {
        u32::try_from(received_rows).is_ok_and(|n| n == self.limit)
    }

    /// Advances one page if the last page came back full.
    pub fn next_page(&mut self, received_rows: usize) -> bool {
        if !self.can_go_next(received_rows) {
            return false;
        }
        self.offset = self.offset.saturating_add(self.limit);
        true
    }

    /// Moves back one page, stopping at the first.
    pub fn prev_page(&mut self) -> bool {
        if !self.can_go_prev() {
            return false;
        }
        self.offset = self.offset.saturating_sub(self.limit);
        true
    }

    /// The server-side query for this selection. Search is applied client-side
    /// and is not part of it.
    #[must_use]
    pub fn to_query(&self) -> RecordQuery {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        RecordQuery {
            state: non_empty(&self.state),
            district: non_empty(&self.district),
            market: non_empty(&self.market),
            commodity: non_empty(&self.commodity),
            limit: Some(self.limit),
            offset: Some(self.offset),
        }
    }

    /// `Some(search)` when a search string is set.
    #[must_use]
    pub fn search_query(&self) -> Option<&str> {
        (!self.search.is_empty()).then_some(self.search.as_str())
    }
}

/// Server-side filters and pagination for one fetch of price records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuery {
    pub state: Option<String>,
    pub district: Option<String>,
    pub market: Option<String>,
    pub commodity: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl RecordQuery {
    #[must_use]
    pub fn get(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::State => self.state.as_deref(),
            FilterField::District => self.district.as_deref(),
            FilterField::Market => self.market.as_deref(),
            FilterField::Commodity => self.commodity.as_deref(),
        }
    }

    /// Provided, non-empty field filters in cascade order.
    pub fn field_filters(&self) -> impl Iterator<Item = (FilterField, &str)> + '_ {
        FilterField::ALL
            .into_iter()
            .filter_map(|f| self.get(f).filter(|v| !v.is_empty()).map(|v| (f, v)))
    }

    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_FETCH_LIMIT)
    }

    #[must_use]
    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fully_selected() -> FilterSelection {
        FilterSelection {
            state: "Bihar".to_string(),
            district: "Patna".to_string(),
            market: "Patna".to_string(),
            commodity: "Wheat".to_string(),
            offset: 40,
            ..FilterSelection::default()
        }
    }

    #[test]
    fn selecting_state_clears_all_dependents_and_offset() {
        let mut sel = fully_selected();
        sel.select(FilterField::State, "Kerala");
        assert_eq!(sel.state, "Kerala");
        assert!(sel.district.is_empty());
        assert!(sel.market.is_empty());
        assert!(sel.commodity.is_empty());
        assert_eq!(sel.offset, 0);
    }

    #[test]
    fn selecting_district_keeps_state() {
        let mut sel = fully_selected();
        sel.select(FilterField::District, "Gaya");
        assert_eq!(sel.state, "Bihar");
        assert_eq!(sel.district, "Gaya");
        assert!(sel.market.is_empty());
        assert!(sel.commodity.is_empty());
        assert_eq!(sel.offset, 0);
    }

    #[test]
    fn selecting_market_clears_only_commodity() {
        let mut sel = fully_selected();
        sel.select(FilterField::Market, "Danapur");
        assert_eq!(sel.district, "Patna");
        assert_eq!(sel.market, "Danapur");
        assert!(sel.commodity.is_empty());
    }

    #[test]
    fn selecting_commodity_clears_nothing_else() {
        let mut sel = fully_selected();
        sel.select(FilterField::Commodity, "Rice");
        assert_eq!(sel.market, "Patna");
        assert_eq!(sel.commodity, "Rice");
        assert_eq!(sel.offset, 0);
    }

    #[test]
    fn search_change_resets_offset() {
        let mut sel = fully_selected();
        sel.set_search("whe");
        assert_eq!(sel.offset, 0);
        sel.offset = 20;
        sel.clear_search();
        assert_eq!(sel.offset, 0);
        assert!(sel.search_query().is_none());
    }

    #[test]
    fn next_page_requires_a_full_page() {
        let mut sel = FilterSelection::with_page_size(20);
        assert!(!sel.next_page(19));
        assert_eq!(sel.offset, 0);
        assert!(sel.next_page(20));
        assert_eq!(sel.offset, 20);
        assert_eq!(sel.current_page(), 2);
    }

    #[test]
    fn prev_page_saturates_at_zero() {
        let mut sel = FilterSelection::with_page_size(20);
        assert!(!sel.prev_page());
        sel.offset = 10;
        assert!(sel.prev_page());
        assert_eq!(sel.offset, 0);
    }

    #[test]
    fn page_size_change_resets_offset() {
        let mut sel = fully_selected();
        sel.set_page_size(0);
        assert_eq!(sel.limit, 1);
        assert_eq!(sel.offset, 0);
    }

    #[test]
    fn to_query_skips_empty_fields() {
        let mut sel = FilterSelection::default();
        sel.select(FilterField::State, "Kerala");
        let query = sel.to_query();
        assert_eq!(query.state.as_deref(), Some("Kerala"));
        assert!(query.district.is_none());
        assert_eq!(query.limit, Some(20));
        assert_eq!(query.offset, Some(0));
        let filters: Vec<_> = query.field_filters().collect();
        assert_eq!(filters, vec![(FilterField::State, "Kerala")]);
    }

    #[test]
    fn record_query_defaults() {
        let query = RecordQuery::default();
        assert_eq!(query.effective_limit(), DEFAULT_FETCH_LIMIT);
        assert_eq!(query.effective_offset(), 0);
        let zero = RecordQuery {
            limit: Some(0),
            ..RecordQuery::default()
        };
        assert_eq!(zero.effective_limit(), DEFAULT_FETCH_LIMIT);
    }
}
