//! Dashboard state: the active selection, the page on screen, and what the
//! dropdowns, trend chart, and insight panel derive from it.
//!
//! A fetch is split into [`MarketSession::begin_fetch`] and
//! [`MarketSession::complete`] so callers can run the request wherever they
//! like. Any selection change between the two supersedes the fetch and its
//! result is dropped.

use mandi_core::{
    analyze, build_series, derive_options, narrow, summarize, Coordinates, FilterField,
    FilterOptions, FilterSelection, MarketRecord, PriceInsight, PricePoint, RecordQuery,
};
use serde::Serialize;

use crate::client::MarketClient;
use crate::error::MarketError;
use crate::generation::{RequestGeneration, RequestTicket};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    /// The request succeeded but nothing matched.
    Empty,
    /// The request failed; the previous page stays on screen.
    Failed(String),
}

/// A fetch that has been started but not yet applied.
#[derive(Debug, Clone)]
pub struct PendingFetch {
    ticket: RequestTicket,
    query: RecordQuery,
}

impl PendingFetch {
    #[must_use]
    pub fn query(&self) -> &RecordQuery {
        &self.query
    }

    #[must_use]
    pub fn is_current(&self) -> bool {
        self.ticket.is_current()
    }
}

/// Everything the dashboard renders, in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub selection: FilterSelection,
    pub records: Vec<MarketRecord>,
    pub options: FilterOptions,
    pub series: Vec<PricePoint>,
    pub insight: Option<PriceInsight>,
    pub insight_text: String,
    pub page: u32,
    pub can_go_prev: bool,
    pub can_go_next: bool,
    pub status: LoadStatus,
}

#[derive(Debug)]
pub struct MarketSession {
    selection: FilterSelection,
    records: Vec<MarketRecord>,
    /// Rows the upstream returned for the current page, before narrowing.
    received: usize,
    options: FilterOptions,
    status: LoadStatus,
    generation: RequestGeneration,
    geo: Option<Coordinates>,
}

impl Default for MarketSession {
    fn default() -> Self {
        Self::new(FilterSelection::default())
    }
}

impl MarketSession {
    #[must_use]
    pub fn new(selection: FilterSelection) -> Self {
        Self {
            selection,
            records: Vec::new(),
            received: 0,
            options: FilterOptions::default(),
            status: LoadStatus::Idle,
            generation: RequestGeneration::new(),
            geo: None,
        }
    }

    #[must_use]
    pub fn with_page_size(page_size: u32) -> Self {
        Self::new(FilterSelection::with_page_size(page_size))
    }

    /// Sets the radius filter without touching pagination.
    #[must_use]
    pub fn with_location(mut self, geo: Option<Coordinates>) -> Self {
        self.geo = geo;
        self
    }

    #[must_use]
    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    /// The narrowed page currently on screen.
    #[must_use]
    pub fn records(&self) -> &[MarketRecord] {
        &self.records
    }

    #[must_use]
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    #[must_use]
    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    #[must_use]
    pub fn location(&self) -> Option<&Coordinates> {
        self.geo.as_ref()
    }

    pub fn select(&mut self, field: FilterField, value: impl Into<String>) {
        self.selection.select(field, value);
        self.generation.supersede();
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.selection.set_search(query);
        self.generation.supersede();
    }

    pub fn clear_search(&mut self) {
        self.selection.clear_search();
        self.generation.supersede();
    }

    pub fn set_page_size(&mut self, limit: u32) {
        self.selection.set_page_size(limit);
        self.generation.supersede();
    }

    pub fn refresh(&mut self) {
        self.selection.refresh();
        self.generation.supersede();
    }

    /// Restricts records to a radius around `geo`, or lifts the restriction.
    pub fn set_location(&mut self, geo: Option<Coordinates>) {
        self.geo = geo;
        self.selection.refresh();
        self.generation.supersede();
    }

    /// Moves to the next page if the current one came back full.
    pub fn next_page(&mut self) -> bool {
        let moved = self.selection.next_page(self.received);
        if moved {
            self.generation.supersede();
        }
        moved
    }

    pub fn prev_page(&mut self) -> bool {
        let moved = self.selection.prev_page();
        if moved {
            self.generation.supersede();
        }
        moved
    }

    /// Starts a fetch for the current selection, superseding any in flight.
    pub fn begin_fetch(&mut self) -> PendingFetch {
        self.status = LoadStatus::Loading;
        PendingFetch {
            ticket: self.generation.begin(),
            query: self.selection.to_query(),
        }
    }

    /// Applies a fetch result. Returns `false` when the fetch was superseded
    /// and the result discarded.
    pub fn complete(
        &mut self,
        pending: PendingFetch,
        result: Result<Vec<MarketRecord>, MarketError>,
    ) -> bool {
        if !pending.is_current() {
            tracing::debug!(
                ticket = pending.ticket.id(),
                current = self.generation.current(),
                "discarding superseded price records response"
            );
            return false;
        }

        match result {
            Ok(raw) => {
                self.received = raw.len();
                self.records = narrow(&raw, self.selection.search_query(), self.geo.as_ref());
                self.options = derive_options(&self.records, &self.selection);
                self.status = if self.records.is_empty() {
                    LoadStatus::Empty
                } else {
                    LoadStatus::Ready
                };
            }
            Err(e) => {
                tracing::warn!(error = %e, "price records fetch failed; keeping previous page");
                self.status = LoadStatus::Failed(e.to_string());
            }
        }
        true
    }

    /// Fetches and applies the current selection's page.
    pub async fn load(&mut self, client: &MarketClient) -> bool {
        let pending = self.begin_fetch();
        let result = client.try_fetch_records(pending.query()).await;
        self.complete(pending, result)
    }

    /// Trend series for the selected market and commodity.
    #[must_use]
    pub fn series(&self) -> Vec<PricePoint> {
        build_series(
            &self.records,
            Some(self.selection.market.as_str()),
            Some(self.selection.commodity.as_str()),
        )
    }

    #[must_use]
    pub fn insight(&self) -> Option<PriceInsight> {
        analyze(&self.records)
    }

    #[must_use]
    pub fn insight_text(&self) -> String {
        summarize(
            &self.records,
            Some(self.selection.commodity.as_str()),
            Some(self.selection.state.as_str()),
        )
    }

    #[must_use]
    pub fn can_go_next(&self) -> bool {
        self.selection.can_go_next(self.received)
    }

    #[must_use]
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            selection: self.selection.clone(),
            records: self.records.clone(),
            options: self.options.clone(),
            series: self.series(),
            insight: self.insight(),
            insight_text: self.insight_text(),
            page: self.selection.current_page(),
            can_go_prev: self.selection.can_go_prev(),
            can_go_next: self.can_go_next(),
            status: self.status.clone(),
        }
    }
}
