//! Market price command handlers for the CLI.
//!
//! Each command fetches one page from the price resource, narrows it by the
//! free-text search and optional radius, then prints the requested view.
//! Failures are reported as errors; an empty page prints an explicit notice.

use anyhow::{bail, Context};
use clap::Args;
use mandi_core::{
    analyze, build_series, derive_options, narrow, summarize, AppConfig, Coordinates,
    FilterSelection, MarketRecord, DEFAULT_FETCH_LIMIT, INDIAN_STATES,
};
use mandi_market::MarketClient;
use serde::Serialize;

const NO_RECORDS: &str = "No records found for the current filters.";

/// Filters shared by `prices`, `options`, `trend`, and `insight`.
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct FilterArgs {
    /// State name (e.g., Bihar)
    #[arg(long)]
    pub state: Option<String>,
    /// District name
    #[arg(long)]
    pub district: Option<String>,
    /// Market (mandi) name
    #[arg(long)]
    pub market: Option<String>,
    /// Commodity name (e.g., Wheat)
    #[arg(long)]
    pub commodity: Option<String>,
    /// Case-insensitive text matched against market, state, district, commodity
    #[arg(long)]
    pub search: Option<String>,
    /// Rows per page (defaults to `MANDI_PAGE_SIZE`)
    #[arg(long)]
    pub limit: Option<u32>,
    /// Rows to skip
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
    /// Latitude of the point to measure distance from
    #[arg(long, allow_negative_numbers = true, requires = "lon")]
    pub lat: Option<f64>,
    /// Longitude of the point to measure distance from
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    pub lon: Option<f64>,
    /// Radius in km around lat/lon (default 50)
    #[arg(long)]
    pub radius_km: Option<f64>,
}

impl FilterArgs {
    pub(crate) fn selection(&self, default_page_size: u32) -> FilterSelection {
        let clean = |v: Option<&str>| v.map(str::trim).unwrap_or_default().to_string();
        FilterSelection {
            state: clean(self.state.as_deref()),
            district: clean(self.district.as_deref()),
            market: clean(self.market.as_deref()),
            commodity: clean(self.commodity.as_deref()),
            search: clean(self.search.as_deref()),
            limit: self
                .limit
                .unwrap_or(default_page_size)
                .clamp(1, DEFAULT_FETCH_LIMIT),
            offset: self.offset,
        }
    }

    pub(crate) fn location(&self) -> anyhow::Result<Option<Coordinates>> {
        let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
            return Ok(None);
        };
        let geo = Coordinates {
            latitude: lat,
            longitude: lon,
            radius_km: self.radius_km,
        };
        if !geo.is_valid() {
            bail!("invalid location: lat must be in [-90, 90], lon in [-180, 180]");
        }
        if geo.radius_km.is_some_and(|r| !r.is_finite() || r <= 0.0) {
            bail!("--radius-km must be a positive number");
        }
        Ok(Some(geo))
    }
}

fn market_client(config: &AppConfig) -> anyhow::Result<MarketClient> {
    let api_key = config.require_data_gov_api_key()?;
    MarketClient::with_base_url(
        api_key,
        config.request_timeout_secs,
        &config.user_agent,
        &config.market_base_url,
    )
    .context("failed to build price API client")
}

struct Page {
    selection: FilterSelection,
    records: Vec<MarketRecord>,
    /// Rows returned upstream before narrowing.
    fetched: usize,
}

async fn fetch_page(config: &AppConfig, args: &FilterArgs) -> anyhow::Result<Page> {
    let geo = args.location()?;
    let selection = args.selection(config.page_size);
    let client = market_client(config)?;

    let raw = client
        .try_fetch_records(&selection.to_query())
        .await
        .context("failed to fetch price records")?;
    let records = narrow(&raw, selection.search_query(), geo.as_ref());
    tracing::debug!(fetched = raw.len(), kept = records.len(), "page narrowed");
    Ok(Page {
        selection,
        records,
        fetched: raw.len(),
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fmt_price(price: Option<f64>) -> String {
    price.map_or_else(|| "\u{2014}".to_string(), |p| format!("{p:.0}"))
}

fn truncate(value: Option<&str>, width: usize) -> String {
    let value = value.unwrap_or("");
    if value.chars().count() > width {
        format!("{}...", value.chars().take(width - 3).collect::<String>())
    } else {
        value.to_string()
    }
}

/// List price records.
///
/// # Errors
///
/// Returns an error if the API key is missing, the location is invalid, or
/// the request fails.
pub(crate) async fn run_prices(
    config: &AppConfig,
    args: &FilterArgs,
    json: bool,
) -> anyhow::Result<()> {
    let Page {
        selection,
        records,
        fetched,
    } = fetch_page(config, args).await?;
    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("{NO_RECORDS}");
        return Ok(());
    }

    println!(
        "{:<18}{:<16}{:<18}{:<16}{:<12}{:>8}{:>8}{:>8}",
        "STATE", "DISTRICT", "MARKET", "COMMODITY", "DATE", "MIN", "MAX", "MODAL"
    );
    for r in &records {
        println!(
            "{:<18}{:<16}{:<18}{:<16}{:<12}{:>8}{:>8}{:>8}",
            truncate(r.state.as_deref(), 17),
            truncate(r.district.as_deref(), 15),
            truncate(r.market.as_deref(), 17),
            truncate(r.commodity.as_deref(), 15),
            r.arrival_date.as_deref().unwrap_or(""),
            fmt_price(r.min_price),
            fmt_price(r.max_price),
            fmt_price(r.modal_price),
        );
    }

    let more = if selection.can_go_next(fetched) {
        " (more available: use --offset)"
    } else {
        ""
    };
    println!(
        "\npage {} \u{b7} {} rows{more}",
        selection.current_page(),
        records.len()
    );
    Ok(())
}

/// Show the cascading filter choices.
///
/// # Errors
///
/// Same as [`run_prices`].
pub(crate) async fn run_options(
    config: &AppConfig,
    args: &FilterArgs,
    json: bool,
) -> anyhow::Result<()> {
    let Page {
        selection, records, ..
    } = fetch_page(config, args).await?;
    let options = derive_options(&records, &selection);
    if json {
        return print_json(&options);
    }
    if records.is_empty() {
        println!("{NO_RECORDS}");
        return Ok(());
    }

    for (label, values) in [
        ("Districts", &options.districts),
        ("Markets", &options.markets),
        ("Commodities", &options.commodities),
    ] {
        println!("{label} ({}):", values.len());
        for value in values {
            println!("  {value}");
        }
    }
    Ok(())
}

/// Show the modal-price trend for the selected market and commodity.
///
/// # Errors
///
/// Same as [`run_prices`].
pub(crate) async fn run_trend(
    config: &AppConfig,
    args: &FilterArgs,
    json: bool,
) -> anyhow::Result<()> {
    let Page {
        selection, records, ..
    } = fetch_page(config, args).await?;
    let series = build_series(
        &records,
        Some(selection.market.as_str()),
        Some(selection.commodity.as_str()),
    );
    if json {
        return print_json(&series);
    }
    if series.is_empty() {
        println!("{NO_RECORDS}");
        return Ok(());
    }

    println!("{:<12}{:>10}  MARKET", "DATE", "MODAL");
    for point in &series {
        println!(
            "{:<12}{:>10.0}  {}",
            point.date.to_string(),
            point.price,
            point.market.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct InsightOutput {
    text: String,
    insight: Option<mandi_core::PriceInsight>,
}

/// Print the plain-language price summary.
///
/// # Errors
///
/// Same as [`run_prices`].
pub(crate) async fn run_insight(
    config: &AppConfig,
    args: &FilterArgs,
    json: bool,
) -> anyhow::Result<()> {
    let Page {
        selection, records, ..
    } = fetch_page(config, args).await?;
    let text = summarize(
        &records,
        Some(selection.commodity.as_str()),
        Some(selection.state.as_str()),
    );
    if json {
        return print_json(&InsightOutput {
            text,
            insight: analyze(&records),
        });
    }
    println!("{text}");
    Ok(())
}

/// Print the states and union territories accepted by `--state`.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub(crate) fn run_states(json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&INDIAN_STATES);
    }
    for state in INDIAN_STATES {
        println!("{state}");
    }
    Ok(())
}
