pub mod app_config;
pub mod config;
pub mod filter;
pub mod geo;
pub mod insight;
pub mod options;
pub mod records;
pub mod selection;
pub mod states;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use filter::{matches_search, narrow, within_radius};
pub use geo::{haversine_km, Coordinates, DEFAULT_RADIUS_KM, EARTH_RADIUS_KM};
pub use insight::{
    analyze, build_series, summarize, PriceInsight, PriceLevel, PricePoint, NO_DATA_MESSAGE,
    SERIES_CAP,
};
pub use options::{derive_options, FilterOptions};
pub use records::{parse_arrival_date, MarketRecord};
pub use selection::{
    FilterField, FilterSelection, RecordQuery, DEFAULT_FETCH_LIMIT, DEFAULT_PAGE_SIZE,
};
pub use states::INDIAN_STATES;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
