//! Client and dashboard session for the data.gov.in mandi price resource.

pub mod client;
pub mod error;
pub mod generation;
pub mod session;
pub mod types;

pub use client::MarketClient;
pub use error::MarketError;
pub use generation::{RequestGeneration, RequestTicket};
pub use session::{DashboardSnapshot, LoadStatus, MarketSession, PendingFetch};
