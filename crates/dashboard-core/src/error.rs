//! Error Types for the Dashboard Core
//!
//! The query, health and analysis engines never fail; the market feed, rate
//! fetching and currency conversion return these.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Market feed error: {0}")]
    Feed(String),

    #[error("Asset not supported: {0}")]
    UnsupportedAsset(String),

    #[error("Currency not supported: {0}")]
    UnsupportedCurrency(String),

    #[error("Amount out of range: {0}")]
    AmountOutOfRange(rust_decimal::Decimal),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
