//! # dashboard-core
//!
//! The analytic engines behind the crypto dashboard. Everything here is a
//! pure function over a market snapshot, apart from the feed and the
//! exchange-rate fetch.
//!
//! ## Query flow
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  "top 3 gainers under $1"                                     │
//! ├───────────────────────────────────────────────────────────────┤
//! │  classify   intent = gainers                                  │
//! │             filters = change ≥ 0, price ≤ 1,                  │
//! │                       sort change desc, limit 3               │
//! │  apply      snapshot ──filter──sort──truncate──► 3 assets     │
//! │  format     "Showing 3 gainers sorted by performance."        │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Portfolio health
//!
//! ```text
//! │  diversification  ██████████            30% weight
//! │  volatility       ████████████████      40% weight
//! │  category risk    ██████████            30% weight
//! │  → 0-100 score, graded A-F, up to 3 suggestions
//! ```

pub mod assistant;
pub mod currency;
pub mod error;
pub mod health;
pub mod market;
pub mod model;
pub mod query;

pub use assistant::respond;
pub use currency::{Currency, RateTable};
pub use error::{DashboardError, Result};
pub use health::{Grade, HealthMetrics, HealthReport};
pub use market::{analyze_market, MarketFeed, MarketHealthGauge, MarketReport, MarketSimulator};
pub use model::{AssetRecord, Category, HoldingRecord};
pub use query::{classify, run_query, FilterSpec, Intent, QueryOutcome};
