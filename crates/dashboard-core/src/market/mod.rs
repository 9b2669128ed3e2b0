//! Market Data
//!
//! Where snapshots come from and what we read off them.
//!
//! ```text
//!   MarketFeed ──snapshot()──► Vec<AssetRecord> ──► analyze_market()
//!       ▲                                       └──► query / health
//!       │
//!   MarketSimulator (tick every few seconds)
//! ```

mod analysis;
mod gauge;
mod simulator;

pub use analysis::{
    analyze_market, MarketMetrics, MarketReport, Narrative, NarrativeKind, RiskFlag, RiskKind,
    Sentiment, Severity,
};
pub use gauge::{GaugeLabel, GaugeReading, MarketHealthGauge};
pub use simulator::MarketSimulator;

use async_trait::async_trait;

use crate::error::{DashboardError, Result};
use crate::model::AssetRecord;

/// Source of market snapshots
///
/// Implement this for each upstream: the simulator, a REST poller, a socket feed.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Current snapshot, symbols unique
    async fn snapshot(&self) -> Result<Vec<AssetRecord>>;

    /// Single asset by symbol, case-insensitive
    async fn asset(&self, symbol: &str) -> Result<AssetRecord> {
        let wanted = symbol.to_lowercase();
        self.snapshot()
            .await?
            .into_iter()
            .find(|a| a.symbol == wanted)
            .ok_or_else(|| DashboardError::UnsupportedAsset(symbol.to_string()))
    }

    /// Check if the feed is producing data
    async fn health_check(&self) -> bool;

    /// Feed name
    fn name(&self) -> &str;
}
