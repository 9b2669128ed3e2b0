//! Market Simulator
//!
//! Demo feed with a fixed coin list. Each tick nudges every price by up to
//! ±1% and drifts the 24h change by up to ±0.25 points.

use std::collections::HashSet;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::RwLock;

use super::MarketFeed;
use crate::error::{DashboardError, Result};
use crate::model::AssetRecord;

struct SimState {
    assets: Vec<AssetRecord>,
    rng: StdRng,
}

impl SimState {
    fn step(&mut self) {
        let rng = &mut self.rng;
        // replaced wholesale so readers never see a half-updated snapshot
        let next: Vec<AssetRecord> = self
            .assets
            .iter()
            .map(|coin| {
                let price_factor = Decimal::ONE + unit_offset(rng) * dec!(0.02);
                let drift = unit_offset(rng) * dec!(0.5);
                let mut coin = coin.clone();
                coin.price *= price_factor;
                coin.change_24h += drift;
                coin
            })
            .collect();
        self.assets = next;
    }
}

/// Uniform in [-0.5, 0.5) with six decimals
fn unit_offset(rng: &mut StdRng) -> Decimal {
    Decimal::new(rng.gen_range(-500_000_i64..500_000), 6)
}

fn default_assets() -> Vec<AssetRecord> {
    vec![
        AssetRecord::new("btc", "Bitcoin", dec!(98500.00))
            .with_change(dec!(2.14))
            .with_volume(dec!(45_200_000_000)),
        AssetRecord::new("eth", "Ethereum", dec!(3420.80))
            .with_change(dec!(-0.85))
            .with_volume(dec!(32_100_000_000)),
        AssetRecord::new("sol", "Solana", dec!(142.35))
            .with_change(dec!(5.22))
            .with_volume(dec!(28_500_000_000)),
        AssetRecord::new("bnb", "BNB", dec!(612.20))
            .with_change(dec!(1.45))
            .with_volume(dec!(19_300_000_000)),
        AssetRecord::new("ada", "Cardano", dec!(0.582))
            .with_change(dec!(-2.10))
            .with_volume(dec!(15_700_000_000)),
        AssetRecord::new("xrp", "XRP", dec!(2.35))
            .with_change(dec!(3.8))
            .with_volume(dec!(22_400_000_000)),
        AssetRecord::new("pepe", "Pepe", dec!(0.0000085))
            .with_change(dec!(25.3))
            .with_volume(dec!(2_100_000_000)),
        AssetRecord::new("doge", "Dogecoin", dec!(0.38))
            .with_change(dec!(8.2))
            .with_volume(dec!(1_800_000_000)),
        AssetRecord::new("shib", "Shiba Inu", dec!(0.000019))
            .with_change(dec!(15.7))
            .with_volume(dec!(1_200_000_000)),
        AssetRecord::new("fet", "Fetch.ai", dec!(2.45))
            .with_change(dec!(12.1))
            .with_volume(dec!(850_000_000)),
        AssetRecord::new("tao", "Bittensor", dec!(425.30))
            .with_change(dec!(18.5))
            .with_volume(dec!(950_000_000)),
        AssetRecord::new("icp", "Internet Computer", dec!(12.80))
            .with_change(dec!(9.3))
            .with_volume(dec!(650_000_000)),
    ]
}

/// Simulated feed over an in-memory snapshot
pub struct MarketSimulator {
    state: RwLock<SimState>,
}

impl Default for MarketSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketSimulator {
    pub fn new() -> Self {
        Self::with_rng(default_assets(), StdRng::from_entropy())
    }

    /// Deterministic simulator for tests
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(default_assets(), StdRng::seed_from_u64(seed))
    }

    /// Simulate over a custom coin list. Symbols must be unique.
    pub fn from_assets(assets: Vec<AssetRecord>, seed: u64) -> Result<Self> {
        if assets.is_empty() {
            return Err(DashboardError::Feed("simulator needs at least one asset".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = assets.iter().find(|a| !seen.insert(a.symbol.as_str())) {
            return Err(DashboardError::Feed(format!("duplicate symbol: {}", dup.symbol)));
        }
        Ok(Self::with_rng(assets, StdRng::seed_from_u64(seed)))
    }

    fn with_rng(assets: Vec<AssetRecord>, rng: StdRng) -> Self {
        Self {
            state: RwLock::new(SimState { assets, rng }),
        }
    }

    /// Advance one step and return the new snapshot
    pub async fn tick(&self) -> Vec<AssetRecord> {
        let mut state = self.state.write().await;
        state.step();
        tracing::trace!(coins = state.assets.len(), "market tick");
        state.assets.clone()
    }
}

#[async_trait]
impl MarketFeed for MarketSimulator {
    async fn snapshot(&self) -> Result<Vec<AssetRecord>> {
        Ok(self.state.read().await.assets.clone())
    }

    async fn health_check(&self) -> bool {
        !self.state.read().await.assets.is_empty()
    }

    fn name(&self) -> &str {
        "MarketSimulator"
    }
}
