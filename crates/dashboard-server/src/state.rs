//! Application State

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;

use dashboard_accounts::{
    AuthService, InsightCache, KeyValueStore, Ledger, OrderDesk, SettingsStore, SimulatedGateway,
    SyncCodes,
};
use dashboard_core::market::GaugeReading;
use dashboard_core::{AssetRecord, MarketHealthGauge, MarketSimulator, RateTable};

use crate::config::ServerConfig;

/// Ticks buffered per WebSocket subscriber before it starts lagging
const TICK_BUFFER: usize = 16;

/// One market update pushed to stream subscribers
#[derive(Clone, Debug, Serialize)]
pub struct MarketTick {
    pub assets: Vec<AssetRecord>,
    pub gauge: GaugeReading,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Simulated market feed
    pub market: Arc<MarketSimulator>,

    pub gauge: Arc<Mutex<MarketHealthGauge>>,

    /// USD conversion table, refreshed at startup when a rates URL is set
    pub rates: Arc<RwLock<RateTable>>,

    pub auth: Arc<AuthService>,
    pub sync_codes: Arc<SyncCodes>,
    pub ledger: Arc<Ledger>,
    pub orders: Arc<OrderDesk>,
    pub settings: Arc<SettingsStore>,
    pub insights: Arc<InsightCache>,

    /// Fan-out of market ticks to WebSocket clients
    pub ticks: broadcast::Sender<MarketTick>,

    pub ai_thinking: Duration,
}

impl AppState {
    pub fn new(
        config: &ServerConfig,
        store: Arc<dyn KeyValueStore>,
        market: MarketSimulator,
        gauge: MarketHealthGauge,
    ) -> Self {
        let ledger = Arc::new(Ledger::new(store.clone()));
        let gateway = Arc::new(SimulatedGateway::new(config.payment_latency));
        let (ticks, _) = broadcast::channel(TICK_BUFFER);

        Self {
            market: Arc::new(market),
            gauge: Arc::new(Mutex::new(gauge)),
            rates: Arc::new(RwLock::new(RateTable::fallback())),
            auth: Arc::new(AuthService::new(store.clone())),
            sync_codes: Arc::new(SyncCodes::new(store.clone())),
            orders: Arc::new(OrderDesk::new(ledger.clone(), gateway)),
            ledger,
            settings: Arc::new(SettingsStore::new(store.clone())),
            insights: Arc::new(InsightCache::new(store)),
            ticks,
            ai_thinking: config.ai_thinking,
        }
    }

    /// Advance the simulator and gauge once and broadcast the result
    pub async fn tick(&self) -> MarketTick {
        let assets = self.market.tick().await;
        let gauge = self.gauge.lock().await.step();
        let tick = MarketTick { assets, gauge };

        // Err only means nobody is listening
        let _ = self.ticks.send(tick.clone());
        tick
    }

    /// Drive the market on a fixed period until the runtime shuts down
    pub fn spawn_market_ticker(&self, period: Duration) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let tick = state.tick().await;
                tracing::debug!(
                    assets = tick.assets.len(),
                    gauge = tick.gauge.score,
                    subscribers = state.ticks.receiver_count(),
                    "market tick"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_accounts::MemoryStore;

    fn state() -> AppState {
        AppState::new(
            &ServerConfig::default(),
            Arc::new(MemoryStore::new()),
            MarketSimulator::with_seed(7),
            MarketHealthGauge::with_seed(7),
        )
    }

    #[tokio::test]
    async fn test_tick_reaches_subscribers() {
        let state = state();
        let mut rx = state.ticks.subscribe();

        let sent = state.tick().await;
        let received = rx.recv().await.unwrap();

        assert_eq!(received.assets, sent.assets);
        assert_eq!(received.gauge, sent.gauge);
        assert_eq!(received.assets.len(), 12);
    }

    #[tokio::test]
    async fn test_tick_without_subscribers() {
        let state = state();
        let tick = state.tick().await;
        assert!(!tick.assets.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_runs_on_period() {
        let state = state();
        let mut rx = state.ticks.subscribe();
        let handle = state.spawn_market_ticker(Duration::from_millis(3000));

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert!(rx.try_recv().is_ok());
        handle.abort();
    }
}
