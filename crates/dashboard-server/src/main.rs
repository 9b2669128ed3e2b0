//! Crypto Dashboard HTTP Server
//!
//! Axum-based server providing the REST API and the live market WebSocket
//! over a simulated feed.

mod config;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashboard_accounts::{JsonFileStore, KeyValueStore, MemoryStore};
use dashboard_core::currency::fetch_rates;
use dashboard_core::{MarketHealthGauge, MarketSimulator};

use crate::config::ServerConfig;
use crate::routes::{build_router, ENDPOINTS};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment first so RUST_LOG from .env applies
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let store: Arc<dyn KeyValueStore> = match &config.store_path {
        Some(path) => {
            let store = JsonFileStore::open(path)?;
            tracing::info!("✓ Persisting to {}", store.path().display());
            Arc::new(store)
        }
        None => {
            tracing::warn!("⚠ DASHBOARD_STORE_PATH not set - state is kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(
        &config,
        store,
        MarketSimulator::new(),
        MarketHealthGauge::new(),
    );

    match &config.fx_rates_url {
        Some(url) => {
            let client = reqwest::Client::new();
            *state.rates.write().await = fetch_rates(&client, url).await;
        }
        None => tracing::info!("Using built-in exchange rates"),
    }

    let ticker = state.spawn_market_ticker(config.market_tick);
    tracing::info!("✓ Market simulator ticking every {:?}", config.market_tick);

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 crypto dashboard running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    for (method, path, about) in ENDPOINTS {
        tracing::info!("  {:<6} {:<28} - {}", method, path, about);
    }
    tracing::info!("");

    axum::serve(listener, app).await?;

    ticker.abort();
    Ok(())
}
