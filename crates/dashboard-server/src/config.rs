//! Server Configuration
//!
//! Everything is read from the environment (after `.env` is loaded).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_TICK_MS: u64 = 3000;
pub const DEFAULT_PAYMENT_LATENCY_MS: u64 = 800;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidMillis { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// JSON file backing the store; in-memory when unset
    pub store_path: Option<PathBuf>,
    pub market_tick: Duration,
    pub payment_latency: Duration,
    /// Artificial delay before the assistant answers
    pub ai_thinking: Duration,
    /// Live exchange-rate source; fallback table only when unset
    pub fx_rates_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            store_path: None,
            market_tick: Duration::from_millis(DEFAULT_TICK_MS),
            payment_latency: Duration::from_millis(DEFAULT_PAYMENT_LATENCY_MS),
            ai_thinking: Duration::ZERO,
            fx_rates_url: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let market_tick = millis(&non_empty, "MARKET_TICK_MS", defaults.market_tick)?;
        if market_tick.is_zero() {
            return Err(ConfigError::Zero {
                var: "MARKET_TICK_MS",
            });
        }

        Ok(Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            store_path: non_empty("DASHBOARD_STORE_PATH").map(PathBuf::from),
            market_tick,
            payment_latency: millis(&non_empty, "PAYMENT_LATENCY_MS", defaults.payment_latency)?,
            ai_thinking: millis(&non_empty, "AI_THINKING_MS", defaults.ai_thinking)?,
            fx_rates_url: non_empty("FX_RATES_URL"),
        })
    }
}

fn millis<F>(lookup: &F, var: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidMillis { var, value }),
    }
}
