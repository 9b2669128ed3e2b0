//! # dashboard-accounts
//!
//! Everything the dashboard remembers about its user, on top of a small
//! key-value store.
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────┐
//! │ AuthService  │   │  SyncCodes  │   │ SettingsStore│
//! └──────┬───────┘   └──────┬──────┘   └──────┬───────┘
//!        │                  │                 │
//!        ▼                  ▼                 ▼
//! ┌─────────────────────────────────────────────────────┐
//! │         KeyValueStore (memory │ JSON file)          │
//! └─────────────────────────────────────────────────────┘
//!        ▲                  ▲                 ▲
//!        │                  │                 │
//! ┌──────┴───────┐   ┌──────┴──────┐   ┌──────┴───────┐
//! │  OrderDesk   │──▶│   Ledger    │   │ InsightCache │
//! │ (+ gateway)  │   └─────────────┘   └──────────────┘
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dashboard_accounts::{AuthService, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! let auth = AuthService::new(store);
//! let user = auth.signup("alice", "correct horse")?;
//! ```

mod auth;
mod error;
mod insights;
mod ledger;
mod orders;
mod payment;
mod portfolio;
mod settings;
mod store;
mod sync;

pub use auth::{AuthService, SessionUser, UserProfile};
pub use error::{AccountError, Result};
pub use insights::{Impact, Insight, InsightCache, InsightSnapshot, SentimentReading, Tone, WhaleAlert};
pub use ledger::{Ledger, NewTransaction, OrderType, Side, Transaction, MAX_ENTRIES};
pub use orders::{OrderDesk, OrderRequest};
pub use payment::{
    provider_name, PaymentGateway, PaymentReceipt, PaymentRequest, PaymentStatus, SimulatedGateway,
    DEFAULT_LATENCY,
};
pub use portfolio::{Portfolio, Position, SellCheck};
pub use settings::{
    AdvancedSettings, DataSettings, DisplaySettings, NotificationSettings, PrivacySettings,
    SettingUpdate, Settings, SettingsStore,
};
pub use store::{run_blocking, JsonFileStore, KeyValueStore, MemoryStore, StoreExt, StoreKey};
pub use sync::{ActiveCode, RedeemedSession, SyncCodeRecord, SyncCodes};
