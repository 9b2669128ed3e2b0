//! Transaction Ledger
//!
//! Per-user trade history, newest first, capped at [`MAX_ENTRIES`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dashboard_core::Currency;

use crate::error::{AccountError, Result};
use crate::payment::{base36, PaymentReceipt};
use crate::store::{KeyValueStore, StoreExt, StoreKey};

pub const MAX_ENTRIES: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Market,
    Limit,
}

/// Trade details supplied by the caller
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub side: Side,
    pub symbol: String,
    pub name: String,
    pub quantity: Decimal,
    pub exec_price_usd: Decimal,
    pub total_usd: Decimal,
    pub currency_used: Currency,
    pub total_in_currency: Decimal,
    pub payment: PaymentReceipt,
    pub order_type: OrderType,
}

/// A recorded trade
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// `<unix millis>-<6 base36 chars>`
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub details: NewTransaction,
}

pub struct Ledger {
    store: Arc<dyn KeyValueStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Prepend a trade to the user's history
    pub fn record(&self, username: &str, details: NewTransaction) -> Result<Transaction> {
        if username.is_empty() {
            return Err(AccountError::NotLoggedIn);
        }

        let now = Utc::now();
        let entry = Transaction {
            id: format!("{}-{}", now.timestamp_millis(), base36(6)),
            created_at: now,
            details,
        };

        let key = StoreKey::Transactions(username.to_string());
        self.store.update_json(&key, |list: &mut Vec<Transaction>| {
            list.insert(0, entry.clone());
            list.truncate(MAX_ENTRIES);
            Ok(())
        })?;

        tracing::info!(
            username,
            id = %entry.id,
            side = ?entry.details.side,
            symbol = %entry.details.symbol,
            "transaction recorded"
        );
        Ok(entry)
    }

    /// Newest first; empty for no user or unreadable history
    pub fn list(&self, username: &str) -> Result<Vec<Transaction>> {
        if username.is_empty() {
            return Ok(Vec::new());
        }
        let key = StoreKey::Transactions(username.to_string());
        Ok(self.store.load_json(&key)?.unwrap_or_default())
    }

    pub fn latest(&self, username: &str) -> Result<Option<Transaction>> {
        Ok(self.list(username)?.into_iter().next())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::payment::PaymentStatus;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    pub(crate) fn trade(side: Side, symbol: &str, quantity: Decimal, price: Decimal) -> NewTransaction {
        NewTransaction {
            side,
            symbol: symbol.into(),
            name: symbol.to_uppercase(),
            quantity,
            exec_price_usd: price,
            total_usd: quantity * price,
            currency_used: Currency::Usd,
            total_in_currency: quantity * price,
            payment: PaymentReceipt {
                id: "pay_test0000".into(),
                provider: "DevPay".into(),
                status: PaymentStatus::Succeeded,
                amount: quantity * price,
                currency: Currency::Usd,
                captured_at: Utc::now(),
            },
            order_type: OrderType::Market,
        }
    }

    #[test]
    fn test_newest_first() {
        let ledger = Ledger::new(Arc::new(MemoryStore::new()));
        ledger.record("alice", trade(Side::Buy, "btc", dec!(1), dec!(100))).unwrap();
        let second = ledger.record("alice", trade(Side::Sell, "btc", dec!(0.5), dec!(110))).unwrap();

        let list = ledger.list("alice").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, second.id);
        assert_eq!(ledger.latest("alice").unwrap().unwrap().id, second.id);
        assert!(ledger.list("bob").unwrap().is_empty());
    }

    #[test]
    fn test_id_shape() {
        let ledger = Ledger::new(Arc::new(MemoryStore::new()));
        let tx = ledger.record("alice", trade(Side::Buy, "eth", dec!(1), dec!(1))).unwrap();
        let (millis, suffix) = tx.id.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 6);
    }

    #[test]
    fn test_capped() {
        let ledger = Ledger::new(Arc::new(MemoryStore::new()));
        for _ in 0..(MAX_ENTRIES + 3) {
            ledger.record("alice", trade(Side::Buy, "ada", dec!(1), dec!(0.5))).unwrap();
        }
        assert_eq!(ledger.list("alice").unwrap().len(), MAX_ENTRIES);
    }

    #[test]
    fn test_requires_user() {
        let ledger = Ledger::new(Arc::new(MemoryStore::new()));
        let result = ledger.record("", trade(Side::Buy, "btc", dec!(1), dec!(1)));
        assert!(matches!(result, Err(AccountError::NotLoggedIn)));
        assert!(ledger.list("").unwrap().is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let ledger = Ledger::new(Arc::new(MemoryStore::new()));
        let tx = ledger.record("alice", trade(Side::Sell, "sol", dec!(2), dec!(3))).unwrap();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "sell");
        assert_eq!(json["order_type"], "market");
        assert!(json.get("details").is_none());
    }
}
