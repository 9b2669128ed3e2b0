//! Order placement: validate, price, pay, record.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;

use dashboard_core::{AssetRecord, Currency, RateTable};

use crate::auth::SessionUser;
use crate::error::{AccountError, Result};
use crate::ledger::{Ledger, NewTransaction, OrderType, Side, Transaction};
use crate::payment::{PaymentGateway, PaymentRequest};
use crate::portfolio::Portfolio;
use crate::store::run_blocking;

fn default_method() -> String {
    "stripe_test".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Symbol of the coin to trade
    pub coin: String,
    pub side: Side,
    pub quantity: Decimal,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub limit_price: Option<Decimal>,
    #[serde(default = "default_method")]
    pub payment_method: String,
    /// Display currency the total is also reported in
    #[serde(default)]
    pub currency: Currency,
}

/// Places orders against the current snapshot and records them
pub struct OrderDesk {
    ledger: Arc<Ledger>,
    gateway: Arc<dyn PaymentGateway>,
    /// Held per user from the balance check until the trade is recorded
    user_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl OrderDesk {
    pub fn new(ledger: Arc<Ledger>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            ledger,
            gateway,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    fn user_lock(&self, username: &str) -> Result<Arc<AsyncMutex<()>>> {
        let mut locks = self
            .user_locks
            .lock()
            .map_err(|_| AccountError::Storage("order lock poisoned".into()))?;
        Ok(locks.entry(username.to_string()).or_default().clone())
    }

    /// Execute a market order at the snapshot price, or a limit order at its
    /// limit price. Sells may not exceed the held balance.
    ///
    /// Orders from the same user run one at a time.
    pub async fn place_order(
        &self,
        user: Option<&SessionUser>,
        request: &OrderRequest,
        market: &[AssetRecord],
        rates: &RateTable,
    ) -> Result<Transaction> {
        let user = user.ok_or(AccountError::NotLoggedIn)?;

        if request.quantity <= Decimal::ZERO {
            return Err(AccountError::InvalidQuantity);
        }

        let asset = market
            .iter()
            .find(|a| a.symbol.eq_ignore_ascii_case(request.coin.trim()))
            .ok_or_else(|| AccountError::AssetNotFound(request.coin.clone()))?;

        let exec_price_usd = match request.order_type {
            OrderType::Market => asset.price,
            OrderType::Limit => request
                .limit_price
                .filter(|p| *p > Decimal::ZERO)
                .ok_or(AccountError::InvalidLimitPrice)?,
        };

        let total_usd = exec_price_usd
            .checked_mul(request.quantity)
            .ok_or_else(|| AccountError::InvalidInput("order total is out of range".into()))?;
        let total_in_currency = rates
            .convert(total_usd, request.currency)
            .map_err(|e| AccountError::InvalidInput(e.to_string()))?;

        let lock = self.user_lock(&user.username)?;
        let _guard = lock.lock().await;

        if request.side == Side::Sell {
            let ledger = self.ledger.clone();
            let username = user.username.clone();
            let history = run_blocking(move || ledger.list(&username)).await?;

            let check =
                Portfolio::from_transactions(&history).validate_sell(&asset.symbol, request.quantity);
            if !check.can_sell {
                return Err(AccountError::InsufficientBalance {
                    symbol: asset.symbol.to_uppercase(),
                    available: check.available,
                    requested: request.quantity,
                });
            }
        }

        let payment = self
            .gateway
            .charge(&PaymentRequest {
                amount: total_usd,
                currency: Currency::Usd,
                method: request.payment_method.clone(),
            })
            .await?;

        let details = NewTransaction {
            side: request.side,
            symbol: asset.symbol.clone(),
            name: asset.name.clone(),
            quantity: request.quantity,
            exec_price_usd,
            total_usd,
            currency_used: request.currency,
            total_in_currency,
            payment,
            order_type: request.order_type,
        };
        let ledger = self.ledger.clone();
        let username = user.username.clone();
        run_blocking(move || ledger.record(&username, details)).await
    }
}
