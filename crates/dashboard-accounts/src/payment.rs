//! Payments
//!
//! Development-only gateway. Nothing is charged; every request succeeds
//! after a short simulated round trip.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dashboard_core::Currency;

use crate::error::{AccountError, Result};

/// Default simulated network latency
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(800);

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random lowercase base-36 string
pub(crate) fn base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Currency,
    /// Provider key, e.g. "stripe_test"
    pub method: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Succeeded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub id: String,
    pub provider: String,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub currency: Currency,
    pub captured_at: DateTime<Utc>,
}

/// Human-readable provider for a method key
pub fn provider_name(method: &str) -> &'static str {
    match method {
        "stripe_test" => "Stripe (Test)",
        "paypal_sandbox" => "PayPal (Sandbox)",
        "razorpay_test" => "Razorpay (Test)",
        _ => "DevPay",
    }
}

/// Payment gateway trait
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &PaymentRequest) -> Result<PaymentReceipt>;

    fn name(&self) -> &str;
}

/// Always-succeeding gateway with configurable latency
pub struct SimulatedGateway {
    latency: Duration,
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY)
    }
}

impl SimulatedGateway {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: &PaymentRequest) -> Result<PaymentReceipt> {
        if request.amount.is_sign_negative() {
            return Err(AccountError::Payment("amount must not be negative".into()));
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let receipt = PaymentReceipt {
            id: format!("pay_{}", base36(8)),
            provider: provider_name(&request.method).to_string(),
            status: PaymentStatus::Succeeded,
            amount: request.amount,
            currency: request.currency,
            captured_at: Utc::now(),
        };
        tracing::debug!(id = %receipt.id, provider = %receipt.provider, amount = %receipt.amount, "payment captured");
        Ok(receipt)
    }

    fn name(&self) -> &str {
        "SimulatedGateway"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(method: &str) -> PaymentRequest {
        PaymentRequest {
            amount: dec!(250.50),
            currency: Currency::Usd,
            method: method.into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_charge_succeeds_after_latency() {
        let gateway = SimulatedGateway::default();
        let started = tokio::time::Instant::now();
        let receipt = gateway.charge(&request("paypal_sandbox")).await.unwrap();

        assert!(started.elapsed() >= DEFAULT_LATENCY);
        assert_eq!(receipt.provider, "PayPal (Sandbox)");
        assert_eq!(receipt.status, PaymentStatus::Succeeded);
        assert_eq!(receipt.amount, dec!(250.50));
        assert!(receipt.id.starts_with("pay_"));
        assert_eq!(receipt.id.len(), 12);
    }

    #[tokio::test]
    async fn test_unknown_method_is_devpay() {
        let gateway = SimulatedGateway::new(Duration::ZERO);
        let receipt = gateway.charge(&request("cash")).await.unwrap();
        assert_eq!(receipt.provider, "DevPay");
    }

    #[tokio::test]
    async fn test_negative_amount_rejected() {
        let gateway = SimulatedGateway::new(Duration::ZERO);
        let mut req = request("stripe_test");
        req.amount = dec!(-1);
        assert!(gateway.charge(&req).await.is_err());
    }
}
