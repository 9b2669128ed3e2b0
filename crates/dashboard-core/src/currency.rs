//! Display Currencies
//!
//! All prices are carried in USD. Conversion happens at the edge using a
//! USD-based rate table, refreshed over HTTP when available.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::model::fixed;

/// Public USD-based rate endpoint
pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate.host/latest?base=USD";

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
    Inr,
    Cad,
    Aud,
}

impl Currency {
    pub const ALL: [Self; 7] = [
        Self::Usd,
        Self::Eur,
        Self::Gbp,
        Self::Jpy,
        Self::Inr,
        Self::Cad,
        Self::Aud,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
            Self::Inr => "INR",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Usd | Self::Cad | Self::Aud => "$",
            Self::Eur => "€",
            Self::Gbp => "£",
            Self::Jpy => "¥",
            Self::Inr => "₹",
        }
    }

    /// Units of this currency per USD when no live table is available
    pub fn fallback_rate(self) -> Decimal {
        match self {
            Self::Usd => Decimal::ONE,
            Self::Eur => dec!(0.92),
            Self::Gbp => dec!(0.80),
            Self::Jpy => dec!(145.0),
            Self::Inr => dec!(90.43),
            Self::Cad => dec!(1.35),
            Self::Aud => dec!(1.50),
        }
    }
}

impl FromStr for Currency {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DashboardError::UnsupportedCurrency(s.to_string()))
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// USD-based conversion rates
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    pub rates: HashMap<Currency, Decimal>,
    /// Set when the table came from a live fetch
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self::fallback()
    }
}

impl RateTable {
    pub fn fallback() -> Self {
        Self {
            rates: Currency::ALL.iter().map(|c| (*c, c.fallback_rate())).collect(),
            updated_at: None,
        }
    }

    /// Rate for `currency`, 1 when the table has none
    pub fn rate(&self, currency: Currency) -> Decimal {
        self.rates.get(&currency).copied().unwrap_or(Decimal::ONE)
    }

    /// Fails when the converted amount does not fit in a `Decimal`
    pub fn convert(&self, value_usd: Decimal, to: Currency) -> Result<Decimal> {
        scale(value_usd, self.rate(to))
    }
}

/// Convert with the static fallback table
pub fn convert(value_usd: Decimal, to: Currency) -> Result<Decimal> {
    scale(value_usd, to.fallback_rate())
}

fn scale(value_usd: Decimal, rate: Decimal) -> Result<Decimal> {
    value_usd
        .checked_mul(rate)
        .ok_or(DashboardError::AmountOutOfRange(value_usd))
}

/// Symbol plus a fixed number of decimals, e.g. `€1234.50`
pub fn format_currency(value: Decimal, currency: Currency, decimals: u32) -> String {
    let sign = if value.is_sign_negative() && !value.is_zero() { "-" } else { "" };
    format!("{sign}{}{}", currency.symbol(), fixed(value.abs(), decimals))
}

/// Short form with T/B/M suffixes and one decimal, e.g. `$1.2B`
pub fn format_compact(value: Decimal, currency: Currency) -> String {
    let symbol = currency.symbol();
    let scaled = [
        (dec!(1_000_000_000_000), "T"),
        (dec!(1_000_000_000), "B"),
        (dec!(1_000_000), "M"),
    ]
    .into_iter()
    .find(|(unit, _)| value >= *unit);

    match scaled {
        Some((unit, suffix)) => format!("{symbol}{}{suffix}", fixed(value / unit, 1)),
        None => format!("{symbol}{}", fixed(value, 1)),
    }
}

#[derive(Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: HashMap<String, Decimal>,
}

/// Fetch a live table. Codes outside [`Currency::ALL`] are ignored and any
/// supported code missing from the response keeps its fallback rate.
pub async fn try_fetch_rates(client: &reqwest::Client, url: &str) -> Result<RateTable> {
    let body: RatesResponse = client
        .get(url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if body.rates.is_empty() {
        return Err(DashboardError::Feed("rate response had no rates".into()));
    }

    let mut table = RateTable::fallback();
    for (code, rate) in body.rates {
        if let Ok(currency) = code.parse::<Currency>() {
            table.rates.insert(currency, rate);
        }
    }
    table.rates.insert(Currency::Usd, Decimal::ONE);
    table.updated_at = Some(Utc::now());
    Ok(table)
}

/// Fetch a live table, falling back to static rates on any error
pub async fn fetch_rates(client: &reqwest::Client, url: &str) -> RateTable {
    match try_fetch_rates(client, url).await {
        Ok(table) => {
            tracing::info!(url, "exchange rates refreshed");
            table
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "failed to fetch exchange rates, using fallback");
            RateTable::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::Eur);
        assert_eq!(" JPY ".parse::<Currency>().unwrap(), Currency::Jpy);
        assert!(matches!(
            "XYZ".parse::<Currency>(),
            Err(DashboardError::UnsupportedCurrency(_))
        ));
    }

    #[test]
    fn test_convert() {
        assert_eq!(convert(dec!(100), Currency::Eur).unwrap(), dec!(92.00));
        assert_eq!(convert(dec!(2), Currency::Jpy).unwrap(), dec!(290.0));

        let mut table = RateTable::fallback();
        table.rates.remove(&Currency::Gbp);
        assert_eq!(table.convert(dec!(10), Currency::Gbp).unwrap(), dec!(10));
    }

    #[test]
    fn test_convert_out_of_range() {
        let table = RateTable::fallback();
        assert!(matches!(
            table.convert(Decimal::MAX, Currency::Jpy),
            Err(DashboardError::AmountOutOfRange(_))
        ));
        // A rate under 1 shrinks the amount, so even the maximum fits
        assert!(table.convert(Decimal::MAX, Currency::Eur).is_ok());
        assert_eq!(table.convert(Decimal::MAX, Currency::Usd).unwrap(), Decimal::MAX);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(1234.5), Currency::Eur, 2), "€1234.50");
        assert_eq!(format_currency(dec!(-3), Currency::Usd, 2), "-$3.00");
        assert_eq!(format_currency(dec!(0.0000085), Currency::Usd, 8), "$0.00000850");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(dec!(1_250_000_000_000), Currency::Usd), "$1.3T");
        assert_eq!(format_compact(dec!(45_200_000_000), Currency::Usd), "$45.2B");
        assert_eq!(format_compact(dec!(850_000_000), Currency::Gbp), "£850.0M");
        assert_eq!(format_compact(dec!(999.94), Currency::Inr), "₹999.9");
    }

    #[tokio::test]
    async fn test_fetch_falls_back_when_unreachable() {
        let client = reqwest::Client::new();
        let table = fetch_rates(&client, "http://127.0.0.1:9/latest").await;
        assert_eq!(table, RateTable::fallback());
        assert!(table.updated_at.is_none());
    }
}
