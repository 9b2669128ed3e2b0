//! Portfolio views derived from a user's transaction history.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dashboard_core::AssetRecord;

use crate::ledger::{Side, Transaction};

/// Result of checking a sell against the held balance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellCheck {
    pub can_sell: bool,
    pub available: Decimal,
    pub deficit: Decimal,
}

/// One held coin valued at the current snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub name: String,
    pub quantity: Decimal,
    pub current_price: Decimal,
    pub value: Decimal,
}

/// Net holdings keyed by uppercase symbol. Only positive balances are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    balances: BTreeMap<String, Decimal>,
}

impl Portfolio {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut balances: BTreeMap<String, Decimal> = BTreeMap::new();
        for tx in transactions {
            let entry = balances.entry(tx.details.symbol.to_uppercase()).or_default();
            match tx.details.side {
                Side::Buy => *entry = entry.saturating_add(tx.details.quantity),
                Side::Sell => *entry = entry.saturating_sub(tx.details.quantity),
            }
        }
        balances.retain(|_, qty| *qty > Decimal::ZERO);
        Self { balances }
    }

    pub fn balances(&self) -> &BTreeMap<String, Decimal> {
        &self.balances
    }

    /// Held quantity, zero when not held
    pub fn coin_balance(&self, symbol: &str) -> Decimal {
        self.balances
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn validate_sell(&self, symbol: &str, quantity: Decimal) -> SellCheck {
        let available = self.coin_balance(symbol);
        SellCheck {
            can_sell: available >= quantity,
            available,
            deficit: quantity.saturating_sub(available).max(Decimal::ZERO),
        }
    }

    fn priced<'a>(&'a self, market: &'a [AssetRecord]) -> impl Iterator<Item = (&'a String, Decimal, &'a AssetRecord)> + 'a {
        self.balances.iter().filter_map(move |(symbol, qty)| {
            market
                .iter()
                .find(|a| a.symbol.eq_ignore_ascii_case(symbol))
                .map(|asset| (symbol, *qty, asset))
        })
    }

    /// USD value of every position with a market price
    pub fn total_value(&self, market: &[AssetRecord]) -> Decimal {
        self.priced(market)
            .fold(Decimal::ZERO, |acc, (_, qty, asset)| acc.saturating_add(qty.saturating_mul(asset.price)))
    }

    /// Priced positions; coins missing from the snapshot are left out
    pub fn detailed(&self, market: &[AssetRecord]) -> Vec<Position> {
        self.priced(market)
            .map(|(symbol, quantity, asset)| Position {
                symbol: symbol.clone(),
                name: asset.name.clone(),
                quantity,
                current_price: asset.price,
                value: quantity.saturating_mul(asset.price),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::trade;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn history() -> Vec<Transaction> {
        [
            trade(Side::Buy, "btc", dec!(1.5), dec!(90000)),
            trade(Side::Sell, "BTC", dec!(0.5), dec!(95000)),
            trade(Side::Buy, "eth", dec!(2), dec!(3000)),
            trade(Side::Buy, "ada", dec!(100), dec!(0.5)),
            trade(Side::Sell, "ada", dec!(100), dec!(0.6)),
            trade(Side::Buy, "xyz", dec!(10), dec!(1)),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, details)| Transaction {
            id: format!("{i}"),
            created_at: Utc::now(),
            details,
        })
        .collect()
    }

    fn market() -> Vec<AssetRecord> {
        vec![
            AssetRecord::new("btc", "Bitcoin", dec!(100000)),
            AssetRecord::new("eth", "Ethereum", dec!(4000)),
            AssetRecord::new("ada", "Cardano", dec!(0.6)),
        ]
    }

    #[test]
    fn test_balances_net_out() {
        let portfolio = Portfolio::from_transactions(&history());
        assert_eq!(portfolio.coin_balance("btc"), dec!(1.0));
        assert_eq!(portfolio.coin_balance("ETH"), dec!(2));
        // fully sold positions are dropped
        assert!(!portfolio.balances().contains_key("ADA"));
        assert_eq!(portfolio.coin_balance("doge"), Decimal::ZERO);
    }

    #[test]
    fn test_validate_sell() {
        let portfolio = Portfolio::from_transactions(&history());
        let ok = portfolio.validate_sell("eth", dec!(2));
        assert!(ok.can_sell);
        assert_eq!(ok.deficit, Decimal::ZERO);

        let short = portfolio.validate_sell("eth", dec!(3.5));
        assert!(!short.can_sell);
        assert_eq!(short.available, dec!(2));
        assert_eq!(short.deficit, dec!(1.5));
    }

    #[test]
    fn test_valuation_skips_unpriced() {
        let portfolio = Portfolio::from_transactions(&history());
        assert_eq!(portfolio.total_value(&market()), dec!(108000));

        let positions = portfolio.detailed(&market());
        let symbols: Vec<_> = positions.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC", "ETH"]);
        assert_eq!(positions[0].name, "Bitcoin");
        assert_eq!(positions[1].value, dec!(8000));
    }

    #[test]
    fn test_huge_balances_saturate() {
        let portfolio = Portfolio::from_transactions(&[
            Transaction { id: "0".into(), created_at: Utc::now(), details: trade(Side::Buy, "btc", Decimal::MAX, dec!(1)) },
            Transaction { id: "1".into(), created_at: Utc::now(), details: trade(Side::Buy, "btc", Decimal::MAX, dec!(1)) },
        ]);
        assert_eq!(portfolio.coin_balance("btc"), Decimal::MAX);
        assert_eq!(portfolio.total_value(&market()), Decimal::MAX);
    }
}
