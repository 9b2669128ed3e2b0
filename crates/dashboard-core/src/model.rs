//! Domain Models
//!
//! Market snapshot records and portfolio holdings.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Symbols and names that count as "majors" for majors/alts segmentation.
pub const MAJORS: [&str; 5] = ["btc", "bitcoin", "eth", "ethereum", "bnb"];

/// One tradable instrument at a point in time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Lowercase ticker, unique within a snapshot (e.g., "btc")
    pub symbol: String,

    /// Full name (e.g., "Bitcoin")
    pub name: String,

    /// Current price in USD
    pub price: Decimal,

    /// 24-hour price change percentage (signed)
    #[serde(default)]
    pub change_24h: Decimal,

    /// 24-hour traded volume in USD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
}

impl AssetRecord {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into().to_lowercase(),
            name: name.into(),
            price,
            change_24h: Decimal::ZERO,
            volume: None,
        }
    }

    pub fn with_change(mut self, change_24h: Decimal) -> Self {
        self.change_24h = change_24h;
        self
    }

    pub fn with_volume(mut self, volume: Decimal) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Absolute 24h move, used as the volatility proxy everywhere
    pub fn volatility(&self) -> Decimal {
        self.change_24h.abs()
    }

    /// Volume with a missing value treated as zero
    pub fn volume_or_zero(&self) -> Decimal {
        self.volume.unwrap_or(Decimal::ZERO)
    }

    /// Whether the symbol or the name is in the majors list
    pub fn is_major(&self) -> bool {
        let symbol = self.symbol.to_lowercase();
        let name = self.name.to_lowercase();
        MAJORS.iter().any(|m| *m == symbol || *m == name)
    }
}

/// Round half away from zero, the way display figures are rounded everywhere
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Fixed-point rendering with exactly `dp` decimals
pub fn fixed(value: Decimal, dp: u32) -> String {
    format!("{:.*}", dp as usize, round_half_up(value, dp))
}

/// Portfolio category used for concentration scoring
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Bluechip,
    #[serde(rename = "layer-1")]
    Layer1,
    Memecoin,
    Stablecoin,
    Defi,
    #[default]
    #[serde(other)]
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bluechip => "bluechip",
            Self::Layer1 => "layer-1",
            Self::Memecoin => "memecoin",
            Self::Stablecoin => "stablecoin",
            Self::Defi => "defi",
            Self::Other => "other",
        }
    }
}

/// A quantity of an asset held by the user
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HoldingRecord {
    /// Symbol, matched case-insensitively against the market snapshot
    pub symbol: String,

    /// Units held
    pub amount: Decimal,

    #[serde(default)]
    pub category: Category,
}

impl HoldingRecord {
    pub fn new(symbol: impl Into<String>, amount: Decimal, category: Category) -> Self {
        Self {
            symbol: symbol.into(),
            amount,
            category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_symbol_is_lowercased() {
        let asset = AssetRecord::new("BTC", "Bitcoin", dec!(97500));
        assert_eq!(asset.symbol, "btc");
        assert!(asset.is_major());
    }

    #[test]
    fn test_major_by_name() {
        let asset = AssetRecord::new("weth", "Ethereum", dec!(3400));
        assert!(asset.is_major());

        let sol = AssetRecord::new("sol", "Solana", dec!(140));
        assert!(!sol.is_major());
    }

    #[test]
    fn test_fixed_pads_and_rounds_half_up() {
        assert_eq!(fixed(dec!(40), 1), "40.0");
        assert_eq!(fixed(dec!(2.125), 2), "2.13");
        assert_eq!(fixed(dec!(-2.125), 2), "-2.13");
        assert_eq!(round_half_up(dec!(76.5), 0), dec!(77));
    }

    #[test]
    fn test_unknown_category_is_other() {
        let holding: HoldingRecord =
            serde_json::from_str(r#"{"symbol":"pepe","amount":"10","category":"frog"}"#).unwrap();
        assert_eq!(holding.category, Category::Other);

        let holding: HoldingRecord =
            serde_json::from_str(r#"{"symbol":"sol","amount":"1","category":"layer-1"}"#).unwrap();
        assert_eq!(holding.category, Category::Layer1);
    }
}
