//! Query Pipeline
//!
//! ```text
//! raw text ──▶ classify ──▶ (intent, filters) ──▶ apply ──▶ format_response
//! ```
//!
//! Every stage is a pure function over its arguments.

mod classifier;
mod filter;
mod response;

pub use classifier::{classify, Classification, Detector, Intent};
pub use filter::{apply, FilterSpec, SortField, SortOrder};
pub use response::format_response;

use serde::{Deserialize, Serialize};

use crate::model::AssetRecord;

/// Everything a caller needs to render a query result
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub intent: Intent,
    pub filters: FilterSpec,
    pub message: String,
    pub assets: Vec<AssetRecord>,
}

/// Run the full pipeline over a snapshot
pub fn run_query(text: &str, assets: &[AssetRecord]) -> QueryOutcome {
    let Classification { intent, filters, .. } = classify(text);
    let matched = apply(assets, &filters);
    let message = format_response(intent, matched.len());

    QueryOutcome {
        intent,
        filters,
        message,
        assets: matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn market() -> Vec<AssetRecord> {
        vec![
            AssetRecord::new("btc", "Bitcoin", dec!(98500)).with_change(dec!(2.14)).with_volume(dec!(41000000000)),
            AssetRecord::new("eth", "Ethereum", dec!(3420.80)).with_change(dec!(-0.85)).with_volume(dec!(18000000000)),
            AssetRecord::new("sol", "Solana", dec!(142.35)).with_change(dec!(5.22)).with_volume(dec!(3200000000)),
            AssetRecord::new("bnb", "BNB", dec!(612.20)).with_change(dec!(1.45)).with_volume(dec!(1900000000)),
            AssetRecord::new("ada", "Cardano", dec!(0.582)).with_change(dec!(-2.10)).with_volume(dec!(600000000)),
        ]
    }

    #[test]
    fn test_gainers_pipeline() {
        let outcome = run_query("show me the gainers", &market());
        assert_eq!(outcome.intent, Intent::Gainers);

        let symbols: Vec<_> = outcome.assets.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["sol", "btc", "bnb"]);
        assert_eq!(outcome.message, "Showing 3 gainers sorted by performance.");
    }

    #[test]
    fn test_general_pipeline_keeps_everything() {
        let outcome = run_query("hello there", &market());
        assert_eq!(outcome.intent, Intent::General);
        assert_eq!(outcome.assets, market());
        assert_eq!(outcome.message, "Showing all 5 assets.");
    }

    #[test]
    fn test_penny_pipeline() {
        let outcome = run_query("penny coins", &market());
        assert_eq!(outcome.intent, Intent::Penny);
        assert_eq!(outcome.assets.len(), 1);
        assert_eq!(outcome.assets[0].symbol, "ada");
    }

    #[test]
    fn test_empty_market() {
        let outcome = run_query("risky", &[]);
        assert!(outcome.assets.is_empty());
        assert_eq!(outcome.message, "Found 0 high-volatility assets with >10% movement.");
    }
}
