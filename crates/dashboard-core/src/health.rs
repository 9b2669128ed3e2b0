//! Portfolio Health Scorer
//!
//! Grades a set of holdings against a market snapshot on three axes:
//!
//! ```text
//! score = 0.3 × diversification + 0.4 × volatility + 0.3 × category risk
//!
//!   diversification  min(100, 15 per holding)
//!   volatility       100 − 3 × mean |24h change|
//!   category risk    100 minus fixed concentration penalties
//! ```

use std::collections::{BTreeMap, HashMap};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::{fixed, round_half_up, AssetRecord, Category, HoldingRecord};

/// Letter grade for the composite score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
    /// No holdings to grade
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Self::A,
            80..=89 => Self::B,
            70..=79 => Self::C,
            60..=69 => Self::D,
            _ => Self::F,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
            Self::NotAvailable => "N/A",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intermediate scores behind a grade
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub diversification: Decimal,
    pub volatility_score: Decimal,
    /// Not floored; penalties stack
    pub category_risk_score: i32,
    pub total_value: Decimal,
    pub avg_volatility: Decimal,
    pub category_percentages: BTreeMap<Category, Decimal>,
    pub num_assets: usize,
}

impl HealthMetrics {
    fn percent(&self, category: Category) -> Decimal {
        self.category_percentages
            .get(&category)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub grade: Grade,
    pub score: u32,
    pub suggestions: Vec<String>,
    pub metrics: HealthMetrics,
}

impl HealthReport {
    fn empty() -> Self {
        Self {
            grade: Grade::NotAvailable,
            score: 0,
            suggestions: vec!["Add holdings to analyze your portfolio health.".into()],
            metrics: HealthMetrics::default(),
        }
    }
}

const MAX_SUGGESTIONS: usize = 3;

/// Score a portfolio. Holdings whose symbol is missing from `market` add no
/// value and no volatility but still count toward diversification.
pub fn score(holdings: &[HoldingRecord], market: &[AssetRecord]) -> HealthReport {
    if holdings.is_empty() {
        return HealthReport::empty();
    }

    let lookup: HashMap<String, &AssetRecord> = market
        .iter()
        .map(|a| (a.symbol.to_lowercase(), a))
        .collect();

    let mut total_value = Decimal::ZERO;
    let mut by_category: BTreeMap<Category, Decimal> = BTreeMap::new();
    let mut volatilities: Vec<Decimal> = Vec::with_capacity(holdings.len());

    for holding in holdings {
        let Some(asset) = lookup.get(&holding.symbol.to_lowercase()) else {
            tracing::debug!(symbol = %holding.symbol, "holding has no market price, skipped");
            continue;
        };

        let in_category = by_category.get(&holding.category).copied().unwrap_or_default();
        let priced = holding.amount.checked_mul(asset.price).and_then(|value| {
            Some((total_value.checked_add(value)?, in_category.checked_add(value)?))
        });
        let Some((total, category_total)) = priced else {
            tracing::debug!(symbol = %holding.symbol, amount = %holding.amount, "holding value out of range, skipped");
            continue;
        };

        total_value = total;
        by_category.insert(holding.category, category_total);
        volatilities.push(asset.volatility());
    }

    let category_percentages: BTreeMap<Category, Decimal> = if total_value.is_zero() {
        BTreeMap::new()
    } else {
        by_category
            .into_iter()
            .map(|(cat, value)| (cat, share_percent(value, total_value)))
            .collect()
    };

    let num_assets = holdings.len();
    let diversification = (Decimal::from(num_assets) * dec!(15)).min(dec!(100));

    let avg_volatility = if volatilities.is_empty() {
        Decimal::ZERO
    } else {
        let sum = volatilities
            .iter()
            .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v));
        sum / Decimal::from(volatilities.len())
    };
    let volatility_score = (dec!(100) - avg_volatility.saturating_mul(dec!(3))).max(Decimal::ZERO);

    let mut metrics = HealthMetrics {
        diversification,
        volatility_score,
        category_risk_score: 0,
        total_value,
        avg_volatility,
        category_percentages,
        num_assets,
    };
    metrics.category_risk_score = category_risk(&metrics);

    let composite = diversification * dec!(0.3)
        + volatility_score * dec!(0.4)
        + Decimal::from(metrics.category_risk_score) * dec!(0.3);
    let overall = round_half_up(composite, 0).to_u32().unwrap_or(0);
    let grade = Grade::from_score(overall);

    let suggestions = suggestions(&metrics, grade);

    HealthReport {
        grade,
        score: overall,
        suggestions,
        metrics,
    }
}

/// `value` as a percentage of `total`, saturating when the ratio is out of range
fn share_percent(value: Decimal, total: Decimal) -> Decimal {
    match value.checked_div(total) {
        Some(ratio) => ratio.saturating_mul(dec!(100)),
        None if value.is_sign_negative() == total.is_sign_negative() => Decimal::MAX,
        None => Decimal::MIN,
    }
}

fn category_risk(metrics: &HealthMetrics) -> i32 {
    let memecoin = metrics.percent(Category::Memecoin);
    let stable = metrics.percent(Category::Stablecoin);
    let foundation = metrics
        .percent(Category::Bluechip)
        .saturating_add(metrics.percent(Category::Layer1));

    let mut risk = 100;
    if memecoin > dec!(50) {
        risk -= 40;
    } else if memecoin > dec!(30) {
        risk -= 25;
    } else if memecoin > dec!(10) {
        risk -= 10;
    }

    if stable > dec!(80) {
        risk -= 30;
    }
    if foundation < dec!(20) {
        risk -= 20;
    }
    risk
}

fn suggestions(metrics: &HealthMetrics, grade: Grade) -> Vec<String> {
    let memecoin = metrics.percent(Category::Memecoin);
    let stable = metrics.percent(Category::Stablecoin);
    let foundation = metrics
        .percent(Category::Bluechip)
        .saturating_add(metrics.percent(Category::Layer1));
    let n = metrics.num_assets;
    let avg = metrics.avg_volatility;

    let mut out = Vec::new();

    if memecoin > dec!(80) {
        out.push(format!(
            "Your portfolio is {}% memecoins. Consider rebalancing to BTC/ETH for stability.",
            round_half_up(memecoin, 0)
        ));
    } else if memecoin > dec!(50) {
        out.push(format!(
            "Memecoins represent {}% of your portfolio. High volatility risk detected.",
            round_half_up(memecoin, 0)
        ));
    } else if memecoin > dec!(30) {
        out.push(format!(
            "{}% memecoin exposure may be excessive. Monitor closely.",
            round_half_up(memecoin, 0)
        ));
    }

    if n < 3 {
        let s = if n > 1 { "s" } else { "" };
        out.push(format!(
            "Low diversification detected ({n} asset{s}). Consider adding 2-3 more positions."
        ));
    } else if n > 15 {
        out.push(format!(
            "High diversification ({n} assets) may dilute gains. Consider consolidation."
        ));
    }

    if avg > dec!(15) {
        out.push(format!(
            "Average volatility is {}%. High-risk portfolio — ensure proper risk management.",
            fixed(avg, 1)
        ));
    } else if avg < dec!(3) && stable < dec!(50) {
        out.push("Low volatility detected. Consider exposure to growth assets for higher returns.".into());
    }

    if foundation < dec!(20) && memecoin < dec!(30) {
        out.push("Add blue-chip exposure (BTC, ETH) for a stronger foundation.".into());
    }

    if stable > dec!(70) {
        out.push(format!(
            "{}% in stablecoins is conservative. Consider allocating to appreciating assets.",
            round_half_up(stable, 0)
        ));
    }

    if out.is_empty() {
        out.push(if grade == Grade::A {
            "Portfolio is well-balanced. Continue monitoring market conditions.".into()
        } else {
            "Review asset allocation and adjust based on risk tolerance.".into()
        });
    }

    out.truncate(MAX_SUGGESTIONS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market() -> Vec<AssetRecord> {
        vec![
            AssetRecord::new("btc", "Bitcoin", dec!(100000)).with_change(dec!(2)),
            AssetRecord::new("eth", "Ethereum", dec!(4000)).with_change(dec!(-2)),
            AssetRecord::new("doge", "Dogecoin", dec!(0.4)).with_change(dec!(2)),
            AssetRecord::new("shib", "Shiba Inu", dec!(0.00002)).with_change(dec!(-2)),
            AssetRecord::new("usdc", "USD Coin", dec!(1)).with_change(dec!(0)),
            AssetRecord::new("pepe", "Pepe", dec!(0.00001)).with_change(dec!(40)),
        ]
    }

    #[test]
    fn test_empty_holdings() {
        let report = score(&[], &market());
        assert_eq!(report.grade, Grade::NotAvailable);
        assert_eq!(report.score, 0);
        assert_eq!(report.suggestions.len(), 1);
        assert_eq!(report.metrics.total_value, Decimal::ZERO);
        assert_eq!(serde_json::to_value(report.grade).unwrap(), "N/A");
    }

    #[test]
    fn test_memecoin_penalty_vs_bluechip_baseline() {
        let memes = vec![
            HoldingRecord::new("doge", dec!(1000), Category::Memecoin),
            HoldingRecord::new("shib", dec!(1000000), Category::Memecoin),
        ];
        let chips = vec![
            HoldingRecord::new("btc", dec!(1), Category::Bluechip),
            HoldingRecord::new("eth", dec!(1), Category::Bluechip),
        ];

        let meme_report = score(&memes, &market());
        let chip_report = score(&chips, &market());

        // same size and same average volatility
        assert_eq!(meme_report.metrics.diversification, chip_report.metrics.diversification);
        assert_eq!(meme_report.metrics.avg_volatility, chip_report.metrics.avg_volatility);

        assert_eq!(chip_report.metrics.category_risk_score, 100);
        assert!(chip_report.metrics.category_risk_score - meme_report.metrics.category_risk_score >= 40);
    }

    #[test]
    fn test_weighted_score_and_grade() {
        let holdings = vec![
            HoldingRecord::new("btc", dec!(1), Category::Bluechip),
            HoldingRecord::new("eth", dec!(10), Category::Bluechip),
        ];
        let report = score(&holdings, &market());

        // diversification 30, volatility 94, category 100
        // 9 + 37.6 + 30 = 76.6 → 77
        assert_eq!(report.metrics.diversification, dec!(30));
        assert_eq!(report.metrics.volatility_score, dec!(94));
        assert_eq!(report.score, 77);
        assert_eq!(report.grade, Grade::C);
        assert_eq!(report.metrics.total_value, dec!(140000));
        assert_eq!(
            report.suggestions,
            vec![
                "Low diversification detected (2 assets). Consider adding 2-3 more positions.",
                "Low volatility detected. Consider exposure to growth assets for higher returns.",
            ]
        );
    }

    #[test]
    fn test_case_insensitive_join_and_unmatched_skip() {
        let holdings = vec![
            HoldingRecord::new("BTC", dec!(1), Category::Bluechip),
            HoldingRecord::new("notacoin", dec!(50), Category::Other),
        ];
        let report = score(&holdings, &market());

        assert_eq!(report.metrics.total_value, dec!(100000));
        assert_eq!(report.metrics.num_assets, 2);
        assert_eq!(report.metrics.avg_volatility, dec!(2));
        assert_eq!(report.metrics.category_percentages.len(), 1);
    }

    #[test]
    fn test_all_unmatched_does_not_divide_by_zero() {
        let holdings = vec![HoldingRecord::new("nope", dec!(1), Category::Memecoin)];
        let report = score(&holdings, &market());

        assert_eq!(report.metrics.total_value, Decimal::ZERO);
        assert_eq!(report.metrics.avg_volatility, Decimal::ZERO);
        assert!(report.metrics.category_percentages.is_empty());
        // only the missing-foundation penalty applies
        assert_eq!(report.metrics.category_risk_score, 80);
    }

    #[test]
    fn test_stablecoin_heavy() {
        let holdings = vec![
            HoldingRecord::new("usdc", dec!(9000), Category::Stablecoin),
            HoldingRecord::new("btc", dec!(0.01), Category::Bluechip),
        ];
        let report = score(&holdings, &market());

        // 90% stable, 10% bluechip: −30 and −20
        assert_eq!(report.metrics.category_risk_score, 50);
        assert!(report.suggestions.iter().any(|s| s.starts_with("90% in stablecoins")));
    }

    #[test]
    fn test_single_memecoin_position() {
        let holdings = vec![HoldingRecord::new("pepe", dec!(100000000), Category::Memecoin)];
        let report = score(&holdings, &market());

        // blue-chip advice is suppressed by the memecoin share
        assert_eq!(report.suggestions.len(), 3);
        assert_eq!(
            report.suggestions[1],
            "Low diversification detected (1 asset). Consider adding 2-3 more positions."
        );
        assert!(report.suggestions[0].starts_with("Your portfolio is 100% memecoins"));
        assert!(report.suggestions[2].starts_with("Average volatility is 40.0%"));
        assert_eq!(report.grade, Grade::F);
    }

    #[test]
    fn test_oversized_amount_is_skipped() {
        let holdings = vec![HoldingRecord::new("btc", dec!(1e27), Category::Bluechip)];
        let report = score(&holdings, &market());

        assert_eq!(report.metrics.total_value, Decimal::ZERO);
        assert_eq!(report.metrics.num_assets, 1);
        assert!(report.metrics.category_percentages.is_empty());

        // A priced holding next to it still counts
        let holdings = vec![
            HoldingRecord::new("btc", Decimal::MAX, Category::Bluechip),
            HoldingRecord::new("eth", dec!(1), Category::Bluechip),
        ];
        let report = score(&holdings, &market());
        assert_eq!(report.metrics.total_value, dec!(4000));
        assert_eq!(report.metrics.percent(Category::Bluechip), dec!(100));
    }

    #[test]
    fn test_opposite_amounts_do_not_overflow_shares() {
        let holdings = vec![
            HoldingRecord::new("usdc", dec!(1e24), Category::Stablecoin),
            HoldingRecord::new("usdc", dec!(-1e24) + dec!(0.001), Category::Memecoin),
        ];
        let report = score(&holdings, &market());
        assert_eq!(report.metrics.total_value, dec!(0.001));
        assert_eq!(report.metrics.percent(Category::Stablecoin), Decimal::MAX);
        assert!(report.score <= 100);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(100), Grade::A);
        assert_eq!(Grade::from_score(90), Grade::A);
        assert_eq!(Grade::from_score(89), Grade::B);
        assert_eq!(Grade::from_score(70), Grade::C);
        assert_eq!(Grade::from_score(60), Grade::D);
        assert_eq!(Grade::from_score(59), Grade::F);
    }
}
