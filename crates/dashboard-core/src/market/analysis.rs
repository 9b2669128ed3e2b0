//! Market-condition analyzer
//!
//! Reads breadth, volume and momentum off a snapshot and flags coins that
//! look like liquidity traps, flash crashes or a stagnating tape.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::{AssetRecord, fixed, round_half_up};

const BASE_CONFIDENCE: i32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NarrativeKind {
    Bullish,
    Neutral,
    Bearish,
    Volume,
    Momentum,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    #[serde(rename = "type")]
    pub kind: NarrativeKind,
    pub label: String,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskKind {
    LiquidityTrap,
    FlashCrash,
    Stagnation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlag {
    #[serde(rename = "type")]
    pub kind: RiskKind,
    pub severity: Severity,
    /// Coin name, or "Multiple" for market-wide flags
    pub coin: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketMetrics {
    pub avg_change: Decimal,
    pub avg_volume: Decimal,
    pub bullish_breadth: Decimal,
    pub bearish_breadth: Decimal,
    pub total_coins: usize,
}

/// Overall mood derived from the breadth narrative
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketReport {
    pub summary: String,
    pub confidence_score: u8,
    pub narratives: Vec<Narrative>,
    pub risks: Vec<RiskFlag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MarketMetrics>,
}

impl MarketReport {
    fn insufficient() -> Self {
        Self {
            summary: "Insufficient data to analyze market conditions.".into(),
            confidence_score: 0,
            narratives: Vec::new(),
            risks: Vec::new(),
            metrics: None,
        }
    }

    pub fn sentiment(&self) -> Sentiment {
        self.narratives
            .iter()
            .find_map(|n| match n.kind {
                NarrativeKind::Bullish => Some(Sentiment::Bullish),
                NarrativeKind::Bearish => Some(Sentiment::Bearish),
                NarrativeKind::Neutral => Some(Sentiment::Neutral),
                NarrativeKind::Volume | NarrativeKind::Momentum => None,
            })
            .unwrap_or(Sentiment::Neutral)
    }
}

fn narrative(kind: NarrativeKind, label: &str, description: String) -> Narrative {
    Narrative {
        kind,
        label: label.into(),
        description,
    }
}

/// Analyze a market snapshot
pub fn analyze_market(assets: &[AssetRecord]) -> MarketReport {
    if assets.is_empty() {
        return MarketReport::insufficient();
    }

    let total = assets.len();
    let count = Decimal::from(total);
    let avg_change = assets.iter().map(|a| a.change_24h).sum::<Decimal>() / count;
    let avg_volume = assets.iter().map(AssetRecord::volume_or_zero).sum::<Decimal>() / count;

    let gainers = assets.iter().filter(|a| a.change_24h > Decimal::ZERO).count();
    let losers = assets.iter().filter(|a| a.change_24h < Decimal::ZERO).count();
    let strong_gainers = assets.iter().filter(|a| a.change_24h > dec!(5)).count();
    let strong_losers = assets.iter().filter(|a| a.change_24h < dec!(-5)).count();

    let bullish_breadth = Decimal::from(gainers) / count * dec!(100);
    let bearish_breadth = Decimal::from(losers) / count * dec!(100);

    let mut narratives = Vec::new();
    let mut risks = Vec::new();
    let mut confidence = BASE_CONFIDENCE;

    if bullish_breadth > dec!(70) {
        narratives.push(narrative(
            NarrativeKind::Bullish,
            "Broad-based rally",
            format!(
                "{}% of tracked assets are positive — strong risk-on sentiment.",
                round_half_up(bullish_breadth, 0)
            ),
        ));
        confidence += 15;
    } else if bullish_breadth > dec!(50) {
        narratives.push(narrative(
            NarrativeKind::Neutral,
            "Mixed momentum",
            format!(
                "Moderate bullish tilt with {}% gainers, but conviction is uneven.",
                round_half_up(bullish_breadth, 0)
            ),
        ));
        confidence += 5;
    } else if bearish_breadth > dec!(60) {
        narratives.push(narrative(
            NarrativeKind::Bearish,
            "Risk-off rotation",
            format!(
                "{}% of assets are declining — defensive positioning.",
                round_half_up(bearish_breadth, 0)
            ),
        ));
        confidence += 10;
    }

    let high_volume = assets
        .iter()
        .filter(|a| a.volume_or_zero() > avg_volume * dec!(1.5))
        .count();
    if Decimal::from(high_volume) > count * dec!(0.4) {
        narratives.push(narrative(
            NarrativeKind::Volume,
            "Elevated activity",
            format!(
                "{high_volume} assets show above-average volume — institutional or retail interest rising."
            ),
        ));
        confidence += 10;
    }

    if strong_gainers > 0 && strong_losers == 0 {
        narratives.push(narrative(
            NarrativeKind::Momentum,
            "Upside breakout",
            format!("{strong_gainers} strong gainers without offsetting losers — potential continuation."),
        ));
        confidence += 8;
    } else if strong_losers > strong_gainers * 2 {
        narratives.push(narrative(
            NarrativeKind::Momentum,
            "Downside pressure",
            "Heavy losses outnumber gains 2:1 — capitulation or distribution phase likely.".into(),
        ));
        confidence += 8;
    }

    for coin in assets {
        if coin.change_24h > dec!(20) && coin.volume_or_zero() < avg_volume * dec!(0.5) {
            risks.push(RiskFlag {
                kind: RiskKind::LiquidityTrap,
                severity: Severity::High,
                coin: coin.name.clone(),
                description: format!(
                    "{} surged {}% on weak volume — potential pump or low liquidity trap.",
                    coin.name,
                    fixed(coin.change_24h, 1)
                ),
            });
            confidence -= 5;
        }
    }

    for coin in assets {
        if coin.change_24h < dec!(-15) && coin.volume_or_zero() > avg_volume * dec!(2) {
            risks.push(RiskFlag {
                kind: RiskKind::FlashCrash,
                severity: Severity::Medium,
                coin: coin.name.clone(),
                description: format!(
                    "{} dropped {}% on heavy volume — forced liquidations or panic selling.",
                    coin.name,
                    fixed(coin.change_24h.abs(), 1)
                ),
            });
            confidence -= 3;
        }
    }

    let stagnant = assets
        .iter()
        .filter(|a| a.volatility() < Decimal::ONE && a.volume_or_zero() < avg_volume * dec!(0.7))
        .count();
    if Decimal::from(stagnant) > count * dec!(0.5) {
        risks.push(RiskFlag {
            kind: RiskKind::Stagnation,
            severity: Severity::Low,
            coin: "Multiple".into(),
            description: format!(
                "{stagnant} assets show minimal movement and low volume — market indecision or accumulation."
            ),
        });
    }

    let confidence_score = confidence.clamp(0, 100).to_u8().unwrap_or(0);

    let mut summary = if avg_change > dec!(3) {
        format!("Market shows strong bullish momentum (+{}% avg). ", fixed(avg_change, 2))
    } else if avg_change > Decimal::ZERO {
        format!("Market trends mildly positive (+{}% avg). ", fixed(avg_change, 2))
    } else if avg_change > dec!(-3) {
        format!(
            "Market edges lower ({}% avg) with caution prevailing. ",
            fixed(avg_change, 2)
        )
    } else {
        format!("Market faces heavy selling pressure ({}% avg). ", fixed(avg_change, 2))
    };

    match narratives.first() {
        Some(n) => summary.push_str(&n.description),
        None => summary.push_str("Awaiting clearer directional signals."),
    }

    if !risks.is_empty() {
        let s = if risks.len() > 1 { "s" } else { "" };
        summary.push_str(&format!(" Monitor {} risk flag{s}.", risks.len()));
    }

    tracing::debug!(
        coins = total,
        confidence = confidence_score,
        narratives = narratives.len(),
        risks = risks.len(),
        "market analyzed"
    );

    MarketReport {
        summary,
        confidence_score,
        narratives,
        risks,
        metrics: Some(MarketMetrics {
            avg_change,
            avg_volume,
            bullish_breadth,
            bearish_breadth,
            total_coins: total,
        }),
    }
}
