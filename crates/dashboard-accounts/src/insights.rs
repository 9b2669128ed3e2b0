//! Daily Insight Card
//!
//! A narrative, a whale alert and a sentiment reading, cached for the UTC
//! day. A cache written on another day is thrown away.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, Result};
use crate::store::{KeyValueStore, StoreExt, StoreKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Moderate,
    Low,
}

impl Impact {
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High Impact",
            Self::Moderate => "Moderate Impact",
            Self::Low => "Low Impact",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Warning,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhaleAlert {
    pub message: String,
    pub impact: Impact,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentReading {
    /// 0-1
    pub score: Decimal,
    pub label: String,
}

impl SentimentReading {
    pub fn tone(&self) -> Tone {
        if self.score >= dec!(0.67) {
            Tone::Success
        } else if self.score >= dec!(0.4) {
            Tone::Warning
        } else {
            Tone::Danger
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub narrative: String,
    pub whale: WhaleAlert,
    pub sentiment: SentimentReading,
}

#[derive(Serialize, Deserialize)]
struct CachedInsight {
    date: NaiveDate,
    data: Insight,
    timestamp: DateTime<Utc>,
}

/// The card plus when it was generated
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsightSnapshot {
    #[serde(flatten)]
    pub insight: Insight,
    pub updated_at: DateTime<Utc>,
}

fn whale(message: &str, impact: Impact) -> WhaleAlert {
    WhaleAlert {
        message: message.into(),
        impact,
    }
}

fn reading(score: Decimal, label: &str) -> SentimentReading {
    SentimentReading {
        score,
        label: label.into(),
    }
}

fn opening_insight() -> Insight {
    Insight {
        narrative: "Markets opened mixed as BTC tested resistance while AI signals flagged rotation into high-cap alts. On-chain activity rose and funding rates cooled, hinting at constructive consolidation.".into(),
        whale: whale(
            "Whale moved 3,200 BTC from exchange to cold wallet — reduced sell-side pressure likely near-term.",
            Impact::Moderate,
        ),
        sentiment: reading(dec!(0.62), "Bullish"),
    }
}

const NARRATIVES: [&str; 3] = [
    "Momentum rotated into ETH and L2s as BTC ranged; dips were consistently bought and perp basis normalized across majors.",
    "Risk appetite improved after macro prints; breadth expanded with strong inflows into BTC/ETH while small/mid caps lagged.",
    "Volatility compressed intraday; breakout watch as liquidity clustered near prior highs with improving order book depth.",
];

fn whale_pool() -> [WhaleAlert; 3] {
    [
        whale("Whale moved 9,850 ETH to exchange — potential supply overhang if sustained.", Impact::High),
        whale("Whale accumulated 1,250 BTC off-exchange — accumulation trend intact.", Impact::Moderate),
        whale("Large USDT mint observed on Tron — potential dry powder for risk-on rotation.", Impact::Low),
    ]
}

fn sentiment_pool() -> [SentimentReading; 3] {
    [
        reading(dec!(0.71), "Bullish"),
        reading(dec!(0.54), "Neutral"),
        reading(dec!(0.32), "Bearish"),
    ]
}

fn random_insight() -> Result<Insight> {
    let mut rng = rand::thread_rng();
    let empty = || AccountError::Storage("insight pool is empty".into());
    Ok(Insight {
        narrative: NARRATIVES.choose(&mut rng).ok_or_else(empty)?.to_string(),
        whale: whale_pool().choose(&mut rng).cloned().ok_or_else(empty)?,
        sentiment: sentiment_pool().choose(&mut rng).cloned().ok_or_else(empty)?,
    })
}

pub struct InsightCache {
    store: Arc<dyn KeyValueStore>,
}

impl InsightCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Today's card, creating the opening card when nothing valid is cached
    pub fn current(&self) -> Result<InsightSnapshot> {
        self.current_on(Utc::now().date_naive())
    }

    fn current_on(&self, today: NaiveDate) -> Result<InsightSnapshot> {
        match self.store.load_json::<CachedInsight>(&StoreKey::Insights)? {
            Some(cached) if cached.date == today => {
                return Ok(InsightSnapshot {
                    insight: cached.data,
                    updated_at: cached.timestamp,
                });
            }
            Some(stale) => {
                tracing::debug!(date = %stale.date, "discarding stale insight cache");
                self.store.delete(&StoreKey::Insights)?;
            }
            None => {}
        }
        self.save(today, opening_insight())
    }

    /// Draw a fresh card and cache it for today
    pub fn refresh(&self) -> Result<InsightSnapshot> {
        self.save(Utc::now().date_naive(), random_insight()?)
    }

    fn save(&self, date: NaiveDate, insight: Insight) -> Result<InsightSnapshot> {
        let cached = CachedInsight {
            date,
            data: insight,
            timestamp: Utc::now(),
        };
        self.store.save_json(&StoreKey::Insights, &cached)?;
        Ok(InsightSnapshot {
            insight: cached.data,
            updated_at: cached.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn cache() -> InsightCache {
        InsightCache::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_tone_thresholds() {
        assert_eq!(reading(dec!(0.67), "x").tone(), Tone::Success);
        assert_eq!(reading(dec!(0.66), "x").tone(), Tone::Warning);
        assert_eq!(reading(dec!(0.4), "x").tone(), Tone::Warning);
        assert_eq!(reading(dec!(0.39), "x").tone(), Tone::Danger);
    }

    #[test]
    fn test_first_load_is_opening_card() {
        let snapshot = cache().current().unwrap();
        assert_eq!(snapshot.insight, opening_insight());
    }

    #[test]
    fn test_refresh_is_cached_for_the_day() {
        let cache = cache();
        let fresh = cache.refresh().unwrap();
        assert!(NARRATIVES.contains(&fresh.insight.narrative.as_str()));
        assert!(whale_pool().contains(&fresh.insight.whale));

        let again = cache.current().unwrap();
        assert_eq!(again.insight, fresh.insight);
    }

    #[test]
    fn test_other_day_is_discarded() {
        let cache = cache();
        cache.refresh().unwrap();

        let tomorrow = Utc::now().date_naive().succ_opt().unwrap();
        let snapshot = cache.current_on(tomorrow).unwrap();
        assert_eq!(snapshot.insight, opening_insight());
    }

    #[test]
    fn test_impact_labels() {
        assert_eq!(Impact::High.label(), "High Impact");
        assert_eq!(Impact::Low.label(), "Low Impact");
    }
}
