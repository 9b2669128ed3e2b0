//! Intent Classifier
//!
//! Maps free text to an [`Intent`] and a [`FilterSpec`] using an ordered
//! table of keyword detectors. Patterns are compiled once per process.

use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::filter::{FilterSpec, SortField, SortOrder, TRAP_MIN_CHANGE};

macro_rules! re {
    ($pat:expr) => {
        LazyLock::new(|| Regex::new($pat).unwrap())
    };
}

static RE_CHEAPEST: LazyLock<Regex> = re!(r"\b(?:cheap|cheapest|low price|affordable|budget)\b");
static RE_BARE_UNDER: LazyLock<Regex> = re!(r"\bunder\b");
static RE_GAINERS: LazyLock<Regex> = re!(r"\b(?:gain|gainer|gainers|winner|winners|up|rising|pumping|moon)\b");
static RE_LOSERS: LazyLock<Regex> = re!(r"\b(?:los(?:s|ing|ers?)|down|falling|dump|crash|red)\b");
static RE_RISKY: LazyLock<Regex> = re!(r"\b(?:risk|risky|volatile|volatility|danger|unstable|high risk)\b");
static RE_TOP: LazyLock<Regex> = re!(r"\b(?:top|best|highest|leading)\b");
static RE_STABLE: LazyLock<Regex> = re!(r"\b(?:stable|stablecoin|safe|low volatility|quiet|range[- ]?bound)\b");
static RE_VOLUME: LazyLock<Regex> = re!(r"\b(?:volume|liquid|liquidity|traded|high volume|low volume)\b");
static RE_RECENT: LazyLock<Regex> = re!(r"\b(?:recent|new|latest|today)\b");
static RE_MOMENTUM: LazyLock<Regex> = re!(r"\b(?:momentum|trending|breakout|spike|spiking|pump|dump)\b");
static RE_MAJORS: LazyLock<Regex> = re!(r"\b(?:majors?|blue\s*chips?|btc|bitcoin|eth|ethereum|bnb)\b");
static RE_ALTS: LazyLock<Regex> = re!(r"\b(?:alts?|altcoins?)\b");
static RE_PENNY: LazyLock<Regex> = re!(r"\b(?:penny|micro|under\s*\$?1|<\s*\$?1)\b");
static RE_LIQUIDITY_TRAP: LazyLock<Regex> = re!(r"\b(?:liquidity\s*trap|low\s*liquidity)\b");

static RE_THRESHOLD: LazyLock<Regex> =
    re!(r"\b(under|below|less than|over|above|greater than)\s*\$?(\d+(?:\.\d+)?)");
static RE_TOP_N: LazyLock<Regex> = re!(r"\btop\s*(\d{1,3})\b");

/// What a free-text query is asking for; selects the response template
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    #[default]
    General,
    Risky,
    Momentum,
    Gainers,
    Losers,
    Cheapest,
    Top,
    Stable,
    Volume,
    PriceUnder,
    PriceOver,
    Penny,
    Majors,
    Alts,
    LiquidityTrap,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Risky => "risky",
            Self::Momentum => "momentum",
            Self::Gainers => "gainers",
            Self::Losers => "losers",
            Self::Cheapest => "cheapest",
            Self::Top => "top",
            Self::Stable => "stable",
            Self::Volume => "volume",
            Self::PriceUnder => "price-under",
            Self::PriceOver => "price-over",
            Self::Penny => "penny",
            Self::Majors => "majors",
            Self::Alts => "alts",
            Self::LiquidityTrap => "liquidity-trap",
        }
    }

    /// Filters implied by a primary intent before any modifiers apply
    fn seed_filters(self) -> FilterSpec {
        let base = FilterSpec::default();
        match self {
            Self::Risky => FilterSpec {
                min_volatility: Some(dec!(10)),
                ..base
            },
            Self::Momentum => FilterSpec {
                min_volatility: Some(dec!(5)),
                ..base
            }
            .sorted(SortField::Change24h, SortOrder::Desc),
            Self::Gainers => FilterSpec {
                min_change: Some(Decimal::ZERO),
                ..base
            }
            .sorted(SortField::Change24h, SortOrder::Desc),
            Self::Losers => FilterSpec {
                max_change: Some(Decimal::ZERO),
                ..base
            }
            .sorted(SortField::Change24h, SortOrder::Asc),
            Self::Cheapest => base.sorted(SortField::Price, SortOrder::Asc),
            Self::Top | Self::Volume => base.sorted(SortField::Volume, SortOrder::Desc),
            Self::Stable => FilterSpec {
                max_volatility: Some(dec!(3)),
                ..base
            },
            _ => base,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named keyword detectors, in evaluation order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Detector {
    Cheapest,
    Gainers,
    Losers,
    Risky,
    Top,
    Stable,
    Volume,
    Recent,
    Momentum,
    Majors,
    Alts,
    Penny,
    LiquidityTrap,
}

impl Detector {
    pub const ALL: [Self; 13] = [
        Self::Cheapest,
        Self::Gainers,
        Self::Losers,
        Self::Risky,
        Self::Top,
        Self::Stable,
        Self::Volume,
        Self::Recent,
        Self::Momentum,
        Self::Majors,
        Self::Alts,
        Self::Penny,
        Self::LiquidityTrap,
    ];

    fn pattern(self) -> &'static LazyLock<Regex> {
        match self {
            Self::Cheapest => &RE_CHEAPEST,
            Self::Gainers => &RE_GAINERS,
            Self::Losers => &RE_LOSERS,
            Self::Risky => &RE_RISKY,
            Self::Top => &RE_TOP,
            Self::Stable => &RE_STABLE,
            Self::Volume => &RE_VOLUME,
            Self::Recent => &RE_RECENT,
            Self::Momentum => &RE_MOMENTUM,
            Self::Majors => &RE_MAJORS,
            Self::Alts => &RE_ALTS,
            Self::Penny => &RE_PENNY,
            Self::LiquidityTrap => &RE_LIQUIDITY_TRAP,
        }
    }
}

/// Primary-intent resolution order. Earlier entries win when several
/// detectors fire, so "risky gainers" is risky.
const PRIORITY: [(Detector, Intent); 8] = [
    (Detector::Risky, Intent::Risky),
    (Detector::Momentum, Intent::Momentum),
    (Detector::Gainers, Intent::Gainers),
    (Detector::Losers, Intent::Losers),
    (Detector::Cheapest, Intent::Cheapest),
    (Detector::Top, Intent::Top),
    (Detector::Stable, Intent::Stable),
    (Detector::Volume, Intent::Volume),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bound {
    Under,
    Over,
}

#[derive(Clone, Copy, Debug)]
struct PriceThreshold {
    bound: Bound,
    value: Decimal,
}

fn price_threshold(lower: &str) -> Option<PriceThreshold> {
    let caps = RE_THRESHOLD.captures(lower)?;
    let bound = match caps.get(1)?.as_str() {
        "under" | "below" | "less than" => Bound::Under,
        _ => Bound::Over,
    };
    // The capture is all digits, so a parse failure means it is too large to represent
    let value = Decimal::from_str(caps.get(2)?.as_str()).unwrap_or(Decimal::MAX);
    Some(PriceThreshold { bound, value })
}

fn top_n(lower: &str) -> Option<NonZeroUsize> {
    let caps = RE_TOP_N.captures(lower)?;
    caps.get(1)?.as_str().parse::<usize>().ok().and_then(NonZeroUsize::new)
}

/// Classifier output
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    pub filters: FilterSpec,
    /// Every detector that fired, in evaluation order
    pub detected: Vec<Detector>,
}

impl Classification {
    pub fn has_detected(&self, detector: Detector) -> bool {
        self.detected.contains(&detector)
    }
}

/// Classify a free-text query. Never fails; unmatched text is `General`
/// with no filters.
pub fn classify(text: &str) -> Classification {
    let lower = text.to_lowercase();
    let threshold = price_threshold(&lower);

    let detected: Vec<Detector> = Detector::ALL
        .into_iter()
        .filter(|d| {
            d.pattern().is_match(&lower)
                // a bare "under" reads as "cheap", but "under $5" is a price bound
                || (*d == Detector::Cheapest && threshold.is_none() && RE_BARE_UNDER.is_match(&lower))
        })
        .collect();
    let fired = |d: Detector| detected.contains(&d);

    let mut intent = PRIORITY
        .iter()
        .find(|(d, _)| fired(*d))
        .map_or(Intent::General, |(_, intent)| *intent);
    let mut filters = intent.seed_filters();

    if let Some(PriceThreshold { bound, value }) = threshold {
        match bound {
            Bound::Under => {
                filters.max_price = Some(value);
                if intent == Intent::General {
                    intent = Intent::PriceUnder;
                }
            }
            Bound::Over => {
                filters.min_price = Some(value);
                if intent == Intent::General {
                    intent = Intent::PriceOver;
                }
            }
        }
    }

    if fired(Detector::Penny) {
        filters.max_price = Some(filters.max_price.map_or(Decimal::ONE, |p| p.min(Decimal::ONE)));
        if intent == Intent::General {
            intent = Intent::Penny;
        }
    }

    // Overrides whatever label the earlier steps picked
    if fired(Detector::LiquidityTrap) {
        intent = Intent::LiquidityTrap;
        filters.min_change = Some(filters.min_change.map_or(TRAP_MIN_CHANGE, |c| c.max(TRAP_MIN_CHANGE)));
        filters.low_volume_relative = true;
    }

    if fired(Detector::Majors) {
        filters.only_majors = true;
        if intent == Intent::General {
            intent = Intent::Majors;
        }
    }
    if fired(Detector::Alts) {
        filters.only_alts = true;
        if intent == Intent::General {
            intent = Intent::Alts;
        }
    }

    if let Some(limit) = top_n(&lower) {
        filters.limit = Some(limit);
    }

    tracing::debug!(query = %text, intent = %intent, detectors = detected.len(), "classified query");

    Classification {
        intent,
        filters,
        detected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_is_general() {
        let c = classify("");
        assert_eq!(c.intent, Intent::General);
        assert!(c.filters.is_empty());
        assert!(c.detected.is_empty());
    }

    #[test]
    fn test_risky() {
        let c = classify("show me risky coins");
        assert_eq!(c.intent, Intent::Risky);
        assert_eq!(c.filters.min_volatility, Some(dec!(10)));
    }

    #[test]
    fn test_gainers_beat_cheapest() {
        let c = classify("cheapest gainers");
        assert!(c.has_detected(Detector::Cheapest));
        assert!(c.has_detected(Detector::Gainers));
        assert_eq!(c.intent, Intent::Gainers);

        let expected = FilterSpec {
            min_change: Some(Decimal::ZERO),
            ..FilterSpec::default()
        }
        .sorted(SortField::Change24h, SortOrder::Desc);
        assert_eq!(c.filters, expected);
    }

    #[test]
    fn test_risky_beats_gainers() {
        let c = classify("risky gainers");
        assert_eq!(c.intent, Intent::Risky);
        assert_eq!(c.filters.min_change, None);
    }

    #[test]
    fn test_price_under() {
        let c = classify("under $1 coins");
        assert_eq!(c.intent, Intent::PriceUnder);
        assert_eq!(c.filters.max_price, Some(dec!(1)));
        assert!(!c.has_detected(Detector::Cheapest));
    }

    #[test]
    fn test_price_over_with_decimal() {
        let c = classify("coins above $2.5");
        assert_eq!(c.intent, Intent::PriceOver);
        assert_eq!(c.filters.min_price, Some(dec!(2.5)));
    }

    #[test]
    fn test_bare_under_reads_as_cheap() {
        let c = classify("something under the radar");
        assert_eq!(c.intent, Intent::Cheapest);
        assert_eq!(c.filters.sort_by, Some(SortField::Price));
    }

    #[test]
    fn test_threshold_keeps_primary_intent() {
        let c = classify("gainers under $50");
        assert_eq!(c.intent, Intent::Gainers);
        assert_eq!(c.filters.max_price, Some(dec!(50)));
        assert_eq!(c.filters.min_change, Some(Decimal::ZERO));
    }

    #[test]
    fn test_penny_clamps_explicit_bound() {
        let c = classify("penny coins less than $5");
        assert_eq!(c.intent, Intent::PriceUnder);
        assert_eq!(c.filters.max_price, Some(Decimal::ONE));

        let c = classify("micro caps");
        assert_eq!(c.intent, Intent::Penny);
        assert_eq!(c.filters.max_price, Some(Decimal::ONE));

        let c = classify("penny coins below $0.5");
        assert_eq!(c.filters.max_price, Some(dec!(0.5)));
    }

    #[test]
    fn test_liquidity_trap_overrides() {
        let c = classify("gainers that look like a liquidity trap");
        assert_eq!(c.intent, Intent::LiquidityTrap);
        assert_eq!(c.filters.min_change, Some(dec!(20)));
        assert!(c.filters.low_volume_relative);
        // gainers seeded the sort and it survives the override
        assert_eq!(c.filters.sort_by, Some(SortField::Change24h));
    }

    #[test]
    fn test_majors_and_alts() {
        let c = classify("show btc and eth");
        assert_eq!(c.intent, Intent::Majors);
        assert!(c.filters.only_majors);

        let c = classify("altcoins please");
        assert_eq!(c.intent, Intent::Alts);
        assert!(c.filters.only_alts);

        let c = classify("losing altcoins");
        assert_eq!(c.intent, Intent::Losers);
        assert!(c.filters.only_alts);
    }

    #[test]
    fn test_top_n_sets_limit() {
        let c = classify("top 5 by volume");
        assert_eq!(c.intent, Intent::Top);
        assert_eq!(c.filters.limit, NonZeroUsize::new(5));
        assert_eq!(c.filters.sort_by, Some(SortField::Volume));

        let c = classify("risky top 3");
        assert_eq!(c.intent, Intent::Risky);
        assert_eq!(c.filters.limit, NonZeroUsize::new(3));

        let c = classify("top 0");
        assert_eq!(c.filters.limit, None);
    }

    #[test]
    fn test_volume_intent() {
        let c = classify("most traded");
        assert_eq!(c.intent, Intent::Volume);
        assert_eq!(c.filters.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_oversized_threshold_saturates() {
        let c = classify("coins under 99999999999999999999999999999999999");
        assert_eq!(c.intent, Intent::PriceUnder);
        assert_eq!(c.filters.max_price, Some(Decimal::MAX));
        assert!(!c.has_detected(Detector::Cheapest));

        let c = classify("above 123456789012345678901234567890");
        assert_eq!(c.intent, Intent::PriceOver);
        assert_eq!(c.filters.min_price, Some(Decimal::MAX));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("SHOW ME VOLATILE STUFF").intent, Intent::Risky);
        assert_eq!(classify("Stable picks").intent, Intent::Stable);
    }
}
