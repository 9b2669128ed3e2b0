//! Filter/Sort Executor
//!
//! Applies a [`FilterSpec`] to a market snapshot. Pure: the input slice is
//! never touched and the same filters always yield the same output.

use std::cmp::Ordering;
use std::num::NonZeroUsize;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::AssetRecord;

/// Minimum 24h gain for a liquidity-trap candidate
pub const TRAP_MIN_CHANGE: Decimal = dec!(20);

/// Fraction of the filtered population's mean volume a trap must stay under
pub const TRAP_VOLUME_RATIO: Decimal = dec!(0.5);

/// Numeric field a result set can be sorted by
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    #[serde(rename = "price")]
    Price,
    #[serde(rename = "change24h")]
    Change24h,
    #[serde(rename = "volume")]
    Volume,
}

impl SortField {
    fn value(self, asset: &AssetRecord) -> Decimal {
        match self {
            Self::Price => asset.price,
            Self::Change24h => asset.change_24h,
            Self::Volume => asset.volume_or_zero(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Constraints derived from a query. Every field is optional and an unset
/// bound means "no constraint" (distinct from a bound of zero).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_change: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_change: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_volatility: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_volatility: Option<Decimal>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub only_majors: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub only_alts: bool,
    /// Keep only big movers trading well under the filtered set's mean volume
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub low_volume_relative: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortField>,
    pub sort_order: SortOrder,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<NonZeroUsize>,
}

impl FilterSpec {
    pub fn sorted(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = Some(field);
        self.sort_order = order;
        self
    }

    /// True when no field constrains, reorders or truncates anything
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn within(value: Decimal, min: Option<Decimal>, max: Option<Decimal>) -> bool {
    min.is_none_or(|lo| value >= lo) && max.is_none_or(|hi| value <= hi)
}

/// Filter, sort and truncate a snapshot.
///
/// Stages run in a fixed order: volatility, change, price, majors/alts,
/// relative volume, sort, limit. The relative-volume stage measures the
/// population left by the earlier stages, so reordering them changes results.
pub fn apply(assets: &[AssetRecord], filters: &FilterSpec) -> Vec<AssetRecord> {
    let mut filtered: Vec<AssetRecord> = assets
        .iter()
        .filter(|a| within(a.volatility(), filters.min_volatility, filters.max_volatility))
        .filter(|a| within(a.change_24h, filters.min_change, filters.max_change))
        .filter(|a| within(a.price, filters.min_price, filters.max_price))
        .filter(|a| !filters.only_majors || a.is_major())
        .filter(|a| !filters.only_alts || !a.is_major())
        .cloned()
        .collect();

    if filters.low_volume_relative {
        let total: Decimal = filtered.iter().map(AssetRecord::volume_or_zero).sum();
        let mean = total / Decimal::from(filtered.len().max(1));
        let ceiling = mean * TRAP_VOLUME_RATIO;
        filtered.retain(|a| a.change_24h > TRAP_MIN_CHANGE && a.volume_or_zero() < ceiling);
    }

    if let Some(field) = filters.sort_by {
        // Vec::sort_by is stable, ties keep their snapshot order
        filtered.sort_by(|a, b| {
            let ord: Ordering = field.value(a).cmp(&field.value(b));
            match filters.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }

    if let Some(limit) = filters.limit {
        filtered.truncate(limit.get());
    }

    filtered
}
