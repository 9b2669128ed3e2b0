//! Response Formatter
//!
//! Turns an intent and a result count into the one-line message shown
//! next to the filtered list.

use super::classifier::Intent;

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// Human-readable summary of a query result. Intents without a template
/// (including `General`) report the total count.
pub fn format_response(intent: Intent, count: usize) -> String {
    let s = plural(count);
    match intent {
        Intent::Risky => format!("Found {count} high-volatility asset{s} with >10% movement."),
        Intent::Momentum => format!("Detected {count} momentum play{s} with strong moves."),
        Intent::Gainers => format!("Showing {count} gainer{s} sorted by performance."),
        Intent::Losers => format!("Found {count} declining asset{s}."),
        Intent::Cheapest => format!("Showing {count} asset{s} sorted by lowest price."),
        Intent::Top => format!("Displaying top {count} by volume."),
        Intent::Stable => format!("Found {count} stable asset{s} with <3% volatility."),
        Intent::PriceUnder => format!("Found {count} asset{s} under your price target."),
        Intent::PriceOver => format!("Found {count} asset{s} above your price floor."),
        Intent::Penny => format!("Showing {count} sub-$1 assets (penny/micro)."),
        Intent::Majors => "Showing major assets only (BTC/ETH/BNB).".to_string(),
        Intent::Alts => "Showing altcoins excluding majors.".to_string(),
        Intent::LiquidityTrap => format!("Flagged {count} potential liquidity trap{s}."),
        Intent::General | Intent::Volume => format!("Showing all {count} assets."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralization() {
        assert_eq!(
            format_response(Intent::Risky, 1),
            "Found 1 high-volatility asset with >10% movement."
        );
        assert_eq!(
            format_response(Intent::Risky, 0),
            "Found 0 high-volatility assets with >10% movement."
        );
        assert_eq!(
            format_response(Intent::LiquidityTrap, 2),
            "Flagged 2 potential liquidity traps."
        );
    }

    #[test]
    fn test_default_message() {
        assert_eq!(format_response(Intent::General, 5), "Showing all 5 assets.");
        assert_eq!(format_response(Intent::Volume, 3), "Showing all 3 assets.");
    }

    #[test]
    fn test_fixed_messages() {
        assert_eq!(
            format_response(Intent::Majors, 3),
            "Showing major assets only (BTC/ETH/BNB)."
        );
        assert_eq!(format_response(Intent::Top, 10), "Displaying top 10 by volume.");
    }
}
