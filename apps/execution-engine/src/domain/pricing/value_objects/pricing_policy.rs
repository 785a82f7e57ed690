//! Pricing policy parameters.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Parameters the pricing calculator reads from execution config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Offset above the bid for buys (dollars).
    pub bid_anchor_offset: Decimal,
    /// Offset below the ask for sells (dollars).
    pub ask_anchor_offset: Decimal,
    /// Whether repeg prices may cross the opposite touch.
    pub allow_cross_spread_repeg: bool,
    /// Two prices within this percentage of each other count as the same attempt.
    pub repeg_threshold_percent: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            bid_anchor_offset: dec!(0.01),
            ask_anchor_offset: dec!(0.01),
            allow_cross_spread_repeg: false,
            repeg_threshold_percent: dec!(0.10),
        }
    }
}
