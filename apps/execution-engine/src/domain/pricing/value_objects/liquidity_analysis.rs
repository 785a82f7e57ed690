//! Liquidity analyzer output contract.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of scoring the displayed book for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityAnalysis {
    /// Recommended limit price for a buy.
    pub recommended_bid_price: Decimal,
    /// Recommended limit price for a sell.
    pub recommended_ask_price: Decimal,
    /// Shares displayed at the bid.
    pub volume_at_bid: Decimal,
    /// Shares displayed at the ask.
    pub volume_at_ask: Decimal,
    /// Liquidity score in [0, 1].
    pub liquidity_score: Decimal,
    /// Volume imbalance in [-1, 1] (positive means more bid size).
    pub volume_imbalance: Decimal,
    /// Confidence in the recommendation, in [0, 1].
    pub confidence: Decimal,
}
