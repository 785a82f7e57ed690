//! Diagnostics attached to a computed price.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Liquidity score reported when no depth data is available.
pub const FALLBACK_LIQUIDITY_SCORE: Decimal = dec!(0.5);

/// Confidence reported when no depth data is available.
pub const FALLBACK_CONFIDENCE: Decimal = dec!(0.7);

/// Which pricing path produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMethod {
    /// Liquidity analyzer recommendation from a depth-providing quote.
    LiquidityAware,
    /// Inside-spread anchor from a REST snapshot.
    InsideSpreadFallback,
    /// Re-peg toward the opposite touch.
    Repeg,
    /// Extended-hours touch price.
    ExtendedHours,
}

impl PricingMethod {
    /// Short tag used in execution-strategy strings.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::LiquidityAware => "liquidity_aware",
            Self::InsideSpreadFallback => "inside_spread",
            Self::Repeg => "repeg",
            Self::ExtendedHours => "extended_hours",
        }
    }
}

/// Metadata describing how a price was derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceMetadata {
    /// Pricing path.
    pub method: PricingMethod,
    /// Liquidity score in [0, 1].
    pub liquidity_score: Decimal,
    /// Volume imbalance in [-1, 1] (positive means more bid size).
    pub volume_imbalance: Decimal,
    /// Confidence in the recommendation, in [0, 1].
    pub confidence: Decimal,
    /// Whether the quote came from the REST fallback path.
    pub used_fallback: bool,
    /// Bid at pricing time.
    pub bid: Decimal,
    /// Ask at pricing time.
    pub ask: Decimal,
    /// Spread as a percentage of mid.
    pub spread_percent: Option<Decimal>,
    /// Volume available at the recommended price.
    pub volume_available: Option<Decimal>,
    /// Order size divided by available volume.
    pub volume_ratio: Option<Decimal>,
}

impl PriceMetadata {
    /// Metadata for the inside-spread fallback (no depth data).
    #[must_use]
    pub fn inside_spread_fallback(bid: Decimal, ask: Decimal) -> Self {
        Self {
            method: PricingMethod::InsideSpreadFallback,
            liquidity_score: FALLBACK_LIQUIDITY_SCORE,
            volume_imbalance: Decimal::ZERO,
            confidence: FALLBACK_CONFIDENCE,
            used_fallback: true,
            bid,
            ask,
            spread_percent: spread_percent(bid, ask),
            volume_available: None,
            volume_ratio: None,
        }
    }

    /// Metadata for prices derived from the touch without liquidity analysis
    /// (repegs and extended-hours orders).
    #[must_use]
    pub fn from_touch(method: PricingMethod, bid: Decimal, ask: Decimal, used_fallback: bool) -> Self {
        Self {
            method,
            used_fallback,
            ..Self::inside_spread_fallback(bid, ask)
        }
    }
}

pub(crate) fn spread_percent(bid: Decimal, ask: Decimal) -> Option<Decimal> {
    let mid = (bid + ask) / Decimal::TWO;
    if mid <= Decimal::ZERO {
        return None;
    }
    Some(((ask - bid) / mid * Decimal::ONE_HUNDRED).round_dp(4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_metadata_is_fixed() {
        let meta = PriceMetadata::inside_spread_fallback(dec!(150.25), dec!(150.35));
        assert!(meta.used_fallback);
        assert_eq!(meta.liquidity_score, dec!(0.5));
        assert_eq!(meta.confidence, dec!(0.7));
        assert_eq!(meta.method, PricingMethod::InsideSpreadFallback);
        assert!(meta.spread_percent.is_some());
    }

    #[test]
    fn method_tags() {
        assert_eq!(PricingMethod::LiquidityAware.tag(), "liquidity_aware");
        assert_eq!(PricingMethod::InsideSpreadFallback.tag(), "inside_spread");
    }

    #[test]
    fn spread_percent_handles_zero_mid() {
        assert!(spread_percent(Decimal::ZERO, Decimal::ZERO).is_none());
    }
}
