//! Pricing Calculator Domain Service
//!
//! Pure functions turning a quote into a limit price: the initial anchor
//! (liquidity-aware or inside-spread fallback) and progressively more
//! aggressive repeg prices.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::liquidity_analyzer::LiquidityAnalyzer;
use crate::domain::order_execution::OrderSide;
use crate::domain::pricing::errors::PricingError;
use crate::domain::pricing::value_objects::{
    PriceMetadata, PricingMethod, PricingPolicy, Quote, spread_percent,
};
use crate::domain::shared::money::CENT;
use crate::domain::shared::{MIN_PRICE, quantize_price};

/// Fraction of the distance to the opposite touch covered by each repeg.
const REPEG_STEP: Decimal = dec!(0.5);

/// A limit price together with how it was derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRecommendation {
    /// Limit price.
    pub price: Decimal,
    /// Derivation diagnostics.
    pub metadata: PriceMetadata,
}

/// Side-effect-free price computations.
#[derive(Debug, Clone, Default)]
pub struct PricingCalculator {
    policy: PricingPolicy,
}

impl PricingCalculator {
    /// Create a calculator for the given policy.
    #[must_use]
    pub const fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    /// Get the pricing policy.
    #[must_use]
    pub const fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Inside-spread price for a quote without depth data.
    ///
    /// Buys anchor at bid + offset, capped at min(mid, ask - offset); sells
    /// mirror this from the ask. The price is floored at $0.01 and quantized
    /// to cents.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::InvalidQuote` if either side is non-positive or
    /// the quote is crossed.
    pub fn simple_inside_spread_price(
        &self,
        quote: &Quote,
        side: OrderSide,
    ) -> Result<PriceRecommendation, PricingError> {
        validate_quote(quote)?;

        let mid = quote.mid();
        let raw = match side {
            OrderSide::Buy => {
                let anchor = quote.bid + self.policy.bid_anchor_offset;
                let cap = mid.min(quote.ask - self.policy.ask_anchor_offset);
                anchor.min(cap).max(quote.bid)
            }
            OrderSide::Sell => {
                let anchor = quote.ask - self.policy.ask_anchor_offset;
                let floor = mid.max(quote.bid + self.policy.bid_anchor_offset);
                anchor.max(floor).min(quote.ask)
            }
        };

        Ok(PriceRecommendation {
            price: quantize_price(raw),
            metadata: PriceMetadata::inside_spread_fallback(quote.bid, quote.ask),
        })
    }

    /// Price recommended by the liquidity analyzer for a depth-providing quote.
    ///
    /// The analyzer's recommendation is returned as-is; the metadata adds the
    /// ratio of order size to the volume available at that price.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::InvalidQuote` for an unusable quote and
    /// `PricingError::NonPositivePrice` if the recommendation is not positive.
    pub fn liquidity_aware_price(
        &self,
        quote: &Quote,
        side: OrderSide,
        order_size: Decimal,
        analyzer: &dyn LiquidityAnalyzer,
    ) -> Result<PriceRecommendation, PricingError> {
        validate_quote(quote)?;

        let analysis = analyzer.analyze(quote, order_size);
        let (price, volume_available) = match side {
            OrderSide::Buy => (analysis.recommended_bid_price, analysis.volume_at_ask),
            OrderSide::Sell => (analysis.recommended_ask_price, analysis.volume_at_bid),
        };

        if price <= Decimal::ZERO {
            return Err(PricingError::NonPositivePrice { price });
        }

        let volume_ratio =
            (volume_available > Decimal::ZERO).then(|| (order_size / volume_available).round_dp(4));

        Ok(PriceRecommendation {
            price,
            metadata: PriceMetadata {
                method: PricingMethod::LiquidityAware,
                liquidity_score: analysis.liquidity_score,
                volume_imbalance: analysis.volume_imbalance,
                confidence: analysis.confidence,
                used_fallback: false,
                bid: quote.bid,
                ask: quote.ask,
                spread_percent: spread_percent(quote.bid, quote.ask),
                volume_available: Some(volume_available),
                volume_ratio,
            },
        })
    }

    /// More aggressive price for a resting order that did not fill.
    ///
    /// Moves half the distance from `original_price` toward the opposite touch
    /// (ask for buys, bid for sells). Without an original price the order is
    /// anchored at the opposite touch less the configured offset. Unless the
    /// policy allows crossing, the result never passes the touch.
    ///
    /// Invalid inputs (non-positive bid, ask or original price) degrade to
    /// [`MIN_PRICE`] so the repeg loop keeps moving. Returns `None` only when
    /// the arithmetic itself fails.
    #[must_use]
    pub fn repeg_price(
        &self,
        quote: &Quote,
        side: OrderSide,
        original_price: Option<Decimal>,
    ) -> Option<Decimal> {
        if quote.bid <= Decimal::ZERO
            || quote.ask <= Decimal::ZERO
            || original_price.is_some_and(|p| p <= Decimal::ZERO)
        {
            tracing::warn!(
                symbol = %quote.symbol,
                bid = %quote.bid,
                ask = %quote.ask,
                original_price = ?original_price,
                "Invalid repeg inputs, degrading to minimum price"
            );
            return Some(MIN_PRICE);
        }

        let raw = match (side, original_price) {
            (OrderSide::Buy, None) => quote.ask.checked_sub(self.policy.ask_anchor_offset)?,
            (OrderSide::Sell, None) => quote.bid.checked_add(self.policy.bid_anchor_offset)?,
            (OrderSide::Buy, Some(original)) => {
                let step = quote.ask.checked_sub(original)?.checked_mul(REPEG_STEP)?;
                let moved = original.checked_add(step)?;
                if self.policy.allow_cross_spread_repeg {
                    moved
                } else {
                    moved.min(quote.ask)
                }
            }
            (OrderSide::Sell, Some(original)) => {
                let step = original.checked_sub(quote.bid)?.checked_mul(REPEG_STEP)?;
                let moved = original.checked_sub(step)?;
                if self.policy.allow_cross_spread_repeg {
                    moved
                } else {
                    moved.max(quote.bid)
                }
            }
        };

        Some(quantize_price(raw))
    }

    /// [`Self::repeg_price`] that steps one cent further when the candidate
    /// matches a price already tried in this order chain.
    ///
    /// Avoidance is advisory: if the nudge would cross the touch (and crossing
    /// is not allowed) the original candidate is returned.
    #[must_use]
    pub fn repeg_price_avoiding(
        &self,
        quote: &Quote,
        side: OrderSide,
        original_price: Option<Decimal>,
        price_history: &[Decimal],
    ) -> Option<Decimal> {
        let candidate = self.repeg_price(quote, side, original_price)?;
        if !quote.has_valid_prices()
            || !price_history
                .iter()
                .any(|tried| self.is_same_attempt(*tried, candidate))
        {
            return Some(candidate);
        }

        let nudged = match side {
            OrderSide::Buy => {
                let next = candidate + CENT;
                if self.policy.allow_cross_spread_repeg {
                    next
                } else {
                    next.min(quote.ask)
                }
            }
            OrderSide::Sell => {
                let next = candidate - CENT;
                if self.policy.allow_cross_spread_repeg {
                    next
                } else {
                    next.max(quote.bid)
                }
            }
        };
        let nudged = quantize_price(nudged);

        if nudged != candidate {
            tracing::debug!(
                symbol = %quote.symbol,
                candidate = %candidate,
                nudged = %nudged,
                "Repeg price already tried, nudging toward touch"
            );
        }
        Some(nudged)
    }

    /// Two prices closer than the repeg threshold count as the same attempt.
    fn is_same_attempt(&self, tried: Decimal, candidate: Decimal) -> bool {
        if tried == candidate {
            return true;
        }
        if tried <= Decimal::ZERO {
            return false;
        }
        (tried - candidate).abs() / tried * Decimal::ONE_HUNDRED
            < self.policy.repeg_threshold_percent
    }
}

fn validate_quote(quote: &Quote) -> Result<(), PricingError> {
    let reason = if quote.bid <= Decimal::ZERO {
        "bid is not positive"
    } else if quote.ask <= Decimal::ZERO {
        "ask is not positive"
    } else if quote.ask < quote.bid {
        "quote is crossed"
    } else {
        return Ok(());
    };

    Err(PricingError::InvalidQuote {
        symbol: quote.symbol.to_string(),
        reason: reason.to_string(),
    })
}
