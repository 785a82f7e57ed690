//! Liquidity analysis seam and a top-of-book reference analyzer.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::pricing::value_objects::{LiquidityAnalysis, Quote};
use crate::domain::shared::money::CENT;
use crate::domain::shared::quantize_price;

/// Scores order-book depth for one order and recommends limit prices.
pub trait LiquidityAnalyzer: Send + Sync {
    /// Analyze the displayed book for an order of `order_size` shares.
    fn analyze(&self, quote: &Quote, order_size: Decimal) -> LiquidityAnalysis;
}

/// Imbalance beyond which the book is considered to lean to one side.
const IMBALANCE_THRESHOLD: Decimal = dec!(0.3);

/// Displayed size (as a multiple of order size) that earns a full score.
const FULL_DEPTH_MULTIPLE: Decimal = dec!(5);

/// Reference analyzer working from top-of-book sizes only.
///
/// Rests at the near touch, stepping one cent inside when the spread is at
/// least two cents and the book leans against the order (bid-heavy for
/// buys, ask-heavy for sells).
#[derive(Debug, Clone, Copy, Default)]
pub struct TopOfBookAnalyzer;

impl LiquidityAnalyzer for TopOfBookAnalyzer {
    fn analyze(&self, quote: &Quote, order_size: Decimal) -> LiquidityAnalysis {
        let total = quote.bid_size + quote.ask_size;
        let volume_imbalance = if total > Decimal::ZERO {
            ((quote.bid_size - quote.ask_size) / total).round_dp(4)
        } else {
            Decimal::ZERO
        };

        let displayed = quote.bid_size.min(quote.ask_size);
        let liquidity_score = if order_size <= Decimal::ZERO {
            Decimal::ONE
        } else {
            (displayed / (order_size * FULL_DEPTH_MULTIPLE))
                .min(Decimal::ONE)
                .max(Decimal::ZERO)
                .round_dp(4)
        };
        let confidence = (dec!(0.5) + liquidity_score / Decimal::TWO).min(Decimal::ONE);

        let room_inside = quote.spread() >= CENT * Decimal::TWO;
        let recommended_bid_price = if room_inside && volume_imbalance > IMBALANCE_THRESHOLD {
            quantize_price(quote.bid + CENT)
        } else {
            quantize_price(quote.bid)
        };
        let recommended_ask_price = if room_inside && volume_imbalance < -IMBALANCE_THRESHOLD {
            quantize_price(quote.ask - CENT)
        } else {
            quantize_price(quote.ask)
        };

        LiquidityAnalysis {
            recommended_bid_price,
            recommended_ask_price,
            volume_at_bid: quote.bid_size,
            volume_at_ask: quote.ask_size,
            liquidity_score,
            volume_imbalance,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::Symbol;

    fn quote(bid_size: Decimal, ask_size: Decimal) -> Quote {
        Quote::new(Symbol::new("SPY"), dec!(400.00), dec!(400.05), bid_size, ask_size)
    }

    #[test]
    fn balanced_book_rests_at_touch() {
        let analysis = TopOfBookAnalyzer.analyze(&quote(dec!(500), dec!(500)), dec!(100));
        assert_eq!(analysis.volume_imbalance, Decimal::ZERO);
        assert_eq!(analysis.recommended_bid_price, dec!(400.00));
        assert_eq!(analysis.recommended_ask_price, dec!(400.05));
        assert_eq!(analysis.liquidity_score, Decimal::ONE);
        assert_eq!(analysis.confidence, Decimal::ONE);
    }

    #[test]
    fn bid_heavy_book_steps_buy_inside() {
        let analysis = TopOfBookAnalyzer.analyze(&quote(dec!(900), dec!(100)), dec!(10));
        assert_eq!(analysis.volume_imbalance, dec!(0.8));
        assert_eq!(analysis.recommended_bid_price, dec!(400.01));
        assert_eq!(analysis.recommended_ask_price, dec!(400.05));
    }

    #[test]
    fn ask_heavy_book_steps_sell_inside() {
        let analysis = TopOfBookAnalyzer.analyze(&quote(dec!(100), dec!(900)), dec!(10));
        assert_eq!(analysis.recommended_ask_price, dec!(400.04));
        assert_eq!(analysis.recommended_bid_price, dec!(400.00));
    }

    #[test]
    fn thin_book_scores_low() {
        let analysis = TopOfBookAnalyzer.analyze(&quote(dec!(10), dec!(10)), dec!(100));
        assert_eq!(analysis.liquidity_score, dec!(0.02));
        assert!(analysis.confidence < dec!(0.6));
    }

    #[test]
    fn empty_book_has_zero_imbalance() {
        let analysis = TopOfBookAnalyzer.analyze(&quote(Decimal::ZERO, Decimal::ZERO), dec!(1));
        assert_eq!(analysis.volume_imbalance, Decimal::ZERO);
        assert_eq!(analysis.liquidity_score, Decimal::ZERO);
    }
}
