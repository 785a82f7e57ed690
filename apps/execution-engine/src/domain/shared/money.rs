//! Cent-precision price helpers.
//!
//! Equity limit prices are submitted at cent precision; every price produced
//! by the engine passes through [`quantize_price`].

use rust_decimal::{Decimal, RoundingStrategy};

/// Smallest price the engine will ever submit ($0.01).
pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// One cent.
pub const CENT: Decimal = MIN_PRICE;

/// Quantize a price to cents, rounding half up, and floor it at [`MIN_PRICE`].
///
/// The result always carries a scale of exactly two decimal places.
#[must_use]
pub fn quantize_price(price: Decimal) -> Decimal {
    let mut quantized = price
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .max(MIN_PRICE);
    quantized.rescale(2);
    quantized
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn min_price_is_one_cent() {
        assert_eq!(MIN_PRICE, dec!(0.01));
    }

    #[test]
    fn quantize_rounds_half_up() {
        assert_eq!(quantize_price(dec!(100.625)), dec!(100.63));
        assert_eq!(quantize_price(dec!(100.624)), dec!(100.62));
        assert_eq!(quantize_price(dec!(150.305)), dec!(150.31));
    }

    #[test]
    fn quantize_floors_at_min_price() {
        assert_eq!(quantize_price(Decimal::ZERO), MIN_PRICE);
        assert_eq!(quantize_price(dec!(-3)), MIN_PRICE);
        assert_eq!(quantize_price(dec!(0.004)), MIN_PRICE);
    }

    #[test]
    fn quantize_keeps_two_decimal_places() {
        assert_eq!(quantize_price(dec!(42.1)).scale(), 2);
        assert_eq!(quantize_price(dec!(42)).scale(), 2);
        assert_eq!(quantize_price(dec!(42.123)).scale(), 2);
    }
}
