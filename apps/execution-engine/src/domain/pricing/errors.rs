//! Pricing Errors

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced while computing an initial limit price.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// The quote cannot be priced against.
    #[error("Invalid quote for {symbol}: {reason}")]
    InvalidQuote {
        /// Symbol of the quote.
        symbol: String,
        /// Why the quote was rejected.
        reason: String,
    },

    /// The computed price is not positive.
    #[error("Computed non-positive price {price}")]
    NonPositivePrice {
        /// The offending price.
        price: Decimal,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PricingError::InvalidQuote {
            symbol: "AAPL".to_string(),
            reason: "bid is zero".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid quote for AAPL: bid is zero");

        let err = PricingError::NonPositivePrice {
            price: Decimal::ZERO,
        };
        assert_eq!(err.to_string(), "Computed non-positive price 0");
    }
}
