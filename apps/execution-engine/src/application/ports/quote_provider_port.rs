//! Quote Provider Port (Driven Port)
//!
//! Validated bid/ask snapshots for pricing decisions.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::pricing::Quote;
use crate::domain::shared::Symbol;

/// A quote that passed validation, and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuote {
    /// The quote.
    pub quote: Quote,
    /// True when the streaming source was unusable and a REST snapshot
    /// (without depth) was returned instead.
    pub used_fallback: bool,
}

/// Quote provider error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuoteError {
    /// No source returned a usable quote.
    #[error("No valid quote for {symbol}: {reason}")]
    Unavailable {
        /// Symbol requested.
        symbol: String,
        /// Why the last candidate was rejected.
        reason: String,
    },

    /// Connection error.
    #[error("Quote source connection error: {message}")]
    ConnectionError {
        /// Error details.
        message: String,
    },
}

/// Port for obtaining validated quotes.
#[async_trait]
pub trait QuoteProviderPort: Send + Sync {
    /// Get a validated quote, preferring live data.
    ///
    /// `order_size` lets the provider check displayed size against the order.
    async fn get_quote_with_validation(
        &self,
        symbol: &Symbol,
        order_size: Option<Decimal>,
    ) -> Result<ValidatedQuote, QuoteError>;
}
