//! Portfolio coordination errors.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while building or resolving position intents.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConflictError {
    /// Confidence outside [0, 1].
    #[error("confidence for strategy {strategy} must be within [0, 1], got {confidence}")]
    InvalidConfidence {
        /// Strategy name.
        strategy: String,
        /// Rejected confidence.
        confidence: Decimal,
    },

    /// Allocation magnitude above 100% of the portfolio.
    #[error("allocation for {symbol} must be within [-1, 1], got {allocation}")]
    AllocationOutOfRange {
        /// Symbol.
        symbol: String,
        /// Rejected allocation.
        allocation: Decimal,
    },

    /// Strategy name was empty.
    #[error("strategy name must not be empty")]
    EmptyStrategyName,
}
