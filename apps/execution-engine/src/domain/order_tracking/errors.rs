//! Order tracking errors.
//!
//! Every variant is a caller contract violation, not a recoverable
//! broker condition.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by [`super::OrderTracker`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// Order ID was empty or whitespace.
    #[error("order ID must not be empty")]
    EmptyOrderId,

    /// Anchor price was zero or negative.
    #[error("anchor price for {order_id} must be positive, got {price}")]
    NonPositiveAnchor {
        /// Order ID.
        order_id: String,
        /// Rejected price.
        price: Decimal,
    },

    /// Filled quantity was negative.
    #[error("filled quantity for {order_id} must not be negative, got {filled}")]
    NegativeFill {
        /// Order ID.
        order_id: String,
        /// Rejected quantity.
        filled: Decimal,
    },

    /// Repeg referenced an order that is not tracked.
    #[error("order {order_id} is not tracked")]
    UnknownOrder {
        /// Order ID.
        order_id: String,
    },
}
