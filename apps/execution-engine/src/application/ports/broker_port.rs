//! Broker Port (Driven Port)
//!
//! Interface for placing, replacing and querying orders at a brokerage.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::{OrderSide, OrderStatus, TimeInForce};
use crate::domain::shared::{BrokerOrderId, Symbol};

/// Request to place a limit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderRequest {
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Quantity.
    pub quantity: Decimal,
    /// Limit price.
    pub limit_price: Decimal,
    /// Time in force.
    pub time_in_force: TimeInForce,
    /// Extended hours trading.
    pub extended_hours: bool,
}

impl LimitOrderRequest {
    /// Create a regular-hours DAY limit order request.
    #[must_use]
    pub const fn new(symbol: Symbol, side: OrderSide, quantity: Decimal, limit_price: Decimal) -> Self {
        Self {
            symbol,
            side,
            quantity,
            limit_price,
            time_in_force: TimeInForce::Day,
            extended_hours: false,
        }
    }

    /// Set time in force.
    #[must_use]
    pub const fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    /// Enable extended hours.
    #[must_use]
    pub const fn with_extended_hours(mut self) -> Self {
        self.extended_hours = true;
        self
    }
}

/// Broker acknowledgment of a placement or replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacement {
    /// Broker-assigned order ID.
    pub order_id: BrokerOrderId,
    /// Status at acknowledgment time.
    pub status: OrderStatus,
    /// Accepted limit price, or fill price for market orders.
    pub price: Option<Decimal>,
}

impl OrderPlacement {
    /// Whether the broker accepted the order.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !self.status.is_unfilled_terminal()
    }
}

/// Execution state of an order as reported by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Current status.
    pub status: OrderStatus,
    /// Quantity filled by this order.
    pub filled_qty: Decimal,
    /// Average fill price (if any).
    pub avg_fill_price: Option<Decimal>,
}

/// Broker port error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BrokerError {
    /// Connection error.
    #[error("Broker connection error: {message}")]
    ConnectionError {
        /// Error details.
        message: String,
    },

    /// Order rejected by broker.
    #[error("Order rejected: {reason}")]
    OrderRejected {
        /// Rejection reason.
        reason: String,
    },

    /// Order not found.
    #[error("Order not found: {order_id}")]
    OrderNotFound {
        /// The missing order ID.
        order_id: String,
    },

    /// Less quantity available than requested, typically because part of
    /// the order filled while it was being repegged.
    #[error("Insufficient quantity available: {message}")]
    InsufficientQuantity {
        /// Quantity the broker reports as available.
        available: Option<Decimal>,
        /// Broker message.
        message: String,
    },

    /// Rate limited.
    #[error("Rate limited by broker")]
    RateLimited,

    /// Call did not complete in time.
    #[error("Broker call timed out after {seconds}s")]
    Timeout {
        /// Timeout that elapsed.
        seconds: u64,
    },

    /// Unknown error.
    #[error("Broker error: {message}")]
    Unknown {
        /// Error details.
        message: String,
    },
}

impl BrokerError {
    /// Quantity the broker says is still available, if this is an
    /// insufficient-quantity rejection.
    ///
    /// Prefers the typed field; falls back to parsing the message.
    #[must_use]
    pub fn available_quantity(&self) -> Option<Decimal> {
        match self {
            Self::InsufficientQuantity {
                available: Some(available),
                ..
            } => Some(*available),
            Self::InsufficientQuantity { message, .. } => parse_available_quantity(message),
            Self::OrderRejected { reason } if reason.to_lowercase().contains("insufficient") => {
                parse_available_quantity(reason)
            }
            _ => None,
        }
    }

    /// Whether retrying the same call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError { .. } | Self::RateLimited | Self::Timeout { .. }
        )
    }
}

fn available_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)available\W{0,3}?:\s*([0-9]+(?:\.[0-9]+)?)",
            r"(?i)available\s+(?:qty|quantity)?\s*(?:is\s+)?([0-9]+(?:\.[0-9]+)?)",
            r"(?i)([0-9]+(?:\.[0-9]+)?)\s+(?:shares?\s+)?available",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

/// Extract an available quantity from a free-text broker rejection.
///
/// Compatibility shim for adapters that cannot populate
/// [`BrokerError::InsufficientQuantity::available`]. Understands messages
/// such as `"insufficient qty available for order (requested: 10,
/// available: 7)"` and `"only 7.5 shares available"`.
#[must_use]
pub fn parse_available_quantity(message: &str) -> Option<Decimal> {
    available_patterns().iter().find_map(|pattern| {
        pattern
            .captures(message)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<Decimal>().ok())
    })
}

/// Port for broker interactions.
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Place a limit order.
    async fn place_limit_order(
        &self,
        request: LimitOrderRequest,
    ) -> Result<OrderPlacement, BrokerError>;

    /// Place a market order.
    async fn place_market_order(
        &self,
        symbol: &Symbol,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderPlacement, BrokerError>;

    /// Cancel an order.
    async fn cancel_order(&self, order_id: &BrokerOrderId) -> Result<(), BrokerError>;

    /// Replace quantity and limit price of a resting order in place.
    async fn replace_order(
        &self,
        order_id: &BrokerOrderId,
        quantity: Decimal,
        limit_price: Decimal,
    ) -> Result<OrderPlacement, BrokerError>;

    /// Get status and fills of an order.
    async fn get_order_execution_result(
        &self,
        order_id: &BrokerOrderId,
    ) -> Result<ExecutionReport, BrokerError>;

    /// Get the current status of an order.
    async fn check_order_completion_status(
        &self,
        order_id: &BrokerOrderId,
    ) -> Result<OrderStatus, BrokerError>;
}
