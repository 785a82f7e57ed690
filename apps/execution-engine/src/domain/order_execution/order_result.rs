//! Order result value object.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::pricing::PriceMetadata;
use crate::domain::shared::BrokerOrderId;

/// Outcome of one placement, repeg, or escalation attempt.
///
/// Produced once per attempt and never mutated. A repeg yields a new
/// `OrderResult` whose order ID supersedes the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    success: bool,
    order_id: Option<BrokerOrderId>,
    final_price: Option<Decimal>,
    repeg_count: u32,
    execution_strategy: String,
    error_message: Option<String>,
    placement_timestamp: DateTime<Utc>,
    metadata: Option<PriceMetadata>,
    submitted_quantity: Option<Decimal>,
}

impl OrderResult {
    /// A successfully placed order.
    #[must_use]
    pub fn placed(
        order_id: BrokerOrderId,
        final_price: Option<Decimal>,
        execution_strategy: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            order_id: Some(order_id),
            final_price,
            repeg_count: 0,
            execution_strategy: execution_strategy.into(),
            error_message: None,
            placement_timestamp: Utc::now(),
            metadata: None,
            submitted_quantity: None,
        }
    }

    /// A failed attempt.
    #[must_use]
    pub fn failed(execution_strategy: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            order_id: None,
            final_price: None,
            repeg_count: 0,
            execution_strategy: execution_strategy.into(),
            error_message: Some(error.into()),
            placement_timestamp: Utc::now(),
            metadata: None,
            submitted_quantity: None,
        }
    }

    /// Attach the repeg count this result was produced at.
    #[must_use]
    pub const fn with_repeg_count(mut self, repeg_count: u32) -> Self {
        self.repeg_count = repeg_count;
        self
    }

    /// Attach pricing metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: PriceMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach the order ID of a failed attempt (e.g. a rejected order).
    #[must_use]
    pub fn with_order_id(mut self, order_id: BrokerOrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// Record the quantity sent to the broker when it differs from what was
    /// requested (preflight adjustment or an available-quantity retry).
    #[must_use]
    pub const fn with_submitted_quantity(mut self, quantity: Decimal) -> Self {
        self.submitted_quantity = Some(quantity);
        self
    }

    /// Override the placement timestamp.
    #[must_use]
    pub const fn with_placement_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.placement_timestamp = timestamp;
        self
    }

    /// Whether the attempt succeeded.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    /// Broker order ID, if one was assigned.
    #[must_use]
    pub const fn order_id(&self) -> Option<&BrokerOrderId> {
        self.order_id.as_ref()
    }

    /// Final limit price (None for market orders without a reported price).
    #[must_use]
    pub const fn final_price(&self) -> Option<Decimal> {
        self.final_price
    }

    /// Repeg count at which this result was produced.
    #[must_use]
    pub const fn repeg_count(&self) -> u32 {
        self.repeg_count
    }

    /// Diagnostic tag describing how the order was executed.
    #[must_use]
    pub fn execution_strategy(&self) -> &str {
        &self.execution_strategy
    }

    /// Error message for failed attempts.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// When the attempt was made.
    #[must_use]
    pub const fn placement_timestamp(&self) -> DateTime<Utc> {
        self.placement_timestamp
    }

    /// Quantity actually submitted, when known.
    #[must_use]
    pub const fn submitted_quantity(&self) -> Option<Decimal> {
        self.submitted_quantity
    }

    /// Pricing metadata, if any.
    #[must_use]
    pub const fn metadata(&self) -> Option<&PriceMetadata> {
        self.metadata.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn placed_result() {
        let result = OrderResult::placed(
            BrokerOrderId::new("ord-1"),
            Some(dec!(150.26)),
            "smart_liquidity_aware",
        )
        .with_repeg_count(2);

        assert!(result.success());
        assert_eq!(result.order_id().unwrap().as_str(), "ord-1");
        assert_eq!(result.final_price(), Some(dec!(150.26)));
        assert_eq!(result.repeg_count(), 2);
        assert!(result.error_message().is_none());
    }

    #[test]
    fn failed_result() {
        let result = OrderResult::failed("validation_failed", "quantity must be positive");

        assert!(!result.success());
        assert!(result.order_id().is_none());
        assert_eq!(result.error_message(), Some("quantity must be positive"));
        assert_eq!(result.execution_strategy(), "validation_failed");
    }

    #[test]
    fn submitted_quantity_defaults_to_unknown() {
        let result = OrderResult::placed(BrokerOrderId::new("ord-3"), None, "x");
        assert_eq!(result.submitted_quantity(), None);

        let adjusted = result.with_submitted_quantity(dec!(3));
        assert_eq!(adjusted.submitted_quantity(), Some(dec!(3)));
    }

    #[test]
    fn metadata_is_attached() {
        let metadata = PriceMetadata::inside_spread_fallback(dec!(100), dec!(101));
        let result = OrderResult::placed(BrokerOrderId::new("ord-2"), Some(dec!(100.01)), "x")
            .with_metadata(metadata.clone());

        assert_eq!(result.metadata(), Some(&metadata));
    }
}
