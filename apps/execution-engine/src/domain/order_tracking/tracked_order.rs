//! Tracked order entity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::order_execution::OrderRequest;

/// State of one logical order chain while it rests at the broker.
///
/// Keyed in the tracker by the broker ID of the currently live order. A
/// repeg moves the entry to the new ID and carries everything forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedOrder {
    pub(super) request: OrderRequest,
    pub(super) repeg_count: u32,
    pub(super) placement_time: DateTime<Utc>,
    pub(super) anchor_price: Decimal,
    pub(super) price_history: Vec<Decimal>,
    pub(super) filled_quantity: Decimal,
    pub(super) chain_fill_base: Decimal,
}

impl TrackedOrder {
    pub(super) fn new(
        request: OrderRequest,
        placement_time: DateTime<Utc>,
        anchor_price: Decimal,
    ) -> Self {
        Self {
            request,
            repeg_count: 0,
            placement_time,
            anchor_price,
            price_history: vec![anchor_price],
            filled_quantity: Decimal::ZERO,
            chain_fill_base: Decimal::ZERO,
        }
    }

    /// The request that started this chain.
    #[must_use]
    pub const fn request(&self) -> &OrderRequest {
        &self.request
    }

    /// Successful repegs so far.
    #[must_use]
    pub const fn repeg_count(&self) -> u32 {
        self.repeg_count
    }

    /// When the live order was placed.
    #[must_use]
    pub const fn placement_time(&self) -> DateTime<Utc> {
        self.placement_time
    }

    /// Price the live order rests at.
    #[must_use]
    pub const fn anchor_price(&self) -> Decimal {
        self.anchor_price
    }

    /// Every anchor used by the chain, oldest first.
    #[must_use]
    pub fn price_history(&self) -> &[Decimal] {
        &self.price_history
    }

    /// Quantity filled across the whole chain.
    #[must_use]
    pub const fn filled_quantity(&self) -> Decimal {
        self.filled_quantity
    }

    /// Quantity filled by orders retired before the live one.
    ///
    /// Broker fill reports for the live order are relative to it, so the
    /// chain total is `chain_fill_base + live_order_filled`.
    #[must_use]
    pub const fn chain_fill_base(&self) -> Decimal {
        self.chain_fill_base
    }

    /// Unfilled quantity, never negative.
    #[must_use]
    pub fn remaining_quantity(&self) -> Decimal {
        (self.request.quantity() - self.filled_quantity).max(Decimal::ZERO)
    }
}
