//! In-memory order tracker.
//!
//! Not synchronized: a tracker is owned by the single monitor/repeg pair
//! driving a phase and is passed by `&mut` to whoever mutates it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::errors::TrackerError;
use super::tracked_order::TrackedOrder;
use crate::domain::order_execution::OrderRequest;
use crate::domain::shared::BrokerOrderId;

/// Active orders keyed by current broker order ID.
#[derive(Debug, Default)]
pub struct OrderTracker {
    orders: HashMap<BrokerOrderId, TrackedOrder>,
}

impl OrderTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a freshly placed order.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty order ID or a non-positive anchor price.
    pub fn add(
        &mut self,
        order_id: BrokerOrderId,
        request: OrderRequest,
        placement_time: DateTime<Utc>,
        anchor_price: Decimal,
    ) -> Result<(), TrackerError> {
        if order_id.is_blank() {
            return Err(TrackerError::EmptyOrderId);
        }
        if anchor_price <= Decimal::ZERO {
            return Err(TrackerError::NonPositiveAnchor {
                order_id: order_id.to_string(),
                price: anchor_price,
            });
        }

        tracing::debug!(
            order_id = %order_id,
            symbol = %request.symbol(),
            anchor_price = %anchor_price,
            "Tracking order"
        );
        self.orders.insert(
            order_id,
            TrackedOrder::new(request, placement_time, anchor_price),
        );
        Ok(())
    }

    /// Move a chain from its old order ID to the replacement order.
    ///
    /// Increments the repeg count by one, appends the new anchor to the price
    /// history and carries the filled quantity forward. `old_id == new_id`
    /// (in-place replace) is supported.
    ///
    /// # Errors
    ///
    /// Returns an error if `old_id` is not tracked, `new_id` is empty or the
    /// anchor is not positive. The tracker is unchanged on error.
    pub fn update_for_repeg(
        &mut self,
        old_id: &BrokerOrderId,
        new_id: BrokerOrderId,
        new_anchor_price: Decimal,
        new_placement_time: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        if new_id.is_blank() {
            return Err(TrackerError::EmptyOrderId);
        }
        if new_anchor_price <= Decimal::ZERO {
            return Err(TrackerError::NonPositiveAnchor {
                order_id: new_id.to_string(),
                price: new_anchor_price,
            });
        }
        let mut order = self
            .orders
            .remove(old_id)
            .ok_or_else(|| TrackerError::UnknownOrder {
                order_id: old_id.to_string(),
            })?;

        order.repeg_count += 1;
        order.anchor_price = new_anchor_price;
        order.placement_time = new_placement_time;
        order.price_history.push(new_anchor_price);
        order.chain_fill_base = order.filled_quantity;

        tracing::debug!(
            old_order_id = %old_id,
            new_order_id = %new_id,
            repeg_count = order.repeg_count,
            anchor_price = %new_anchor_price,
            "Moved tracking to repegged order"
        );
        self.orders.insert(new_id, order);
        Ok(())
    }

    /// Stop tracking an order. Absent IDs are ignored.
    pub fn remove(&mut self, order_id: &BrokerOrderId) -> Option<TrackedOrder> {
        self.orders.remove(order_id)
    }

    /// Record the chain's cumulative filled quantity.
    ///
    /// Filled quantity never decreases. Overfill is accepted and logged;
    /// remaining quantity clamps at zero. Unknown IDs are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if `filled` is negative.
    pub fn update_filled_quantity(
        &mut self,
        order_id: &BrokerOrderId,
        filled: Decimal,
    ) -> Result<(), TrackerError> {
        if filled < Decimal::ZERO {
            return Err(TrackerError::NegativeFill {
                order_id: order_id.to_string(),
                filled,
            });
        }
        let Some(order) = self.orders.get_mut(order_id) else {
            return Ok(());
        };

        order.filled_quantity = order.filled_quantity.max(filled);
        if order.filled_quantity > order.request.quantity() {
            tracing::warn!(
                order_id = %order_id,
                filled = %order.filled_quantity,
                requested = %order.request.quantity(),
                "Broker reported overfill, clamping remaining to zero"
            );
        }
        Ok(())
    }

    /// Record a broker fill report for the live order of a chain.
    ///
    /// `live_filled` is relative to the live order; it is added to the fills
    /// of retired orders in the chain.
    ///
    /// # Errors
    ///
    /// Returns an error if `live_filled` is negative.
    pub fn record_live_fill(
        &mut self,
        order_id: &BrokerOrderId,
        live_filled: Decimal,
    ) -> Result<(), TrackerError> {
        if live_filled < Decimal::ZERO {
            return Err(TrackerError::NegativeFill {
                order_id: order_id.to_string(),
                filled: live_filled,
            });
        }
        let base = self
            .orders
            .get(order_id)
            .map_or(Decimal::ZERO, TrackedOrder::chain_fill_base);
        self.update_filled_quantity(order_id, base + live_filled)
    }

    /// Look up a tracked order.
    #[must_use]
    pub fn get(&self, order_id: &BrokerOrderId) -> Option<&TrackedOrder> {
        self.orders.get(order_id)
    }

    /// Whether an order is tracked.
    #[must_use]
    pub fn contains(&self, order_id: &BrokerOrderId) -> bool {
        self.orders.contains_key(order_id)
    }

    /// Repeg count, zero for unknown IDs.
    #[must_use]
    pub fn repeg_count(&self, order_id: &BrokerOrderId) -> u32 {
        self.orders.get(order_id).map_or(0, TrackedOrder::repeg_count)
    }

    /// Anchor price, if tracked.
    #[must_use]
    pub fn anchor_price(&self, order_id: &BrokerOrderId) -> Option<Decimal> {
        self.orders.get(order_id).map(TrackedOrder::anchor_price)
    }

    /// Placement time, if tracked.
    #[must_use]
    pub fn placement_time(&self, order_id: &BrokerOrderId) -> Option<DateTime<Utc>> {
        self.orders.get(order_id).map(TrackedOrder::placement_time)
    }

    /// Price history, empty for unknown IDs.
    #[must_use]
    pub fn price_history(&self, order_id: &BrokerOrderId) -> &[Decimal] {
        self.orders
            .get(order_id)
            .map(TrackedOrder::price_history)
            .unwrap_or_default()
    }

    /// Cumulative filled quantity, zero for unknown IDs.
    #[must_use]
    pub fn filled_quantity(&self, order_id: &BrokerOrderId) -> Decimal {
        self.orders
            .get(order_id)
            .map_or(Decimal::ZERO, TrackedOrder::filled_quantity)
    }

    /// Remaining quantity, zero for unknown IDs.
    #[must_use]
    pub fn remaining_quantity(&self, order_id: &BrokerOrderId) -> Decimal {
        self.orders
            .get(order_id)
            .map_or(Decimal::ZERO, TrackedOrder::remaining_quantity)
    }

    /// IDs of all tracked orders, sorted for deterministic iteration.
    #[must_use]
    pub fn active_order_ids(&self) -> Vec<BrokerOrderId> {
        let mut ids: Vec<_> = self.orders.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of tracked orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_execution::OrderSide;
    use crate::domain::shared::CorrelationId;
    use chrono::TimeDelta;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn request(quantity: Decimal) -> OrderRequest {
        OrderRequest::new("AAPL", OrderSide::Buy, quantity, CorrelationId::new("corr-1")).unwrap()
    }

    fn id(value: &str) -> BrokerOrderId {
        BrokerOrderId::new(value)
    }

    fn tracker_with(order_id: &str, quantity: Decimal) -> OrderTracker {
        let mut tracker = OrderTracker::new();
        tracker
            .add(id(order_id), request(quantity), Utc::now(), dec!(100.25))
            .unwrap();
        tracker
    }

    #[test]
    fn add_starts_chain() {
        let tracker = tracker_with("o-1", dec!(10));
        let order = tracker.get(&id("o-1")).unwrap();

        assert_eq!(order.repeg_count(), 0);
        assert_eq!(order.price_history(), &[dec!(100.25)]);
        assert_eq!(order.filled_quantity(), Decimal::ZERO);
        assert_eq!(tracker.remaining_quantity(&id("o-1")), dec!(10));
    }

    #[test]
    fn add_rejects_contract_violations() {
        let mut tracker = OrderTracker::new();
        assert_eq!(
            tracker.add(id("  "), request(dec!(1)), Utc::now(), dec!(1)),
            Err(TrackerError::EmptyOrderId)
        );
        assert!(matches!(
            tracker.add(id("o-1"), request(dec!(1)), Utc::now(), Decimal::ZERO),
            Err(TrackerError::NonPositiveAnchor { .. })
        ));
        assert!(tracker.is_empty());
    }

    #[test]
    fn repeg_moves_state_to_new_id() {
        let mut tracker = tracker_with("o-1", dec!(10));
        tracker.update_filled_quantity(&id("o-1"), dec!(4)).unwrap();
        let later = Utc::now() + TimeDelta::seconds(5);

        tracker
            .update_for_repeg(&id("o-1"), id("o-2"), dec!(100.63), later)
            .unwrap();

        assert!(!tracker.contains(&id("o-1")));
        let order = tracker.get(&id("o-2")).unwrap();
        assert_eq!(order.repeg_count(), 1);
        assert_eq!(order.price_history(), &[dec!(100.25), dec!(100.63)]);
        assert_eq!(order.filled_quantity(), dec!(4));
        assert_eq!(order.chain_fill_base(), dec!(4));
        assert_eq!(order.placement_time(), later);
        assert_eq!(tracker.remaining_quantity(&id("o-2")), dec!(6));
    }

    #[test]
    fn repeg_in_place_keeps_id() {
        let mut tracker = tracker_with("o-1", dec!(10));
        tracker
            .update_for_repeg(&id("o-1"), id("o-1"), dec!(100.50), Utc::now())
            .unwrap();

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.repeg_count(&id("o-1")), 1);
    }

    #[test]
    fn repeg_of_unknown_order_fails() {
        let mut tracker = OrderTracker::new();
        assert_eq!(
            tracker.update_for_repeg(&id("nope"), id("o-2"), dec!(1), Utc::now()),
            Err(TrackerError::UnknownOrder {
                order_id: "nope".to_string()
            })
        );
    }

    #[test]
    fn remove_is_idempotent() {
        let mut tracker = tracker_with("o-1", dec!(10));
        assert!(tracker.remove(&id("o-1")).is_some());
        assert!(tracker.remove(&id("o-1")).is_none());
        assert!(tracker.is_empty());
    }

    #[test]
    fn filled_quantity_is_monotonic() {
        let mut tracker = tracker_with("o-1", dec!(10));
        tracker.update_filled_quantity(&id("o-1"), dec!(6)).unwrap();
        tracker.update_filled_quantity(&id("o-1"), dec!(2)).unwrap();
        assert_eq!(tracker.filled_quantity(&id("o-1")), dec!(6));
    }

    #[test]
    fn negative_fill_is_rejected() {
        let mut tracker = tracker_with("o-1", dec!(10));
        assert!(matches!(
            tracker.update_filled_quantity(&id("o-1"), dec!(-1)),
            Err(TrackerError::NegativeFill { .. })
        ));
    }

    #[test]
    fn live_fill_adds_retired_chain_fills() {
        let mut tracker = tracker_with("o-1", dec!(10));
        tracker.record_live_fill(&id("o-1"), dec!(3)).unwrap();
        tracker
            .update_for_repeg(&id("o-1"), id("o-2"), dec!(100.5), Utc::now())
            .unwrap();
        tracker.record_live_fill(&id("o-2"), dec!(2)).unwrap();

        assert_eq!(tracker.filled_quantity(&id("o-2")), dec!(5));
        assert_eq!(tracker.remaining_quantity(&id("o-2")), dec!(5));
    }

    #[test]
    fn unknown_ids_read_as_zero_values() {
        let tracker = OrderTracker::new();
        let missing = id("missing");
        assert_eq!(tracker.repeg_count(&missing), 0);
        assert!(tracker.price_history(&missing).is_empty());
        assert_eq!(tracker.filled_quantity(&missing), Decimal::ZERO);
        assert_eq!(tracker.remaining_quantity(&missing), Decimal::ZERO);
        assert!(tracker.anchor_price(&missing).is_none());
    }

    proptest! {
        #[test]
        fn remaining_is_clamped_original_minus_filled(
            quantity in 1i64..1_000,
            fills in proptest::collection::vec(0i64..2_000, 0..10),
        ) {
            let quantity = Decimal::from(quantity);
            let mut tracker = tracker_with("o-1", quantity);
            let mut max_fill = Decimal::ZERO;
            for fill in fills {
                let fill = Decimal::from(fill);
                max_fill = max_fill.max(fill);
                tracker.update_filled_quantity(&id("o-1"), fill).unwrap();
            }
            let expected = (quantity - max_fill).max(Decimal::ZERO);
            prop_assert_eq!(tracker.remaining_quantity(&id("o-1")), expected);
        }

        #[test]
        fn repeg_chain_history_grows_by_one(repegs in 0u32..20) {
            let mut tracker = tracker_with("o-0", dec!(10));
            for n in 0..repegs {
                let old = id(&format!("o-{n}"));
                let new = id(&format!("o-{}", n + 1));
                tracker.update_for_repeg(&old, new, dec!(100) + Decimal::from(n), Utc::now()).unwrap();
            }
            let live = id(&format!("o-{repegs}"));
            prop_assert_eq!(tracker.repeg_count(&live), repegs);
            prop_assert_eq!(tracker.price_history(&live).len(), repegs as usize + 1);
        }
    }
}
