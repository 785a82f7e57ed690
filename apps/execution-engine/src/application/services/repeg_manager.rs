//! Repeg Manager
//!
//! Per-order wait / repeg / escalate decisions for everything in an
//! [`OrderTracker`]. Driven by the caller; there is no internal timer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use rust_decimal::Decimal;

use super::broker_calls::bounded;
use crate::application::ports::{
    BrokerError, BrokerPort, LimitOrderRequest, OrderPlacement, QuoteProviderPort,
};
use crate::config::ExecutionConfig;
use crate::domain::order_execution::{OrderRequest, OrderResult, OrderStatus};
use crate::domain::order_tracking::OrderTracker;
use crate::domain::pricing::{PriceMetadata, PricingCalculator, PricingMethod};
use crate::domain::shared::BrokerOrderId;

/// Execution-strategy tag for market escalations.
pub const MARKET_ESCALATION_TAG: &str = "market_escalation";

/// What a repeg pass did with one tracked order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepegAction {
    /// Replaced by a more aggressive limit order.
    Repegged,
    /// Handed off to a market order for the remainder.
    Escalated {
        /// Quantity filled by the chain before escalation.
        chain_filled: Decimal,
        /// Quantity filled by earlier orders in the chain, excluding the
        /// escalated order itself.
        chain_fill_base: Decimal,
    },
    /// Reached a terminal state at the broker and left tracking.
    Retired {
        /// Broker status.
        status: OrderStatus,
        /// Quantity filled by earlier orders in the chain.
        chain_fill_base: Decimal,
    },
}

/// Outcome for one tracked order in a repeg pass.
#[derive(Debug, Clone)]
pub struct RepegOutcome {
    /// Order ID before this pass.
    pub previous_order_id: BrokerOrderId,
    /// What happened.
    pub action: RepegAction,
    /// New placement, when one was attempted.
    pub result: Option<OrderResult>,
}

impl RepegOutcome {
    /// Order ID that supersedes `previous_order_id`, if any.
    #[must_use]
    pub fn replacement_order_id(&self) -> Option<&BrokerOrderId> {
        self.result
            .as_ref()
            .filter(|r| r.success())
            .and_then(OrderResult::order_id)
    }
}

/// Decides, per tracked order, whether to wait, repeg or escalate.
pub struct RepegManager<B, Q>
where
    B: BrokerPort,
    Q: QuoteProviderPort,
{
    broker: Arc<B>,
    quotes: Arc<Q>,
    calculator: PricingCalculator,
    config: Arc<ExecutionConfig>,
}

impl<B, Q> RepegManager<B, Q>
where
    B: BrokerPort,
    Q: QuoteProviderPort,
{
    /// Create a new repeg manager.
    pub fn new(broker: Arc<B>, quotes: Arc<Q>, config: Arc<ExecutionConfig>) -> Self {
        Self {
            broker,
            quotes,
            calculator: PricingCalculator::new(config.pricing_policy()),
            config,
        }
    }

    fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.config.order_placement_timeout_seconds)
    }

    /// Run one pass over every tracked order.
    ///
    /// Orders that are still resting inside the fill-wait window, or whose
    /// status could not be read, produce no outcome.
    pub async fn check_and_repeg_all(&self, tracker: &mut OrderTracker) -> Vec<RepegOutcome> {
        let mut outcomes = Vec::new();
        for order_id in tracker.active_order_ids() {
            if let Some(outcome) = self.check_order(tracker, &order_id).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    async fn check_order(
        &self,
        tracker: &mut OrderTracker,
        order_id: &BrokerOrderId,
    ) -> Option<RepegOutcome> {
        let status = match bounded(
            self.call_timeout(),
            self.broker.check_order_completion_status(order_id),
        )
        .await
        {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(order_id = %order_id, error = %e, "Status check failed, retrying next pass");
                return None;
            }
        };

        if status.is_terminal() {
            self.refresh_fills(tracker, order_id).await;
            return Some(Self::retire(tracker, order_id, status));
        }

        let placed_at = tracker.placement_time(order_id)?;
        let fill_wait = TimeDelta::seconds(
            i64::try_from(self.config.fill_wait_seconds).unwrap_or(i64::MAX),
        );
        if Utc::now() - placed_at < fill_wait {
            return None;
        }

        self.refresh_fills(tracker, order_id).await;
        if tracker.remaining_quantity(order_id) <= Decimal::ZERO {
            return Some(Self::retire(tracker, order_id, OrderStatus::Filled));
        }

        if tracker.repeg_count(order_id) >= self.config.max_repegs_per_order {
            tracing::info!(
                order_id = %order_id,
                repeg_count = tracker.repeg_count(order_id),
                "Repeg limit reached, escalating to market"
            );
            return self.escalate(tracker, order_id).await;
        }

        self.repeg(tracker, order_id).await
    }

    fn retire(
        tracker: &mut OrderTracker,
        order_id: &BrokerOrderId,
        status: OrderStatus,
    ) -> RepegOutcome {
        let chain_fill_base = tracker
            .remove(order_id)
            .map_or(Decimal::ZERO, |order| order.chain_fill_base());
        tracing::debug!(order_id = %order_id, status = %status, "Order left tracking");
        RepegOutcome {
            previous_order_id: order_id.clone(),
            action: RepegAction::Retired {
                status,
                chain_fill_base,
            },
            result: None,
        }
    }

    async fn refresh_fills(&self, tracker: &mut OrderTracker, order_id: &BrokerOrderId) {
        match bounded(
            self.call_timeout(),
            self.broker.get_order_execution_result(order_id),
        )
        .await
        {
            Ok(report) => {
                if let Err(e) = tracker.record_live_fill(order_id, report.filled_qty) {
                    tracing::warn!(order_id = %order_id, error = %e, "Ignoring invalid fill report");
                }
            }
            Err(e) => {
                tracing::warn!(order_id = %order_id, error = %e, "Fill refresh failed, using last known fills");
            }
        }
    }

    async fn repeg(&self, tracker: &mut OrderTracker, order_id: &BrokerOrderId) -> Option<RepegOutcome> {
        let request = tracker.get(order_id)?.request().clone();
        let remaining = tracker.remaining_quantity(order_id);

        let validated = match self
            .quotes
            .get_quote_with_validation(request.symbol(), Some(remaining))
            .await
        {
            Ok(validated) => validated,
            Err(e) => {
                tracing::warn!(
                    order_id = %order_id,
                    symbol = %request.symbol(),
                    error = %e,
                    "No quote for repeg, order keeps resting"
                );
                return None;
            }
        };
        let quote = validated.quote;

        let Some(price) = self.calculator.repeg_price_avoiding(
            &quote,
            request.side(),
            tracker.anchor_price(order_id),
            tracker.price_history(order_id),
        ) else {
            tracing::error!(order_id = %order_id, "Repeg price computation failed, escalating");
            return self.escalate(tracker, order_id).await;
        };

        let new_count = tracker.repeg_count(order_id) + 1;
        let tag = format!("smart_repeg_{new_count}");
        let metadata =
            PriceMetadata::from_touch(PricingMethod::Repeg, quote.bid, quote.ask, validated.used_fallback);

        if self.config.use_replace_orders {
            match bounded(
                self.call_timeout(),
                self.broker.replace_order(order_id, remaining, price),
            )
            .await
            {
                Ok(placement) if placement.is_success() => {
                    return self.complete_repeg(tracker, order_id, placement, price, tag, metadata);
                }
                Ok(placement) => {
                    tracing::warn!(
                        order_id = %order_id,
                        status = %placement.status,
                        "Replace not accepted, falling back to cancel and resubmit"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        order_id = %order_id,
                        error = %e,
                        "Replace failed, falling back to cancel and resubmit"
                    );
                }
            }
        }

        if let Err(e) = bounded(self.call_timeout(), self.broker.cancel_order(order_id)).await {
            tracing::warn!(order_id = %order_id, error = %e, "Cancel before repeg failed");
            if let Ok(status) = bounded(
                self.call_timeout(),
                self.broker.check_order_completion_status(order_id),
            )
            .await
                && status.is_terminal()
            {
                self.refresh_fills(tracker, order_id).await;
                return Some(Self::retire(tracker, order_id, status));
            }
            return None;
        }

        // Fills may have landed between the last refresh and the cancel.
        self.refresh_fills(tracker, order_id).await;
        let remaining = tracker.remaining_quantity(order_id);
        if remaining <= Decimal::ZERO {
            return Some(Self::retire(tracker, order_id, OrderStatus::Filled));
        }

        let limit = LimitOrderRequest::new(request.symbol().clone(), request.side(), remaining, price);
        match self.place_with_quantity_retry(limit).await {
            Ok((placement, _)) if placement.is_success() => {
                self.complete_repeg(tracker, order_id, placement, price, tag, metadata)
            }
            Ok((placement, _)) => {
                tracing::error!(
                    order_id = %order_id,
                    status = %placement.status,
                    "Repeg order not accepted after cancel, escalating"
                );
                self.escalate_after_cancel(tracker, order_id).await
            }
            Err(e) => {
                tracing::error!(
                    order_id = %order_id,
                    error = %e,
                    "Repeg placement failed after cancel, escalating"
                );
                self.escalate_after_cancel(tracker, order_id).await
            }
        }
    }

    /// Place a limit order with one bounded retry: the same request again
    /// after a transient failure, or the broker-reported available quantity
    /// after an insufficient-quantity rejection.
    ///
    /// Returns the placement together with the quantity actually submitted.
    pub(crate) async fn place_with_quantity_retry(
        &self,
        request: LimitOrderRequest,
    ) -> Result<(OrderPlacement, Decimal), BrokerError> {
        let first = bounded(
            self.call_timeout(),
            self.broker.place_limit_order(request.clone()),
        )
        .await;

        let err = match first {
            Ok(placement) => return Ok((placement, request.quantity)),
            Err(err) => err,
        };
        if err.is_transient() {
            tracing::warn!(
                symbol = %request.symbol,
                error = %err,
                "Transient broker error placing limit order, retrying once"
            );
            let quantity = request.quantity;
            return bounded(self.call_timeout(), self.broker.place_limit_order(request))
                .await
                .map(|placement| (placement, quantity));
        }
        let Some(available) = err.available_quantity().filter(|q| *q > Decimal::ZERO) else {
            return Err(err);
        };

        tracing::warn!(
            symbol = %request.symbol,
            requested = %request.quantity,
            available = %available,
            "Insufficient quantity, retrying with available quantity"
        );
        let retry = LimitOrderRequest {
            quantity: available,
            ..request
        };
        bounded(self.call_timeout(), self.broker.place_limit_order(retry))
            .await
            .map(|placement| (placement, available))
    }

    fn complete_repeg(
        &self,
        tracker: &mut OrderTracker,
        old_id: &BrokerOrderId,
        placement: OrderPlacement,
        price: Decimal,
        tag: String,
        metadata: PriceMetadata,
    ) -> Option<RepegOutcome> {
        let placed_at = Utc::now();
        if let Err(e) = tracker.update_for_repeg(old_id, placement.order_id.clone(), price, placed_at) {
            tracing::error!(order_id = %old_id, error = %e, "Failed to move tracking to repegged order");
            return None;
        }
        let repeg_count = tracker.repeg_count(&placement.order_id);

        tracing::info!(
            old_order_id = %old_id,
            new_order_id = %placement.order_id,
            price = %price,
            repeg_count,
            "Order repegged"
        );

        Some(RepegOutcome {
            previous_order_id: old_id.clone(),
            action: RepegAction::Repegged,
            result: Some(
                OrderResult::placed(placement.order_id, Some(price), tag)
                    .with_repeg_count(repeg_count)
                    .with_metadata(metadata)
                    .with_placement_timestamp(placed_at),
            ),
        })
    }

    /// Cancel a tracked order and replace it with a market order for the
    /// remaining quantity.
    ///
    /// A failed cancel is logged and ignored. The order leaves tracking
    /// whatever the outcome.
    pub async fn escalate(
        &self,
        tracker: &mut OrderTracker,
        order_id: &BrokerOrderId,
    ) -> Option<RepegOutcome> {
        if let Err(e) = bounded(self.call_timeout(), self.broker.cancel_order(order_id)).await {
            tracing::warn!(
                order_id = %order_id,
                error = %e,
                "Cancel before escalation failed, order may already be closed"
            );
        }
        self.escalate_after_cancel(tracker, order_id).await
    }

    async fn escalate_after_cancel(
        &self,
        tracker: &mut OrderTracker,
        order_id: &BrokerOrderId,
    ) -> Option<RepegOutcome> {
        self.refresh_fills(tracker, order_id).await;
        let order = tracker.remove(order_id)?;
        let chain_filled = order.filled_quantity();
        let remaining = order.remaining_quantity();

        if remaining <= Decimal::ZERO {
            return Some(RepegOutcome {
                previous_order_id: order_id.clone(),
                action: RepegAction::Retired {
                    status: OrderStatus::Filled,
                    chain_fill_base: order.chain_fill_base(),
                },
                result: None,
            });
        }

        tracing::info!(
            order_id = %order_id,
            remaining = %remaining,
            "Escalating order to market"
        );
        let result = self
            .place_market(order.request(), remaining, MARKET_ESCALATION_TAG)
            .await
            .with_repeg_count(order.repeg_count());

        Some(RepegOutcome {
            previous_order_id: order_id.clone(),
            action: RepegAction::Escalated {
                chain_filled,
                chain_fill_base: order.chain_fill_base(),
            },
            result: Some(result),
        })
    }

    /// Place a market order for `quantity` of the request's symbol and side.
    pub async fn place_market(
        &self,
        request: &OrderRequest,
        quantity: Decimal,
        tag: &str,
    ) -> OrderResult {
        match bounded(
            self.call_timeout(),
            self.broker
                .place_market_order(request.symbol(), request.side(), quantity),
        )
        .await
        {
            Ok(placement) if placement.is_success() => {
                tracing::info!(
                    symbol = %request.symbol(),
                    side = %request.side(),
                    quantity = %quantity,
                    market_order_id = %placement.order_id,
                    tag,
                    "Market order placed"
                );
                OrderResult::placed(placement.order_id, placement.price, tag)
            }
            Ok(placement) => {
                tracing::error!(
                    symbol = %request.symbol(),
                    quantity = %quantity,
                    status = %placement.status,
                    "Market order not accepted"
                );
                OrderResult::failed(
                    tag,
                    format!("market order {} {}", placement.order_id, placement.status),
                )
            }
            Err(e) => {
                tracing::error!(
                    symbol = %request.symbol(),
                    quantity = %quantity,
                    error = %e,
                    "Market order failed"
                );
                OrderResult::failed(tag, e.to_string())
            }
        }
    }

    /// The pricing calculator in use.
    pub const fn calculator(&self) -> &PricingCalculator {
        &self.calculator
    }
}
