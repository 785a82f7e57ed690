//! Smart Execution Strategy
//!
//! Prices and places one limit order per request, tracks it for repegging,
//! and implements [`PhaseExecutor`] so an [`OrderMonitor`] can drive it.
//!
//! [`OrderMonitor`]: super::order_monitor::OrderMonitor

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use rand::Rng;
use rust_decimal::Decimal;

use super::broker_calls::bounded;
use super::order_monitor::{PhaseExecutor, PhaseOrder};
use super::repeg_manager::{MARKET_ESCALATION_TAG, RepegAction, RepegManager, RepegOutcome};
use crate::application::ports::{
    BrokerPort, ExecutionValidatorPort, LimitOrderRequest, MarketClockPort, QuoteError,
    QuoteProviderPort, ValidatedQuote,
};
use crate::config::ExecutionConfig;
use crate::domain::order_execution::{OrderRequest, OrderResult, OrderSide};
use crate::domain::order_tracking::OrderTracker;
use crate::domain::pricing::{
    LiquidityAnalyzer, PriceMetadata, PriceRecommendation, PricingMethod, TopOfBookAnalyzer,
};
use crate::domain::shared::{BrokerOrderId, CorrelationId, quantize_price};

/// Tag for orders rejected by preflight validation.
pub const VALIDATION_FAILED_TAG: &str = "validation_failed";
/// Tag for orders deferred because the session just opened.
pub const DEFERRED_MARKET_OPEN_TAG: &str = "deferred_market_open";
/// Tag for market orders placed when no limit price could be computed.
pub const MARKET_FALLBACK_TAG: &str = "market_fallback";
/// Tag for failed limit placements.
pub const SMART_LIMIT_TAG: &str = "smart_limit";
/// Tag for extended-hours placements.
pub const EXTENDED_HOURS_TAG: &str = "smart_extended_hours";

/// Places inside-spread limit orders and manages them until resolved.
pub struct SmartExecutionStrategy<B, Q>
where
    B: BrokerPort,
    Q: QuoteProviderPort,
{
    broker: Arc<B>,
    quotes: Arc<Q>,
    repeg_manager: RepegManager<B, Q>,
    tracker: OrderTracker,
    /// Quantity filled by earlier orders of the same chain, keyed by the ID
    /// of the order that left tracking (or the market order that replaced it).
    retired: HashMap<BrokerOrderId, Decimal>,
    config: Arc<ExecutionConfig>,
    analyzer: Arc<dyn LiquidityAnalyzer>,
    validator: Option<Arc<dyn ExecutionValidatorPort>>,
    market_clock: Option<Arc<dyn MarketClockPort>>,
}

impl<B, Q> SmartExecutionStrategy<B, Q>
where
    B: BrokerPort,
    Q: QuoteProviderPort,
{
    /// Create a strategy with the top-of-book analyzer and no preflight
    /// validation or market-open guard.
    pub fn new(broker: Arc<B>, quotes: Arc<Q>, config: Arc<ExecutionConfig>) -> Self {
        Self {
            repeg_manager: RepegManager::new(Arc::clone(&broker), Arc::clone(&quotes), Arc::clone(&config)),
            broker,
            quotes,
            tracker: OrderTracker::new(),
            retired: HashMap::new(),
            config,
            analyzer: Arc::new(TopOfBookAnalyzer::default()),
            validator: None,
            market_clock: None,
        }
    }

    /// Use a different liquidity analyzer.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Arc<dyn LiquidityAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Run a preflight validator before pricing.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn ExecutionValidatorPort>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Defer orders placed shortly after the regular session opens.
    #[must_use]
    pub fn with_market_clock(mut self, clock: Arc<dyn MarketClockPort>) -> Self {
        self.market_clock = Some(clock);
        self
    }

    /// Orders currently under limit-price management.
    pub const fn tracker(&self) -> &OrderTracker {
        &self.tracker
    }

    fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.config.order_placement_timeout_seconds)
    }

    /// Price and place one order.
    ///
    /// Never returns an error: every failure is folded into an unsuccessful
    /// [`OrderResult`] whose execution strategy names the stage that failed.
    /// A successful result carries the quantity the broker received.
    pub async fn place_order(&mut self, request: OrderRequest) -> OrderResult {
        let request = match self.preflight(request).await {
            Ok(request) => request,
            Err(result) => return result,
        };

        let quantity = request.quantity();
        let result = self.route(request).await;
        if result.success() && result.submitted_quantity().is_none() {
            result.with_submitted_quantity(quantity)
        } else {
            result
        }
    }

    async fn route(&mut self, request: OrderRequest) -> OrderResult {
        if let Some(result) = self.defer_for_market_open(&request) {
            return result;
        }

        let validated = match self.fetch_quote(&request).await {
            Ok(validated) => validated,
            Err(e) => {
                tracing::warn!(
                    symbol = %request.symbol(),
                    correlation_id = %request.correlation_id(),
                    error = %e,
                    "No usable quote"
                );
                if self.config.extended_hours {
                    return OrderResult::failed(EXTENDED_HOURS_TAG, e.to_string());
                }
                return self.market_fallback_or_fail(&request, e.to_string()).await;
            }
        };

        if self.config.extended_hours {
            return self.place_extended_hours(&request, &validated).await;
        }

        let priced = if validated.used_fallback {
            self.repeg_manager
                .calculator()
                .simple_inside_spread_price(&validated.quote, request.side())
        } else {
            self.repeg_manager.calculator().liquidity_aware_price(
                &validated.quote,
                request.side(),
                request.quantity(),
                self.analyzer.as_ref(),
            )
        };
        let recommendation = match priced {
            Ok(rec) if rec.price > Decimal::ZERO => rec,
            Ok(rec) => {
                return self
                    .market_fallback_or_fail(&request, format!("non-positive limit price {}", rec.price))
                    .await;
            }
            Err(e) => {
                tracing::warn!(symbol = %request.symbol(), error = %e, "Pricing failed");
                return self.market_fallback_or_fail(&request, e.to_string()).await;
            }
        };

        self.place_tracked_limit(request, recommendation).await
    }

    async fn preflight(&self, request: OrderRequest) -> Result<OrderRequest, OrderResult> {
        let Some(validator) = &self.validator else {
            return Ok(request);
        };
        let outcome = validator
            .validate(request.symbol(), request.quantity(), request.correlation_id())
            .await;

        if !outcome.is_valid {
            let reason = outcome.error.unwrap_or_else(|| "rejected by validator".to_string());
            tracing::warn!(
                symbol = %request.symbol(),
                correlation_id = %request.correlation_id(),
                reason = %reason,
                "Order failed preflight validation"
            );
            return Err(OrderResult::failed(VALIDATION_FAILED_TAG, reason));
        }
        for warning in &outcome.warnings {
            tracing::warn!(symbol = %request.symbol(), warning = %warning, "Preflight warning");
        }

        match outcome.adjusted_quantity {
            Some(quantity) if quantity != request.quantity() => {
                tracing::info!(
                    symbol = %request.symbol(),
                    requested = %request.quantity(),
                    adjusted = %quantity,
                    "Quantity adjusted by preflight validation"
                );
                request
                    .with_quantity(quantity)
                    .map_err(|e| OrderResult::failed(VALIDATION_FAILED_TAG, e.to_string()))
            }
            _ => Ok(request),
        }
    }

    fn defer_for_market_open(&self, request: &OrderRequest) -> Option<OrderResult> {
        if self.config.extended_hours {
            return None;
        }
        let clock = self.market_clock.as_ref()?;
        let now = Utc::now();
        let open = clock.session_open(now)?;
        let delay = TimeDelta::minutes(i64::from(self.config.market_open_delay_minutes));
        if now - open >= delay {
            return None;
        }
        tracing::info!(
            symbol = %request.symbol(),
            session_open = %open,
            delay_minutes = self.config.market_open_delay_minutes,
            "Deferring order until opening volatility settles"
        );
        Some(OrderResult::failed(
            DEFERRED_MARKET_OPEN_TAG,
            format!(
                "market opened at {open}, orders deferred for {} minutes",
                self.config.market_open_delay_minutes
            ),
        ))
    }

    async fn fetch_quote(&self, request: &OrderRequest) -> Result<ValidatedQuote, QuoteError> {
        let attempts = self.config.quote_retry_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self
                .quotes
                .get_quote_with_validation(request.symbol(), Some(request.quantity()))
                .await
            {
                Ok(validated) => return Ok(validated),
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => {
                    let delay = self.retry_delay(attempt);
                    tracing::debug!(
                        symbol = %request.symbol(),
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Quote unavailable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Linear backoff with up to 25% jitter.
    fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self
            .config
            .quote_retry_backoff_ms
            .saturating_mul(u64::from(attempt));
        let jitter = if base >= 4 {
            rand::rng().random_range(0..=base / 4)
        } else {
            0
        };
        Duration::from_millis(base + jitter)
    }

    async fn market_fallback_or_fail(&self, request: &OrderRequest, reason: String) -> OrderResult {
        if !request.urgency().allows_market_fallback() {
            return OrderResult::failed(SMART_LIMIT_TAG, reason);
        }
        tracing::warn!(
            symbol = %request.symbol(),
            urgency = %request.urgency(),
            reason = %reason,
            "No limit price, using market order"
        );
        self.repeg_manager
            .place_market(request, request.quantity(), MARKET_FALLBACK_TAG)
            .await
    }

    async fn place_extended_hours(
        &self,
        request: &OrderRequest,
        validated: &ValidatedQuote,
    ) -> OrderResult {
        let quote = &validated.quote;
        let touch = match request.side() {
            OrderSide::Buy => quote.ask,
            OrderSide::Sell => quote.bid,
        };
        if touch <= Decimal::ZERO {
            return OrderResult::failed(EXTENDED_HOURS_TAG, format!("no usable touch price for {}", request.symbol()));
        }
        let price = quantize_price(touch);
        let limit = LimitOrderRequest::new(request.symbol().clone(), request.side(), request.quantity(), price)
            .with_extended_hours();

        match bounded(self.call_timeout(), self.broker.place_limit_order(limit)).await {
            Ok(placement) if placement.is_success() => {
                tracing::info!(
                    symbol = %request.symbol(),
                    side = %request.side(),
                    price = %price,
                    order_id = %placement.order_id,
                    "Extended-hours order placed"
                );
                OrderResult::placed(placement.order_id, Some(price), EXTENDED_HOURS_TAG).with_metadata(
                    PriceMetadata::from_touch(PricingMethod::ExtendedHours, quote.bid, quote.ask, validated.used_fallback),
                )
            }
            Ok(placement) => OrderResult::failed(
                EXTENDED_HOURS_TAG,
                format!("order {} {}", placement.order_id, placement.status),
            ),
            Err(e) => {
                tracing::error!(symbol = %request.symbol(), error = %e, "Extended-hours placement failed");
                OrderResult::failed(EXTENDED_HOURS_TAG, e.to_string())
            }
        }
    }

    async fn place_tracked_limit(
        &mut self,
        request: OrderRequest,
        recommendation: PriceRecommendation,
    ) -> OrderResult {
        let PriceRecommendation { price, metadata } = recommendation;
        let tag = format!("smart_{}", metadata.method.tag());
        let limit = LimitOrderRequest::new(request.symbol().clone(), request.side(), request.quantity(), price);

        let (placement, submitted) = match self.repeg_manager.place_with_quantity_retry(limit).await {
            Ok((placement, submitted)) if placement.is_success() => (placement, submitted),
            Ok((placement, _)) => {
                tracing::error!(
                    symbol = %request.symbol(),
                    order_id = %placement.order_id,
                    status = %placement.status,
                    "Limit order not accepted"
                );
                return OrderResult::failed(
                    SMART_LIMIT_TAG,
                    format!("order {} {}", placement.order_id, placement.status),
                );
            }
            Err(e) => {
                tracing::error!(symbol = %request.symbol(), error = %e, "Limit order placement failed");
                return OrderResult::failed(SMART_LIMIT_TAG, e.to_string());
            }
        };

        let placed_at = Utc::now();
        let tracked_request = if submitted == request.quantity() {
            request
        } else {
            request.with_quantity(submitted).unwrap_or(request)
        };
        if let Err(e) = self
            .tracker
            .add(placement.order_id.clone(), tracked_request, placed_at, price)
        {
            tracing::error!(order_id = %placement.order_id, error = %e, "Failed to track placed order");
        }

        tracing::info!(
            order_id = %placement.order_id,
            price = %price,
            method = metadata.method.tag(),
            used_fallback = metadata.used_fallback,
            "Smart limit order placed"
        );

        OrderResult::placed(placement.order_id, Some(price), tag)
            .with_metadata(metadata)
            .with_placement_timestamp(placed_at)
            .with_submitted_quantity(submitted)
    }

    fn record_outcome(&mut self, outcome: &RepegOutcome) {
        match &outcome.action {
            RepegAction::Retired { chain_fill_base, .. } => {
                self.retired
                    .insert(outcome.previous_order_id.clone(), *chain_fill_base);
            }
            RepegAction::Escalated {
                chain_filled,
                chain_fill_base,
            } => match outcome.replacement_order_id() {
                Some(id) => {
                    self.retired.insert(id.clone(), *chain_filled);
                }
                // The market order never went out; reconciliation of the
                // cancelled limit must still count earlier fills.
                None => {
                    self.retired
                        .insert(outcome.previous_order_id.clone(), *chain_fill_base);
                }
            },
            RepegAction::Repegged => {}
        }
    }
}

#[async_trait]
impl<B, Q> PhaseExecutor for SmartExecutionStrategy<B, Q>
where
    B: BrokerPort,
    Q: QuoteProviderPort,
{
    async fn check_and_repeg(&mut self) -> Vec<RepegOutcome> {
        let outcomes = self.repeg_manager.check_and_repeg_all(&mut self.tracker).await;
        for outcome in &outcomes {
            self.record_outcome(outcome);
        }
        outcomes
    }

    fn is_active(&self, order_id: &BrokerOrderId) -> bool {
        self.tracker.contains(order_id)
    }

    async fn escalate_all_active(&mut self) -> Vec<RepegOutcome> {
        let mut outcomes = Vec::new();
        for order_id in self.tracker.active_order_ids() {
            if let Some(outcome) = self.repeg_manager.escalate(&mut self.tracker, &order_id).await {
                self.record_outcome(&outcome);
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    async fn reconcile(
        &mut self,
        order: &PhaseOrder,
        correlation_id: &CorrelationId,
    ) -> Option<OrderResult> {
        if !order.success {
            return None;
        }
        let order_id = order.order_id.as_ref()?;
        if self.tracker.contains(order_id) {
            return None;
        }
        if self.config.extended_hours {
            tracing::warn!(
                order_id = %order_id,
                symbol = %order.symbol,
                "Extended-hours order left unreconciled, market orders are unavailable"
            );
            return None;
        }

        let report = match bounded(
            self.call_timeout(),
            self.broker.get_order_execution_result(order_id),
        )
        .await
        {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(order_id = %order_id, error = %e, "Reconciliation status check failed");
                return None;
            }
        };
        if !report.status.is_unfilled_terminal() {
            return None;
        }

        let chain_base = self.retired.get(order_id).copied().unwrap_or(Decimal::ZERO);
        let filled = chain_base + report.filled_qty;
        let remaining = order.shares - filled;
        if remaining <= Decimal::ZERO {
            return None;
        }

        tracing::warn!(
            order_id = %order_id,
            symbol = %order.symbol,
            status = %report.status,
            filled = %filled,
            remaining = %remaining,
            "Order closed by broker with unfilled remainder, escalating to market"
        );
        let request = match OrderRequest::new(order.symbol.clone(), order.side, remaining, correlation_id.clone()) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(order_id = %order_id, error = %e, "Cannot build reconciliation request");
                return None;
            }
        };
        let result = self
            .repeg_manager
            .place_market(&request, remaining, MARKET_ESCALATION_TAG)
            .await;
        if result.success()
            && let Some(market_id) = result.order_id()
        {
            self.retired.insert(market_id.clone(), filled);
        }
        Some(result)
    }
}
