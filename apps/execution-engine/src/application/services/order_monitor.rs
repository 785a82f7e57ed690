//! Order Monitor
//!
//! Phase-level supervision: repeatedly drives repeg passes until every
//! order in the phase is resolved or the phase deadline passes, then
//! reconciles broker-side cancellations that left an unfilled remainder.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::time::Instant;

use super::repeg_manager::RepegOutcome;
use crate::config::ExecutionConfig;
use crate::domain::order_execution::{OrderRequest, OrderResult, OrderSide};
use crate::domain::shared::{BrokerOrderId, CorrelationId, Symbol};

const MIN_CHECK_INTERVAL_SECS: u64 = 1;
const MAX_CHECK_INTERVAL_SECS: u64 = 5;
const DEADLINE_MARGIN_SECS: u64 = 30;
const MIN_PHASE_WAIT_SECS: u64 = 60;
const MAX_PHASE_WAIT_SECS: u64 = 600;

/// Rebalance leg being monitored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseType {
    /// Sell leg.
    Sell,
    /// Buy leg.
    Buy,
}

impl fmt::Display for PhaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sell => write!(f, "SELL"),
            Self::Buy => write!(f, "BUY"),
        }
    }
}

/// One order in a phase's working list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOrder {
    /// Symbol.
    pub symbol: Symbol,
    /// Side.
    pub side: OrderSide,
    /// Shares the phase wants filled for this symbol.
    pub shares: Decimal,
    /// Current broker order ID.
    pub order_id: Option<BrokerOrderId>,
    /// Whether the initial placement succeeded.
    pub success: bool,
}

impl PhaseOrder {
    /// Build a phase entry from a request and its placement result.
    ///
    /// `shares` follows the quantity the broker actually received.
    #[must_use]
    pub fn from_result(request: &OrderRequest, result: &OrderResult) -> Self {
        Self {
            symbol: request.symbol().clone(),
            side: request.side(),
            shares: result.submitted_quantity().unwrap_or_else(|| request.quantity()),
            order_id: result.order_id().cloned(),
            success: result.success(),
        }
    }

    /// Same order, now known by a different broker ID.
    #[must_use]
    pub fn with_order_id(&self, order_id: BrokerOrderId) -> Self {
        Self {
            order_id: Some(order_id),
            ..self.clone()
        }
    }
}

/// Execution engine driven by [`OrderMonitor`].
#[async_trait]
pub trait PhaseExecutor: Send {
    /// Run one repeg pass over all active orders.
    async fn check_and_repeg(&mut self) -> Vec<RepegOutcome>;

    /// Whether an order is still under limit-price management.
    fn is_active(&self, order_id: &BrokerOrderId) -> bool;

    /// Escalate every active order to market.
    async fn escalate_all_active(&mut self) -> Vec<RepegOutcome>;

    /// Escalate any unfilled remainder of an order the broker closed.
    async fn reconcile(
        &mut self,
        order: &PhaseOrder,
        correlation_id: &CorrelationId,
    ) -> Option<OrderResult>;
}

#[derive(Debug, Default)]
struct PhaseSummary {
    passes: u32,
    replacements: u32,
    escalations: u32,
    reconciled: u32,
    timed_out: bool,
}

/// Drives repeg passes for one phase at a time.
pub struct OrderMonitor {
    config: Arc<ExecutionConfig>,
}

impl OrderMonitor {
    /// Create a new order monitor.
    pub const fn new(config: Arc<ExecutionConfig>) -> Self {
        Self { config }
    }

    /// Sleep between repeg passes: half the fill wait, within 1 to 5 seconds.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(
            (self.config.fill_wait_seconds / 2).clamp(MIN_CHECK_INTERVAL_SECS, MAX_CHECK_INTERVAL_SECS),
        )
    }

    /// Upper bound on one phase: placement timeout plus a fill wait per
    /// allowed attempt plus a margin, within 60 to 600 seconds.
    pub fn max_total_wait(&self) -> Duration {
        let attempts = u64::from(self.config.max_repegs_per_order).saturating_add(1);
        let secs = self
            .config
            .order_placement_timeout_seconds
            .saturating_add(self.config.fill_wait_seconds.saturating_mul(attempts))
            .saturating_add(DEADLINE_MARGIN_SECS);
        Duration::from_secs(secs.clamp(MIN_PHASE_WAIT_SECS, MAX_PHASE_WAIT_SECS))
    }

    /// Supervise a phase until every order is resolved.
    ///
    /// Returns the working list with every repegged or escalated order
    /// rewritten to its latest broker order ID.
    pub async fn monitor_phase<E>(
        &self,
        executor: &mut E,
        phase: PhaseType,
        orders: Vec<PhaseOrder>,
        correlation_id: &CorrelationId,
    ) -> Vec<PhaseOrder>
    where
        E: PhaseExecutor + ?Sized,
    {
        let interval = self.check_interval();
        let max_wait = self.max_total_wait();
        let deadline = Instant::now() + max_wait;
        let mut summary = PhaseSummary::default();
        let mut working = orders;

        tracing::info!(
            phase = %phase,
            correlation_id = %correlation_id,
            orders = working.len(),
            interval_secs = interval.as_secs(),
            max_wait_secs = max_wait.as_secs(),
            "Monitoring phase"
        );

        loop {
            if !Self::any_active(executor, &working) {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                summary.timed_out = true;
                break;
            }
            tokio::time::sleep(interval.min(deadline - now)).await;

            let outcomes = executor.check_and_repeg().await;
            summary.passes += 1;
            working = Self::apply_outcomes(working, &outcomes, &mut summary);
        }

        if Self::any_active(executor, &working) {
            tracing::warn!(
                phase = %phase,
                correlation_id = %correlation_id,
                "Phase deadline reached with active orders, escalating to market"
            );
            let outcomes = executor.escalate_all_active().await;
            working = Self::apply_outcomes(working, &outcomes, &mut summary);
        }

        let mut reconciled = Vec::with_capacity(working.len());
        for order in working {
            let is_candidate = order.success
                && order
                    .order_id
                    .as_ref()
                    .is_some_and(|id| !executor.is_active(id));
            if !is_candidate {
                reconciled.push(order);
                continue;
            }
            match executor.reconcile(&order, correlation_id).await {
                Some(result) => {
                    summary.reconciled += 1;
                    match result.order_id() {
                        Some(id) if result.success() => reconciled.push(order.with_order_id(id.clone())),
                        _ => reconciled.push(order),
                    }
                }
                None => reconciled.push(order),
            }
        }

        tracing::info!(
            phase = %phase,
            correlation_id = %correlation_id,
            passes = summary.passes,
            replacements = summary.replacements,
            escalations = summary.escalations,
            reconciled = summary.reconciled,
            timed_out = summary.timed_out,
            "Phase monitoring complete"
        );

        reconciled
    }

    fn any_active<E>(executor: &E, orders: &[PhaseOrder]) -> bool
    where
        E: PhaseExecutor + ?Sized,
    {
        orders
            .iter()
            .filter_map(|o| o.order_id.as_ref())
            .any(|id| executor.is_active(id))
    }

    fn apply_outcomes(
        orders: Vec<PhaseOrder>,
        outcomes: &[RepegOutcome],
        summary: &mut PhaseSummary,
    ) -> Vec<PhaseOrder> {
        let mut orders = orders;
        for outcome in outcomes {
            if matches!(outcome.action, super::repeg_manager::RepegAction::Escalated { .. }) {
                summary.escalations += 1;
            }
            let Some(new_id) = outcome.replacement_order_id() else {
                continue;
            };
            summary.replacements += 1;
            orders = orders
                .into_iter()
                .map(|order| {
                    if order.order_id.as_ref() == Some(&outcome.previous_order_id) {
                        order.with_order_id(new_id.clone())
                    } else {
                        order
                    }
                })
                .collect();
        }
        orders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::repeg_manager::RepegAction;
    use crate::domain::order_execution::OrderStatus;
    use rust_decimal_macros::dec;
    use std::collections::{HashSet, VecDeque};

    fn config(fill_wait: u64, max_repegs: u32) -> Arc<ExecutionConfig> {
        Arc::new(ExecutionConfig {
            fill_wait_seconds: fill_wait,
            max_repegs_per_order: max_repegs,
            ..ExecutionConfig::default()
        })
    }

    /// Executor whose passes are scripted in advance.
    #[derive(Default)]
    struct ScriptedExecutor {
        active: HashSet<BrokerOrderId>,
        passes: VecDeque<Vec<RepegOutcome>>,
        reconcile_ids: Vec<BrokerOrderId>,
        escalated_all: bool,
        pass_count: u32,
    }

    #[async_trait]
    impl PhaseExecutor for ScriptedExecutor {
        async fn check_and_repeg(&mut self) -> Vec<RepegOutcome> {
            self.pass_count += 1;
            let outcomes = self.passes.pop_front().unwrap_or_default();
            for outcome in &outcomes {
                self.active.remove(&outcome.previous_order_id);
                if outcome.action == RepegAction::Repegged
                    && let Some(id) = outcome.replacement_order_id()
                {
                    self.active.insert(id.clone());
                }
            }
            outcomes
        }

        fn is_active(&self, order_id: &BrokerOrderId) -> bool {
            self.active.contains(order_id)
        }

        async fn escalate_all_active(&mut self) -> Vec<RepegOutcome> {
            self.escalated_all = true;
            self.active
                .drain()
                .map(|id| RepegOutcome {
                    result: Some(OrderResult::placed(
                        BrokerOrderId::new(format!("mkt-{id}")),
                        None,
                        "market_escalation",
                    )),
                    previous_order_id: id,
                    action: RepegAction::Escalated {
                        chain_filled: Decimal::ZERO,
                        chain_fill_base: Decimal::ZERO,
                    },
                })
                .collect()
        }

        async fn reconcile(
            &mut self,
            order: &PhaseOrder,
            _correlation_id: &CorrelationId,
        ) -> Option<OrderResult> {
            let id = order.order_id.clone()?;
            self.reconcile_ids.push(id);
            None
        }
    }

    fn phase_order(id: &str) -> PhaseOrder {
        PhaseOrder {
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Buy,
            shares: dec!(10),
            order_id: Some(BrokerOrderId::new(id)),
            success: true,
        }
    }

    fn repegged(old: &str, new: &str) -> RepegOutcome {
        RepegOutcome {
            previous_order_id: BrokerOrderId::new(old),
            action: RepegAction::Repegged,
            result: Some(OrderResult::placed(BrokerOrderId::new(new), Some(dec!(1)), "smart_repeg_1")),
        }
    }

    fn retired(id: &str) -> RepegOutcome {
        RepegOutcome {
            previous_order_id: BrokerOrderId::new(id),
            action: RepegAction::Retired {
                status: OrderStatus::Filled,
                chain_fill_base: Decimal::ZERO,
            },
            result: None,
        }
    }

    #[test]
    fn interval_and_wait_follow_config() {
        let monitor = OrderMonitor::new(config(10, 3));
        assert_eq!(monitor.check_interval(), Duration::from_secs(5));
        // 30 + 10 * 4 + 30
        assert_eq!(monitor.max_total_wait(), Duration::from_secs(100));

        let fast = OrderMonitor::new(config(0, 0));
        assert_eq!(fast.check_interval(), Duration::from_secs(1));
        assert_eq!(fast.max_total_wait(), Duration::from_secs(60));

        let slow = OrderMonitor::new(config(300, 10));
        assert_eq!(slow.max_total_wait(), Duration::from_secs(600));
    }

    #[test]
    fn with_order_id_is_a_pure_rewrite() {
        let original = phase_order("o-1");
        let rewritten = original.with_order_id(BrokerOrderId::new("o-2"));
        assert_eq!(original.order_id, Some(BrokerOrderId::new("o-1")));
        assert_eq!(rewritten.order_id, Some(BrokerOrderId::new("o-2")));
        assert_eq!(rewritten.shares, original.shares);
        assert_eq!(rewritten.symbol, original.symbol);
    }

    #[tokio::test(start_paused = true)]
    async fn replacements_are_applied_until_orders_resolve() {
        let mut executor = ScriptedExecutor {
            active: HashSet::from([BrokerOrderId::new("o-1")]),
            passes: VecDeque::from([vec![repegged("o-1", "o-2")], vec![retired("o-2")]]),
            ..ScriptedExecutor::default()
        };
        let monitor = OrderMonitor::new(config(2, 3));

        let orders = monitor
            .monitor_phase(
                &mut executor,
                PhaseType::Buy,
                vec![phase_order("o-1")],
                &CorrelationId::new("corr-1"),
            )
            .await;

        assert_eq!(orders[0].order_id, Some(BrokerOrderId::new("o-2")));
        assert_eq!(executor.pass_count, 2);
        assert!(!executor.escalated_all);
        assert_eq!(executor.reconcile_ids, vec![BrokerOrderId::new("o-2")]);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_escalates_stuck_orders() {
        let mut executor = ScriptedExecutor {
            active: HashSet::from([BrokerOrderId::new("o-1")]),
            ..ScriptedExecutor::default()
        };
        let monitor = OrderMonitor::new(config(0, 0));
        let started = Instant::now();

        let orders = monitor
            .monitor_phase(
                &mut executor,
                PhaseType::Sell,
                vec![phase_order("o-1")],
                &CorrelationId::new("corr-2"),
            )
            .await;

        assert!(executor.escalated_all);
        assert_eq!(orders[0].order_id, Some(BrokerOrderId::new("mkt-o-1")));
        assert!(started.elapsed() >= Duration::from_secs(60));
        assert!(started.elapsed() < Duration::from_secs(62));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_placements_are_not_reconciled() {
        let mut executor = ScriptedExecutor::default();
        let monitor = OrderMonitor::new(config(2, 3));
        let mut failed = phase_order("o-9");
        failed.success = false;

        let orders = monitor
            .monitor_phase(
                &mut executor,
                PhaseType::Buy,
                vec![failed.clone()],
                &CorrelationId::new("corr-3"),
            )
            .await;

        assert_eq!(orders, vec![failed]);
        assert_eq!(executor.pass_count, 0);
        assert!(executor.reconcile_ids.is_empty());
    }
}
