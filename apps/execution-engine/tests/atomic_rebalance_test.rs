//! Integration tests for atomic multi-strategy rebalance runs.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use futures::FutureExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::oneshot;

use smart_execution::application::services::{
    OrderMonitor, PhaseOrder, PhaseType, SmartExecutionStrategy,
};
use smart_execution::config::AtomicConfig;
use smart_execution::domain::portfolio_coordination::ResolutionMethod;
use smart_execution::{
    AtomicExecutionContext, AtomicExecutionError, CorrelationId, ExecutionConfig, ExecutionGate,
    ExecutionId, ExecutionState, FallbackQuoteProvider, MockBroker, MockQuoteSource, OrderRequest,
    OrderSide, PositionIntent, Quote, QuoteSource, Symbol,
};

fn context(gate: &ExecutionGate) -> AtomicExecutionContext {
    AtomicExecutionContext::new(gate.clone(), Arc::new(AtomicConfig::default()))
}

fn intent(symbol: &str, allocation: Decimal, strategy: &str, confidence: Decimal) -> PositionIntent {
    PositionIntent::new(symbol, allocation, strategy, confidence).unwrap()
}

#[tokio::test]
async fn same_sign_intents_resolve_to_confidence_weighted_average() {
    let gate = ExecutionGate::new();
    let mut ctx = context(&gate);

    let resolutions = ctx
        .run_atomic(ExecutionId::new("run-1"), |ctx| {
            async move {
                ctx.transition_to(ExecutionState::Analyzing)?;
                ctx.register_intent(intent("AAPL", dec!(0.10), "momentum", dec!(0.8)))?;
                ctx.register_intent(intent("AAPL", dec!(0.15), "mean_reversion", dec!(0.9)))?;
                Ok::<_, AtomicExecutionError>(ctx.detect_conflicts())
            }
            .boxed()
        })
        .await
        .unwrap();

    assert_eq!(resolutions.len(), 1);
    let aapl = &resolutions[0];
    assert_eq!(aapl.resolution_method, ResolutionMethod::ConfidenceWeighted);
    assert_eq!(aapl.final_allocation.round_dp(4), dec!(0.1265));
    assert_eq!(aapl.confidence, dec!(0.85));
    assert_eq!(ctx.state(), ExecutionState::Completed);
}

#[tokio::test]
async fn opposing_intents_net_out_with_penalty() {
    let gate = ExecutionGate::new();
    let mut ctx = context(&gate);

    let resolutions = ctx
        .run_atomic(ExecutionId::new("run-1"), |ctx| {
            async move {
                ctx.transition_to(ExecutionState::Analyzing)?;
                ctx.register_intent(intent("TSLA", dec!(0.08), "momentum", dec!(0.6)))?;
                ctx.register_intent(intent("TSLA", dec!(-0.05), "value", dec!(0.8)))?;
                Ok::<_, AtomicExecutionError>(ctx.detect_conflicts())
            }
            .boxed()
        })
        .await
        .unwrap();

    let tsla = &resolutions[0];
    assert_eq!(tsla.resolution_method, ResolutionMethod::NetOpposing);
    assert_eq!(tsla.final_allocation, dec!(0.03));
    assert!(tsla.confidence <= dec!(0.7));
    assert!(!tsla.warnings.is_empty());
}

#[tokio::test]
async fn over_allocated_portfolio_scales_to_target() {
    let gate = ExecutionGate::new();
    let mut ctx = context(&gate);

    let portfolio = ctx
        .run_atomic(ExecutionId::new("run-1"), |ctx| {
            async move {
                ctx.transition_to(ExecutionState::Analyzing)?;
                ctx.register_intent(intent("AAPL", dec!(0.6), "growth", dec!(0.9)))?;
                ctx.register_intent(intent("MSFT", dec!(0.6), "growth", dec!(0.9)))?;
                ctx.register_intent(intent("DUST", dec!(0.0005), "growth", dec!(0.9)))?;
                Ok::<_, AtomicExecutionError>(ctx.consolidated_portfolio())
            }
            .boxed()
        })
        .await
        .unwrap();

    assert!(!portfolio.contains_key(&Symbol::new("DUST")));
    let gross: Decimal = portfolio.values().map(|a| a.abs()).sum();
    assert_eq!(gross.round_dp(10), dec!(0.98));
    assert_eq!(
        portfolio[&Symbol::new("AAPL")].round_dp(10),
        portfolio[&Symbol::new("MSFT")].round_dp(10)
    );
}

#[tokio::test]
async fn concurrent_run_fails_immediately() {
    let gate = ExecutionGate::new();
    let (acquired_tx, acquired_rx) = oneshot::channel::<()>();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let mut first = context(&gate);
    let running = tokio::spawn(async move {
        first
            .run_atomic(ExecutionId::new("run-a"), move |ctx| {
                async move {
                    ctx.transition_to(ExecutionState::Analyzing)?;
                    let _ = acquired_tx.send(());
                    let _ = release_rx.await;
                    Ok::<_, AtomicExecutionError>(())
                }
                .boxed()
            })
            .await
    });
    acquired_rx.await.unwrap();

    let mut second = context(&gate);
    let rejected = second
        .run_atomic(ExecutionId::new("run-b"), |_| async { Ok(()) }.boxed())
        .await;

    assert!(matches!(
        rejected,
        Err(AtomicExecutionError::AlreadyRunning { ref active, .. }) if *active == ExecutionId::new("run-a")
    ));

    release_tx.send(()).unwrap();
    running.await.unwrap().unwrap();
    assert_eq!(gate.active_execution(), None);

    let mut third = context(&gate);
    assert!(
        third
            .run_atomic(ExecutionId::new("run-c"), |_| async { Ok(()) }.boxed())
            .await
            .is_ok()
    );
}

#[tokio::test(start_paused = true)]
async fn rebalance_places_and_monitors_orders_inside_a_run() {
    let config = Arc::new(ExecutionConfig::default());
    let broker = Arc::new(MockBroker::new());
    broker.set_fill_limits_on_place(true);
    let rest = Arc::new(MockQuoteSource::new());
    rest.set_quote(Quote::new(Symbol::new("AAPL"), dec!(200), dec!(200.10), dec!(0), dec!(0)));
    let quotes = Arc::new(FallbackQuoteProvider::rest_only(
        Arc::clone(&rest) as Arc<dyn QuoteSource>,
        Arc::clone(&config),
    ));
    let strategy = SmartExecutionStrategy::new(Arc::clone(&broker), quotes, Arc::clone(&config));
    let monitor = OrderMonitor::new(config);

    let gate = ExecutionGate::new();
    let mut ctx = context(&gate);

    let orders = ctx
        .run_atomic(ExecutionId::new("run-1"), move |ctx| {
            async move {
                let mut strategy = strategy;
                ctx.transition_to(ExecutionState::Analyzing)?;
                ctx.register_intent(intent("AAPL", dec!(0.10), "momentum", dec!(0.8)))?;
                let portfolio = ctx.consolidated_portfolio();
                ctx.transition_to(ExecutionState::Executing)?;

                let correlation_id = CorrelationId::new("run-1");
                let mut placed = Vec::new();
                if portfolio.contains_key(&Symbol::new("AAPL")) {
                    let request =
                        OrderRequest::new("AAPL", OrderSide::Buy, dec!(5), correlation_id.clone())
                            .map_err(|e| AtomicExecutionError::Execution { message: e.to_string() })?;
                    let result = strategy.place_order(request.clone()).await;
                    placed.push(PhaseOrder::from_result(&request, &result));
                }
                let orders = monitor
                    .monitor_phase(&mut strategy, PhaseType::Buy, placed, &correlation_id)
                    .await;

                ctx.transition_to(ExecutionState::Settling)?;
                Ok::<_, AtomicExecutionError>(orders)
            }
            .boxed()
        })
        .await
        .unwrap();

    assert_eq!(orders.len(), 1);
    assert!(orders[0].success);
    assert!(broker.market_orders().is_empty());
    assert_eq!(ctx.state(), ExecutionState::Completed);
    assert_eq!(gate.active_execution(), None);
}
