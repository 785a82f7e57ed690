//! Application Services
//!
//! Services that drive the broker and quote ports: order placement, the
//! repeg loop, phase monitoring and atomic rebalance runs.

mod atomic_execution;
mod broker_calls;
mod order_monitor;
mod repeg_manager;
mod smart_execution;

pub use atomic_execution::{
    AtomicExecutionContext, AtomicExecutionError, ExecutionGate, GateGuard, StateTransition,
};
pub use order_monitor::{OrderMonitor, PhaseExecutor, PhaseOrder, PhaseType};
pub use repeg_manager::{MARKET_ESCALATION_TAG, RepegAction, RepegManager, RepegOutcome};
pub use smart_execution::{
    DEFERRED_MARKET_OPEN_TAG, EXTENDED_HOURS_TAG, MARKET_FALLBACK_TAG, SMART_LIMIT_TAG,
    SmartExecutionStrategy, VALIDATION_FAILED_TAG,
};
