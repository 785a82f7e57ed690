// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Smart Execution Engine
//!
//! Limit-order execution with liquidity-aware pricing, a repeg loop that
//! walks unfilled orders toward the opposite touch and escalates to market,
//! and single-flight multi-strategy rebalance runs.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: pure logic, no I/O
//!   - `order_execution`: order requests, results, side/status/urgency
//!   - `pricing`: quotes, inside-spread and repeg pricing, liquidity analysis
//!   - `order_tracking`: in-memory state of orders under repeg management
//!   - `portfolio_coordination`: run state machine, conflict resolution,
//!     portfolio consolidation
//!
//! - **Application**: ports and the services that drive them
//!   - `ports`: `BrokerPort`, `QuoteProviderPort`, `ExecutionValidatorPort`,
//!     `MarketClockPort`
//!   - `services`: `SmartExecutionStrategy`, `RepegManager`, `OrderMonitor`,
//!     `AtomicExecutionContext`
//!
//! - **Infrastructure**: adapters
//!   - `broker`: scriptable in-memory broker
//!   - `quotes`: streaming-first quote provider with REST fallback
//!   - `validation`: fractionability preflight
//!   - `clock`: fixed-hours session clock
//!
//! `config` loads YAML settings and `telemetry` installs the tracing
//! subscriber.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Ports and services.
pub mod application;

/// Infrastructure layer - Adapters.
pub mod infrastructure;

/// Configuration loading and validation.
pub mod config;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::order_execution::{
    OrderRequest, OrderResult, OrderSide, OrderStatus, TimeInForce, Urgency,
};
pub use domain::order_tracking::OrderTracker;
pub use domain::portfolio_coordination::{ConflictResolution, ExecutionState, PositionIntent};
pub use domain::pricing::{PricingCalculator, Quote};
pub use domain::shared::{BrokerOrderId, CorrelationId, ExecutionId, Symbol};

// Application re-exports
pub use application::ports::{
    BrokerError, BrokerPort, ExecutionValidatorPort, MarketClockPort, QuoteError,
    QuoteProviderPort,
};
pub use application::services::{
    AtomicExecutionContext, AtomicExecutionError, ExecutionGate, OrderMonitor, PhaseOrder,
    PhaseType, RepegManager, SmartExecutionStrategy,
};

// Infrastructure re-exports
pub use infrastructure::broker::MockBroker;
pub use infrastructure::clock::FixedSessionClock;
pub use infrastructure::quotes::{FallbackQuoteProvider, MockQuoteSource, QuoteSource};
pub use infrastructure::validation::FractionabilityValidator;

// Configuration re-exports
pub use config::{Config, ConfigError, ExecutionConfig, load_config};
