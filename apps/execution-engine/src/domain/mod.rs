//! Domain Layer
//!
//! Pure business logic with no I/O. Ports in the application layer feed it
//! broker and quote data.
//!
//! # Bounded Contexts
//!
//! - [`order_execution`]: order requests and results
//! - [`pricing`]: quotes, liquidity analysis and limit-price computation
//! - [`order_tracking`]: per-chain state for resting orders
//! - [`portfolio_coordination`]: intent conflict resolution and run state

pub mod order_execution;
pub mod order_tracking;
pub mod portfolio_coordination;
pub mod pricing;
pub mod shared;
