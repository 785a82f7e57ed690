//! Portfolio Coordination Bounded Context
//!
//! Pure logic behind an atomic multi-strategy rebalance: the run state
//! machine, conflict resolution between strategy intents and portfolio
//! consolidation.

pub mod errors;
pub mod services;
pub mod value_objects;

pub use errors::ConflictError;
pub use services::{ConflictResolver, PortfolioConsolidator};
pub use value_objects::{
    ConflictResolution, CoordinationPolicy, ExecutionState, PositionIntent, ResolutionMethod,
};
