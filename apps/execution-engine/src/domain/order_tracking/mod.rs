//! Order Tracking Bounded Context
//!
//! Per-chain state for orders resting at the broker: repeg count, anchor
//! price history and cumulative fills.

pub mod errors;
mod tracked_order;
mod tracker;

pub use errors::TrackerError;
pub use tracked_order::TrackedOrder;
pub use tracker::OrderTracker;
