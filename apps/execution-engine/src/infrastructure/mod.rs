//! Infrastructure Layer
//!
//! Adapters implementing the application ports:
//!
//! - `broker/`: in-memory scriptable broker
//! - `quotes/`: streaming-first quote provider with REST fallback
//! - `validation/`: preflight fractionability checks
//! - `clock/`: fixed-hours market session clock

pub mod broker;
pub mod clock;
pub mod quotes;
pub mod validation;
