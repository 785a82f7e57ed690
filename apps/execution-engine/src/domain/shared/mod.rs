//! Shared Domain Types
//!
//! Value objects and errors shared across bounded contexts.

pub mod errors;
pub mod money;
pub mod value_objects;

pub use errors::DomainError;
pub use money::{MIN_PRICE, quantize_price};
pub use value_objects::{BrokerOrderId, CorrelationId, ExecutionId, Symbol};
