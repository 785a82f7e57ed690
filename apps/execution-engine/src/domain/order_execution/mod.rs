//! Order Execution Bounded Context
//!
//! Order intents coming into the engine and the results going out.
//!
//! # Key Concepts
//!
//! - **OrderRequest**: validated, immutable "buy/sell N shares of X"
//! - **OrderResult**: one immutable record per placement, repeg or escalation

pub mod order_request;
pub mod order_result;
pub mod value_objects;

pub use order_request::OrderRequest;
pub use order_result::OrderResult;
pub use value_objects::{OrderSide, OrderStatus, TimeInForce, Urgency};
