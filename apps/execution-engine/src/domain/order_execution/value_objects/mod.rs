//! Order Execution Value Objects
//!
//! Immutable types for order management.

mod order_side;
mod order_status;
mod time_in_force;
mod urgency;

pub use order_side::OrderSide;
pub use order_status::OrderStatus;
pub use time_in_force::TimeInForce;
pub use urgency::Urgency;
