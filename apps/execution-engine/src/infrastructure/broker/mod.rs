//! Broker Adapters
//!
//! Implementations of `BrokerPort`.

pub mod mock;

pub use mock::{BrokerCall, MockBroker};
