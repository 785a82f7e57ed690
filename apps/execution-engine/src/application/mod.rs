//! Application Layer
//!
//! Orchestrates the domain through driven ports.
//!
//! - **Ports**: interfaces to the broker, quote sources, preflight validation
//!   and the market clock
//! - **Services**: smart order placement, repegging, phase monitoring and
//!   atomic multi-strategy runs

pub mod ports;
pub mod services;

pub use ports::*;
pub use services::*;
