//! Application Ports (Driven)
//!
//! Interfaces to the brokerage, quote sources, preflight validation and
//! the market clock. Adapters live in the infrastructure layer.

mod broker_port;
mod execution_validator_port;
mod market_clock_port;
mod quote_provider_port;

pub use broker_port::{
    BrokerError, BrokerPort, ExecutionReport, LimitOrderRequest, OrderPlacement,
    parse_available_quantity,
};
#[cfg(test)]
pub use execution_validator_port::MockExecutionValidatorPort;
pub use execution_validator_port::{ExecutionValidatorPort, ValidationOutcome};
pub use market_clock_port::MarketClockPort;
pub use quote_provider_port::{QuoteError, QuoteProviderPort, ValidatedQuote};
