//! Preflight Validation Adapters
//!
//! Implementations of `ExecutionValidatorPort`.

mod fractionability;

pub use fractionability::FractionabilityValidator;
