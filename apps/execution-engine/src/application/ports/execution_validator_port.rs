//! Execution Validator Port (Driven Port)
//!
//! Preflight check run before an order is priced.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::shared::{CorrelationId, Symbol};

/// Outcome of a preflight check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationOutcome {
    /// Whether the order may proceed.
    pub is_valid: bool,
    /// Quantity to use instead of the requested one.
    pub adjusted_quantity: Option<Decimal>,
    /// Non-fatal notes.
    pub warnings: Vec<String>,
    /// Rejection reason when invalid.
    pub error: Option<String>,
}

impl ValidationOutcome {
    /// Order may proceed unchanged.
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }

    /// Order may proceed with a different quantity.
    #[must_use]
    pub fn adjusted(quantity: Decimal, warning: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            adjusted_quantity: Some(quantity),
            warnings: vec![warning.into()],
            error: None,
        }
    }

    /// Order must not be placed.
    #[must_use]
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Port for preflight order validation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionValidatorPort: Send + Sync {
    /// Validate (and possibly adjust) an order before it is priced.
    async fn validate(
        &self,
        symbol: &Symbol,
        quantity: Decimal,
        correlation_id: &CorrelationId,
    ) -> ValidationOutcome;
}
