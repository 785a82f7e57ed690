//! Whole-share enforcement for symbols that cannot be traded fractionally.

use std::collections::HashSet;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::application::ports::{ExecutionValidatorPort, ValidationOutcome};
use crate::config::ExecutionConfig;
use crate::domain::shared::{CorrelationId, Symbol};

/// Floors quantities to whole shares for non-fractionable symbols.
#[derive(Debug, Clone, Default)]
pub struct FractionabilityValidator {
    non_fractionable: HashSet<String>,
}

impl FractionabilityValidator {
    /// Create a validator for the given non-fractionable symbols.
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            non_fractionable: symbols
                .into_iter()
                .map(|s| s.as_ref().to_ascii_uppercase())
                .collect(),
        }
    }

    /// Create a validator from `non_fractionable_symbols`.
    #[must_use]
    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self::new(&config.non_fractionable_symbols)
    }

    fn is_fractionable(&self, symbol: &Symbol) -> bool {
        !self
            .non_fractionable
            .contains(&symbol.as_str().to_ascii_uppercase())
    }

    fn check(&self, symbol: &Symbol, quantity: Decimal) -> ValidationOutcome {
        if quantity <= Decimal::ZERO {
            return ValidationOutcome::rejected(format!("quantity must be positive, got {quantity}"));
        }
        if self.is_fractionable(symbol) {
            return ValidationOutcome::accepted();
        }

        let whole = quantity.floor();
        if whole.is_zero() {
            return ValidationOutcome::rejected(format!(
                "{symbol} is not fractionable and {quantity} rounds down to zero shares"
            ));
        }
        if whole == quantity {
            return ValidationOutcome::accepted();
        }
        ValidationOutcome::adjusted(
            whole,
            format!("{symbol} is not fractionable, quantity {quantity} floored to {whole}"),
        )
    }
}

#[async_trait]
impl ExecutionValidatorPort for FractionabilityValidator {
    async fn validate(
        &self,
        symbol: &Symbol,
        quantity: Decimal,
        correlation_id: &CorrelationId,
    ) -> ValidationOutcome {
        let outcome = self.check(symbol, quantity);
        if !outcome.is_valid {
            tracing::debug!(
                symbol = %symbol,
                quantity = %quantity,
                correlation_id = %correlation_id,
                error = ?outcome.error,
                "Preflight rejected order"
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn validator() -> FractionabilityValidator {
        FractionabilityValidator::new(["brk.a", "XYZ"])
    }

    async fn validate(symbol: &str, quantity: Decimal) -> ValidationOutcome {
        validator()
            .validate(&Symbol::new(symbol), quantity, &CorrelationId::new("corr-1"))
            .await
    }

    #[tokio::test]
    async fn fractionable_symbols_pass_unchanged() {
        let outcome = validate("AAPL", dec!(2.5)).await;
        assert_eq!(outcome, ValidationOutcome::accepted());
    }

    #[tokio::test]
    async fn fractional_quantity_is_floored() {
        let outcome = validate("BRK.A", dec!(3.7)).await;
        assert!(outcome.is_valid);
        assert_eq!(outcome.adjusted_quantity, Some(dec!(3)));
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[tokio::test]
    async fn whole_quantity_is_accepted() {
        let outcome = validate("XYZ", dec!(4)).await;
        assert_eq!(outcome, ValidationOutcome::accepted());
    }

    #[test_case(dec!(0.4) ; "floors to zero")]
    #[test_case(dec!(0) ; "zero")]
    #[test_case(dec!(-1) ; "negative")]
    fn unusable_quantities_are_rejected(quantity: Decimal) {
        let outcome = validator().check(&Symbol::new("XYZ"), quantity);
        assert!(!outcome.is_valid);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn from_config_reads_symbol_list() {
        let config = ExecutionConfig {
            non_fractionable_symbols: vec!["ABC".to_string()],
            ..ExecutionConfig::default()
        };
        let validator = FractionabilityValidator::from_config(&config);
        assert!(!validator.is_fractionable(&Symbol::new("abc")));
        assert!(validator.is_fractionable(&Symbol::new("AAPL")));
    }
}
