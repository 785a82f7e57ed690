//! Position intent value object.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::portfolio_coordination::errors::ConflictError;
use crate::domain::shared::Symbol;

/// One strategy's desired allocation for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionIntent {
    symbol: Symbol,
    target_allocation: Decimal,
    strategy_name: String,
    confidence: Decimal,
}

impl PositionIntent {
    /// Create a new intent.
    ///
    /// `target_allocation` is a signed fraction of the portfolio (negative is
    /// short).
    ///
    /// # Errors
    ///
    /// Returns an error if the allocation magnitude exceeds 1, the confidence
    /// is outside [0, 1] or the strategy name is empty.
    pub fn new(
        symbol: impl Into<Symbol>,
        target_allocation: Decimal,
        strategy_name: impl Into<String>,
        confidence: Decimal,
    ) -> Result<Self, ConflictError> {
        let symbol = symbol.into();
        let strategy_name = strategy_name.into();

        if strategy_name.trim().is_empty() {
            return Err(ConflictError::EmptyStrategyName);
        }
        if target_allocation.abs() > Decimal::ONE {
            return Err(ConflictError::AllocationOutOfRange {
                symbol: symbol.to_string(),
                allocation: target_allocation,
            });
        }
        if confidence < Decimal::ZERO || confidence > Decimal::ONE {
            return Err(ConflictError::InvalidConfidence {
                strategy: strategy_name,
                confidence,
            });
        }

        Ok(Self {
            symbol,
            target_allocation,
            strategy_name,
            confidence,
        })
    }

    /// Symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Signed target allocation.
    #[must_use]
    pub const fn target_allocation(&self) -> Decimal {
        self.target_allocation
    }

    /// Contributing strategy.
    #[must_use]
    pub fn strategy_name(&self) -> &str {
        &self.strategy_name
    }

    /// Confidence in [0, 1].
    #[must_use]
    pub const fn confidence(&self) -> Decimal {
        self.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn intent_accepts_short_allocation() {
        let intent = PositionIntent::new("tsla", dec!(-0.05), "momentum", dec!(0.6)).unwrap();
        assert_eq!(intent.symbol().as_str(), "TSLA");
        assert_eq!(intent.target_allocation(), dec!(-0.05));
    }

    #[test]
    fn intent_rejects_bad_confidence() {
        assert!(matches!(
            PositionIntent::new("AAPL", dec!(0.1), "s", dec!(1.1)),
            Err(ConflictError::InvalidConfidence { .. })
        ));
        assert!(matches!(
            PositionIntent::new("AAPL", dec!(0.1), "s", dec!(-0.1)),
            Err(ConflictError::InvalidConfidence { .. })
        ));
    }

    #[test]
    fn intent_rejects_oversized_allocation_and_blank_strategy() {
        assert!(PositionIntent::new("AAPL", dec!(1.5), "s", dec!(0.5)).is_err());
        assert_eq!(
            PositionIntent::new("AAPL", dec!(0.1), " ", dec!(0.5)),
            Err(ConflictError::EmptyStrategyName)
        );
    }
}
