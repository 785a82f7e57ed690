//! Order request value object.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value_objects::{OrderSide, Urgency};
use crate::domain::shared::{CorrelationId, DomainError, Symbol};

/// A validated intent to buy or sell a quantity of one symbol.
///
/// Immutable once constructed: the quantity is strictly positive and the side
/// has already been normalized to its canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    symbol: Symbol,
    side: OrderSide,
    quantity: Decimal,
    correlation_id: CorrelationId,
    urgency: Urgency,
    is_complete_exit: bool,
}

impl OrderRequest {
    /// Create a new order request.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` if the symbol is malformed or the
    /// quantity is not strictly positive.
    pub fn new(
        symbol: impl Into<Symbol>,
        side: OrderSide,
        quantity: Decimal,
        correlation_id: CorrelationId,
    ) -> Result<Self, DomainError> {
        let symbol = symbol.into();
        symbol.validate()?;

        if quantity <= Decimal::ZERO {
            return Err(DomainError::invalid_value(
                "quantity",
                format!("quantity must be positive, got {quantity}"),
            ));
        }

        Ok(Self {
            symbol,
            side,
            quantity,
            correlation_id,
            urgency: Urgency::Normal,
            is_complete_exit: false,
        })
    }

    /// Create a request from an untyped side string ("buy", "SELL", ...).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` for an unknown side, a malformed
    /// symbol, or a non-positive quantity.
    pub fn parse(
        symbol: &str,
        side: &str,
        quantity: Decimal,
        correlation_id: CorrelationId,
    ) -> Result<Self, DomainError> {
        Self::new(symbol, side.parse()?, quantity, correlation_id)
    }

    /// Set the urgency.
    #[must_use]
    pub const fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Mark this request as closing the whole position.
    #[must_use]
    pub const fn as_complete_exit(mut self) -> Self {
        self.is_complete_exit = true;
        self
    }

    /// Copy of this request for a different (positive) quantity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` if the quantity is not positive.
    pub fn with_quantity(&self, quantity: Decimal) -> Result<Self, DomainError> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::invalid_value(
                "quantity",
                format!("quantity must be positive, got {quantity}"),
            ));
        }
        Ok(Self {
            quantity,
            ..self.clone()
        })
    }

    /// Symbol to trade.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Order side.
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Requested quantity (strictly positive).
    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Correlation ID.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Urgency level.
    #[must_use]
    pub const fn urgency(&self) -> Urgency {
        self.urgency
    }

    /// Whether this request closes the whole position.
    #[must_use]
    pub const fn is_complete_exit(&self) -> bool {
        self.is_complete_exit
    }
}
