//! Coordination policy value object.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::shared::Symbol;

/// Limits applied when merging strategy intents into one portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinationPolicy {
    /// Cap on a same-sign resolved allocation (by magnitude).
    pub max_concentration: Decimal,
    /// Confidence multiplier when strategies disagree in sign.
    pub opposing_confidence_penalty: Decimal,
    /// Allocations below this magnitude are dropped.
    pub min_allocation: Decimal,
    /// Gross allocation after scaling down an over-allocated portfolio.
    pub over_allocation_target: Decimal,
    /// Gross allocation below which the residual goes to cash.
    pub under_allocation_threshold: Decimal,
    /// Symbol receiving unallocated residual.
    pub cash_symbol: Symbol,
}

impl Default for CoordinationPolicy {
    fn default() -> Self {
        Self {
            max_concentration: dec!(0.15),
            opposing_confidence_penalty: dec!(0.7),
            min_allocation: dec!(0.001),
            over_allocation_target: dec!(0.98),
            under_allocation_threshold: dec!(0.95),
            cash_symbol: Symbol::new("BIL"),
        }
    }
}
