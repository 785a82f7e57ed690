//! Atomic multi-strategy execution configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::portfolio_coordination::CoordinationPolicy;
use crate::domain::shared::Symbol;

/// Atomic execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomicConfig {
    /// Ceiling on one atomic run (seconds).
    #[serde(default = "default_run_timeout_seconds")]
    pub run_timeout_seconds: u64,
    /// Maximum single-position concentration for same-sign resolutions.
    #[serde(default = "default_max_concentration")]
    pub max_concentration: Decimal,
    /// Confidence multiplier applied when strategies disagree in sign.
    #[serde(default = "default_opposing_confidence_penalty")]
    pub opposing_confidence_penalty: Decimal,
    /// Allocations below this magnitude are dropped.
    #[serde(default = "default_min_allocation")]
    pub min_allocation: Decimal,
    /// Gross allocation after scaling down an over-allocated portfolio.
    #[serde(default = "default_over_allocation_target")]
    pub over_allocation_target: Decimal,
    /// Gross allocation below which the residual goes to the cash proxy.
    #[serde(default = "default_under_allocation_threshold")]
    pub under_allocation_threshold: Decimal,
    /// Cash-proxy symbol.
    #[serde(default = "default_cash_symbol")]
    pub cash_symbol: String,
}

impl Default for AtomicConfig {
    fn default() -> Self {
        Self {
            run_timeout_seconds: default_run_timeout_seconds(),
            max_concentration: default_max_concentration(),
            opposing_confidence_penalty: default_opposing_confidence_penalty(),
            min_allocation: default_min_allocation(),
            over_allocation_target: default_over_allocation_target(),
            under_allocation_threshold: default_under_allocation_threshold(),
            cash_symbol: default_cash_symbol(),
        }
    }
}

impl AtomicConfig {
    /// Coordination policy for the conflict resolver and consolidator.
    #[must_use]
    pub fn coordination_policy(&self) -> CoordinationPolicy {
        CoordinationPolicy {
            max_concentration: self.max_concentration,
            opposing_confidence_penalty: self.opposing_confidence_penalty,
            min_allocation: self.min_allocation,
            over_allocation_target: self.over_allocation_target,
            under_allocation_threshold: self.under_allocation_threshold,
            cash_symbol: Symbol::new(self.cash_symbol.as_str()),
        }
    }
}

const fn default_run_timeout_seconds() -> u64 {
    300
}

const fn default_max_concentration() -> Decimal {
    dec!(0.15)
}

const fn default_opposing_confidence_penalty() -> Decimal {
    dec!(0.7)
}

const fn default_min_allocation() -> Decimal {
    dec!(0.001)
}

const fn default_over_allocation_target() -> Decimal {
    dec!(0.98)
}

const fn default_under_allocation_threshold() -> Decimal {
    dec!(0.95)
}

fn default_cash_symbol() -> String {
    "BIL".to_string()
}
