//! Conflict resolution value object.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::Symbol;

/// How a symbol's final allocation was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Only one strategy had an opinion.
    SingleIntent,
    /// Strategies disagreed in sign; allocations were netted.
    NetOpposing,
    /// Strategies agreed in sign; confidence-weighted average.
    ConfidenceWeighted,
}

impl ResolutionMethod {
    /// Stable tag for logs and reports.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::SingleIntent => "single_intent",
            Self::NetOpposing => "net_opposing",
            Self::ConfidenceWeighted => "confidence_weighted",
        }
    }
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Final allocation for one symbol after reconciling strategy intents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResolution {
    /// Symbol.
    pub symbol: Symbol,
    /// Signed allocation.
    pub final_allocation: Decimal,
    /// Strategies that contributed.
    pub contributing_strategies: Vec<String>,
    /// Resolution method.
    pub resolution_method: ResolutionMethod,
    /// Resolved confidence.
    pub confidence: Decimal,
    /// Human-readable warnings.
    pub warnings: Vec<String>,
}

impl ConflictResolution {
    /// Whether more than one strategy was involved.
    #[must_use]
    pub fn is_contested(&self) -> bool {
        self.contributing_strategies.len() > 1
    }
}
