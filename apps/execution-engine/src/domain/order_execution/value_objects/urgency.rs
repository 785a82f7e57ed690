//! Execution urgency.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How strongly an order prefers completion over price.
///
/// `High` urgency allows a market-order fallback when no usable quote or
/// price can be obtained; lower urgencies fail the request instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    /// Optimize for price.
    Low,
    /// Balance price and completion.
    #[default]
    Normal,
    /// Prioritize completion.
    High,
}

impl Urgency {
    /// Returns true if a market order may replace an unpriceable limit order.
    #[must_use]
    pub const fn allows_market_fallback(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Normal => write!(f, "NORMAL"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_high_urgency_allows_market_fallback() {
        assert!(!Urgency::Low.allows_market_fallback());
        assert!(!Urgency::Normal.allows_market_fallback());
        assert!(Urgency::High.allows_market_fallback());
    }

    #[test]
    fn urgency_serde() {
        let parsed: Urgency = serde_json::from_str("\"HIGH\"").unwrap();
        assert_eq!(parsed, Urgency::High);
    }
}
