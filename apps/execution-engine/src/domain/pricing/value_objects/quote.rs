//! Quote snapshot.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::Symbol;

/// Top-of-book quote snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Best bid price.
    pub bid: Decimal,
    /// Best ask price.
    pub ask: Decimal,
    /// Bid size (shares).
    pub bid_size: Decimal,
    /// Ask size (shares).
    pub ask_size: Decimal,
    /// Quote timestamp.
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Create a new quote stamped with the current time.
    #[must_use]
    pub fn new(
        symbol: Symbol,
        bid: Decimal,
        ask: Decimal,
        bid_size: Decimal,
        ask_size: Decimal,
    ) -> Self {
        Self {
            symbol,
            bid,
            ask,
            bid_size,
            ask_size,
            timestamp: Utc::now(),
        }
    }

    /// Override the quote timestamp.
    #[must_use]
    pub const fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Get the mid price.
    #[must_use]
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }

    /// Get the spread.
    #[must_use]
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }

    /// Spread as a percentage of mid (0.5 means 0.5%).
    #[must_use]
    pub fn spread_percent(&self) -> Option<Decimal> {
        let mid = self.mid();
        if mid <= Decimal::ZERO {
            return None;
        }
        Some(self.spread() / mid * Decimal::ONE_HUNDRED)
    }

    /// Both sides positive and not crossed.
    #[must_use]
    pub fn has_valid_prices(&self) -> bool {
        self.bid > Decimal::ZERO && self.ask > Decimal::ZERO && self.ask >= self.bid
    }

    /// Age of the quote relative to `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(bid: Decimal, ask: Decimal) -> Quote {
        Quote::new(Symbol::new("AAPL"), bid, ask, dec!(100), dec!(200))
    }

    #[test]
    fn quote_mid_and_spread() {
        let q = quote(dec!(150), dec!(151));
        assert_eq!(q.mid(), dec!(150.5));
        assert_eq!(q.spread(), dec!(1));
    }

    #[test]
    fn quote_spread_percent() {
        let q = quote(dec!(100), dec!(101));
        let pct = q.spread_percent().unwrap();
        // 1 / 100.5 * 100 ≈ 0.995
        assert!(pct > dec!(0.99) && pct < dec!(1.0));
    }

    #[test]
    fn quote_spread_percent_zero_mid() {
        assert!(quote(Decimal::ZERO, Decimal::ZERO).spread_percent().is_none());
    }

    #[test]
    fn quote_validity() {
        assert!(quote(dec!(100), dec!(100)).has_valid_prices());
        assert!(!quote(dec!(101), dec!(100)).has_valid_prices());
        assert!(!quote(Decimal::ZERO, dec!(100)).has_valid_prices());
    }

    #[test]
    fn quote_age() {
        let now = Utc::now();
        let q = quote(dec!(1), dec!(2)).at(now - TimeDelta::seconds(7));
        assert_eq!(q.age(now), TimeDelta::seconds(7));
    }
}
