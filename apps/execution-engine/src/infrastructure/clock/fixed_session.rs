//! Weekday session clock with fixed UTC open and close times.
//!
//! Holidays and early closes are not modelled.

use chrono::{DateTime, Datelike, Utc, Weekday};

use crate::application::ports::MarketClockPort;
use crate::config::SessionConfig;

/// Regular session open Monday to Friday between the configured times.
#[derive(Debug, Clone, Default)]
pub struct FixedSessionClock {
    session: SessionConfig,
}

impl FixedSessionClock {
    /// Create a clock for the given session hours.
    #[must_use]
    pub const fn new(session: SessionConfig) -> Self {
        Self { session }
    }
}

impl MarketClockPort for FixedSessionClock {
    fn session_open(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
            return None;
        }
        let date = now.date_naive();
        let open = date.and_time(self.session.open_time_utc).and_utc();
        let close = date.and_time(self.session.close_time_utc).and_utc();
        (open <= now && now < close).then_some(open)
    }
}
