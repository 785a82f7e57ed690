//! Market Clock Port (Driven Port)

use chrono::{DateTime, Utc};

/// Port for regular-session timing.
pub trait MarketClockPort: Send + Sync {
    /// Open time of the regular session containing `now`, if the market is
    /// open at `now`.
    fn session_open(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>>;
}
