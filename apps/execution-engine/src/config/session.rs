//! Regular trading session configuration.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Regular session hours in UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session open (UTC).
    #[serde(default = "default_open_time_utc")]
    pub open_time_utc: NaiveTime,
    /// Session close (UTC).
    #[serde(default = "default_close_time_utc")]
    pub close_time_utc: NaiveTime,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            open_time_utc: default_open_time_utc(),
            close_time_utc: default_close_time_utc(),
        }
    }
}

fn default_open_time_utc() -> NaiveTime {
    NaiveTime::from_hms_opt(13, 30, 0).unwrap_or(NaiveTime::MIN)
}

fn default_close_time_utc() -> NaiveTime {
    NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN)
}
