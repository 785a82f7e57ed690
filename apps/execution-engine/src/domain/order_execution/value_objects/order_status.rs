//! Broker-reported order status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status as reported by the broker's completion check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order received by the broker, not yet working.
    New,
    /// Order accepted and resting in the book.
    Accepted,
    /// Order partially filled and still working.
    PartiallyFilled,
    /// Order completely filled.
    Filled,
    /// Cancel request submitted, awaiting confirmation.
    PendingCancel,
    /// Replace request submitted, awaiting confirmation.
    PendingReplace,
    /// Order canceled.
    Canceled,
    /// Order rejected by broker.
    Rejected,
    /// Order expired (e.g., Day order at market close).
    Expired,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Canceled | Self::Rejected | Self::Expired
        )
    }

    /// Returns true if the order ended without completing (cancel, reject, expire).
    ///
    /// Such orders may leave an unfilled remainder that has to be escalated.
    #[must_use]
    pub const fn is_unfilled_terminal(&self) -> bool {
        matches!(self, Self::Canceled | Self::Rejected | Self::Expired)
    }

    /// Returns true if the order is still active (can be filled or canceled).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            Self::New
                | Self::Accepted
                | Self::PartiallyFilled
                | Self::PendingCancel
                | Self::PendingReplace
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            Self::Filled => write!(f, "FILLED"),
            Self::PendingCancel => write!(f, "PENDING_CANCEL"),
            Self::PendingReplace => write!(f, "PENDING_REPLACE"),
            Self::Canceled => write!(f, "CANCELED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}
