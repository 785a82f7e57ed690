//! Atomic execution state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::shared::DomainError;

/// Lifecycle of one atomic rebalance run.
///
/// IDLE → PREPARING → ANALYZING → EXECUTING → SETTLING → COMPLETED, with
/// FAILED and ABORTED reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    /// No run in progress.
    #[default]
    Idle,
    /// Lock acquired, run starting.
    Preparing,
    /// Collecting strategy intents.
    Analyzing,
    /// Placing and monitoring orders.
    Executing,
    /// Waiting for final fills.
    Settling,
    /// Run finished successfully.
    Completed,
    /// Run failed.
    Failed,
    /// Run aborted by its deadline.
    Aborted,
}

impl ExecutionState {
    /// Whether the run is over.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Aborted)
    }

    /// Whether strategy intents may be registered.
    #[must_use]
    pub const fn accepts_intents(&self) -> bool {
        matches!(self, Self::Analyzing | Self::Executing)
    }

    const fn ordinal(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Preparing => 1,
            Self::Analyzing => 2,
            Self::Executing => 3,
            Self::Settling => 4,
            Self::Completed => 5,
            Self::Failed | Self::Aborted => 6,
        }
    }

    /// Check if a transition is valid.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match to {
            Self::Failed | Self::Aborted => true,
            Self::Idle => false,
            _ => to.ordinal() > self.ordinal(),
        }
    }

    /// Validate a transition.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` for backward moves and
    /// any move out of a terminal state.
    pub fn validate_transition(self, to: Self) -> Result<(), DomainError> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(DomainError::InvalidStateTransition {
                entity: "AtomicExecution".to_string(),
                from: self.to_string(),
                to: to.to_string(),
                reason: if self.is_terminal() {
                    format!("run already {self}")
                } else {
                    "execution state only moves forward".to_string()
                },
            })
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Preparing => "PREPARING",
            Self::Analyzing => "ANALYZING",
            Self::Executing => "EXECUTING",
            Self::Settling => "SETTLING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Aborted => "ABORTED",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ExecutionState::Idle, ExecutionState::Preparing ; "idle to preparing")]
    #[test_case(ExecutionState::Preparing, ExecutionState::Analyzing ; "preparing to analyzing")]
    #[test_case(ExecutionState::Analyzing, ExecutionState::Executing ; "analyzing to executing")]
    #[test_case(ExecutionState::Executing, ExecutionState::Settling ; "executing to settling")]
    #[test_case(ExecutionState::Settling, ExecutionState::Completed ; "settling to completed")]
    #[test_case(ExecutionState::Analyzing, ExecutionState::Settling ; "skip executing")]
    #[test_case(ExecutionState::Idle, ExecutionState::Failed ; "idle to failed")]
    #[test_case(ExecutionState::Executing, ExecutionState::Aborted ; "executing to aborted")]
    fn valid_transitions(from: ExecutionState, to: ExecutionState) {
        assert!(from.validate_transition(to).is_ok());
    }

    #[test_case(ExecutionState::Executing, ExecutionState::Analyzing ; "backward")]
    #[test_case(ExecutionState::Analyzing, ExecutionState::Analyzing ; "self loop")]
    #[test_case(ExecutionState::Completed, ExecutionState::Failed ; "out of completed")]
    #[test_case(ExecutionState::Failed, ExecutionState::Aborted ; "out of failed")]
    #[test_case(ExecutionState::Preparing, ExecutionState::Idle ; "back to idle")]
    fn invalid_transitions(from: ExecutionState, to: ExecutionState) {
        assert!(from.validate_transition(to).is_err());
    }

    #[test]
    fn intents_only_during_analysis_and_execution() {
        assert!(ExecutionState::Analyzing.accepts_intents());
        assert!(ExecutionState::Executing.accepts_intents());
        assert!(!ExecutionState::Preparing.accepts_intents());
        assert!(!ExecutionState::Settling.accepts_intents());
    }
}
