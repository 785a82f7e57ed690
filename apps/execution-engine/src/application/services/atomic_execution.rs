//! Atomic Execution Context
//!
//! Single-flight multi-strategy rebalance runs. At most one execution ID
//! holds the [`ExecutionGate`] at a time; a second attempt with a different
//! ID fails immediately instead of queuing.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::config::AtomicConfig;
use crate::domain::portfolio_coordination::{
    ConflictResolution, ConflictResolver, ExecutionState, PortfolioConsolidator, PositionIntent,
};
use crate::domain::shared::{DomainError, ExecutionId, Symbol};

/// Atomic execution errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AtomicExecutionError {
    /// Another execution holds the gate.
    #[error("Execution {active} already running, rejected {requested}")]
    AlreadyRunning {
        /// Execution currently holding the gate.
        active: ExecutionId,
        /// Execution that was turned away.
        requested: ExecutionId,
    },

    /// The run exceeded its configured ceiling.
    #[error("Execution {execution_id} timed out after {elapsed_secs}s")]
    Timeout {
        /// Execution that timed out.
        execution_id: ExecutionId,
        /// Seconds elapsed since the run started.
        elapsed_secs: u64,
    },

    /// Invalid state transition.
    #[error(transparent)]
    InvalidTransition(#[from] DomainError),

    /// Intent registered outside ANALYZING or EXECUTING.
    #[error("Intents are not accepted in state {state}")]
    IntentRejected {
        /// State at the time of registration.
        state: ExecutionState,
    },

    /// Failure raised by the run body.
    #[error("Execution failed: {message}")]
    Execution {
        /// Error details.
        message: String,
    },

    /// A state-mutating call was made with no run in progress.
    #[error("No execution in progress")]
    NotRunning,
}

#[derive(Debug)]
struct Holder {
    execution_id: ExecutionId,
    depth: u32,
}

/// Process-wide, re-entrant single-flight lock keyed by execution ID.
///
/// Clones share the same lock.
#[derive(Debug, Clone, Default)]
pub struct ExecutionGate {
    holder: Arc<Mutex<Option<Holder>>>,
}

impl ExecutionGate {
    /// Create an unheld gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the gate for `execution_id`.
    ///
    /// Re-entrant for the execution that already holds it.
    ///
    /// # Errors
    ///
    /// Returns `AtomicExecutionError::AlreadyRunning` if a different
    /// execution holds the gate.
    pub fn try_acquire(&self, execution_id: &ExecutionId) -> Result<GateGuard, AtomicExecutionError> {
        let mut holder = self.holder.lock();
        match holder.as_mut() {
            Some(current) if current.execution_id == *execution_id => {
                current.depth += 1;
            }
            Some(current) => {
                return Err(AtomicExecutionError::AlreadyRunning {
                    active: current.execution_id.clone(),
                    requested: execution_id.clone(),
                });
            }
            None => {
                *holder = Some(Holder {
                    execution_id: execution_id.clone(),
                    depth: 1,
                });
            }
        }
        Ok(GateGuard {
            gate: self.clone(),
            execution_id: execution_id.clone(),
        })
    }

    /// Execution currently holding the gate.
    #[must_use]
    pub fn active_execution(&self) -> Option<ExecutionId> {
        self.holder.lock().as_ref().map(|h| h.execution_id.clone())
    }

    fn release(&self, execution_id: &ExecutionId) {
        let mut holder = self.holder.lock();
        let done = match holder.as_mut() {
            Some(current) if current.execution_id == *execution_id => {
                current.depth = current.depth.saturating_sub(1);
                current.depth == 0
            }
            _ => false,
        };
        if done {
            *holder = None;
        }
    }
}

/// Holds one level of an [`ExecutionGate`]; releases it on drop.
#[derive(Debug)]
pub struct GateGuard {
    gate: ExecutionGate,
    execution_id: ExecutionId,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.gate.release(&self.execution_id);
    }
}

/// One recorded state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    /// State before.
    pub from: ExecutionState,
    /// State after.
    pub to: ExecutionState,
    /// When the transition happened.
    pub at: DateTime<Utc>,
}

/// State, intents and lock ownership for atomic rebalance runs.
pub struct AtomicExecutionContext {
    gate: ExecutionGate,
    config: Arc<AtomicConfig>,
    state: ExecutionState,
    intents: Vec<PositionIntent>,
    transitions: Vec<StateTransition>,
    execution_id: Option<ExecutionId>,
    started: Option<Instant>,
    guard: Option<GateGuard>,
    resolver: ConflictResolver,
    consolidator: PortfolioConsolidator,
}

impl AtomicExecutionContext {
    /// Create a context sharing `gate` with every other context in the
    /// process.
    pub fn new(gate: ExecutionGate, config: Arc<AtomicConfig>) -> Self {
        let policy = config.coordination_policy();
        Self {
            gate,
            config,
            state: ExecutionState::Idle,
            intents: Vec::new(),
            transitions: Vec::new(),
            execution_id: None,
            started: None,
            guard: None,
            resolver: ConflictResolver::new(policy.clone()),
            consolidator: PortfolioConsolidator::new(policy),
        }
    }

    /// Current state.
    pub const fn state(&self) -> ExecutionState {
        self.state
    }

    /// Execution ID of the current or last run.
    pub const fn execution_id(&self) -> Option<&ExecutionId> {
        self.execution_id.as_ref()
    }

    /// Every transition of the current or last run, oldest first.
    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    /// Registered intents.
    pub fn intents(&self) -> &[PositionIntent] {
        &self.intents
    }

    fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.config.run_timeout_seconds)
    }

    /// Run `body` as one atomic execution.
    ///
    /// Acquires the gate, moves to PREPARING, and runs the body under the
    /// configured run timeout. The run ends COMPLETED when the body succeeds,
    /// FAILED when it returns an error and ABORTED when the timeout cancels
    /// it. The gate is released in every case.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` without touching any state if another
    /// execution holds the gate; otherwise the body's error, a `Timeout`, or
    /// an error if the body left the run in a terminal state other than
    /// COMPLETED.
    pub async fn run_atomic<T, F>(
        &mut self,
        execution_id: ExecutionId,
        body: F,
    ) -> Result<T, AtomicExecutionError>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, Result<T, AtomicExecutionError>>,
    {
        self.begin_run(execution_id)?;
        let limit = self.run_timeout();

        let outcome = tokio::time::timeout(limit, body(self)).await;
        let result = match outcome {
            Ok(Ok(value)) => self.finish_run(ExecutionState::Completed).map(|()| value),
            Ok(Err(e)) => {
                tracing::error!(
                    execution_id = ?self.execution_id,
                    error = %e,
                    "Atomic execution failed"
                );
                self.settle(ExecutionState::Failed);
                Err(e)
            }
            Err(_) => {
                let execution_id = self.execution_id.clone().unwrap_or_else(|| ExecutionId::new(""));
                tracing::error!(
                    execution_id = %execution_id,
                    timeout_secs = limit.as_secs(),
                    "Atomic execution aborted by run timeout"
                );
                self.settle(ExecutionState::Aborted);
                Err(AtomicExecutionError::Timeout {
                    execution_id,
                    elapsed_secs: limit.as_secs(),
                })
            }
        };
        self.guard = None;
        result
    }

    fn begin_run(&mut self, execution_id: ExecutionId) -> Result<(), AtomicExecutionError> {
        let guard = self.gate.try_acquire(&execution_id)?;
        self.state = ExecutionState::Idle;
        self.intents.clear();
        self.transitions.clear();
        self.execution_id = Some(execution_id);
        self.started = Some(Instant::now());
        self.guard = Some(guard);
        self.record_transition(ExecutionState::Preparing);
        Ok(())
    }

    fn finish_run(&mut self, to: ExecutionState) -> Result<(), AtomicExecutionError> {
        if self.state.is_terminal() {
            return if self.state == to {
                Ok(())
            } else {
                Err(AtomicExecutionError::Execution {
                    message: format!("run ended in state {}", self.state),
                })
            };
        }
        self.state.validate_transition(to)?;
        self.record_transition(to);
        Ok(())
    }

    /// Finish a run that is already failing; a refused transition is logged
    /// and the run keeps the state it reached.
    fn settle(&mut self, to: ExecutionState) {
        if let Err(e) = self.finish_run(to) {
            tracing::warn!(
                execution_id = ?self.execution_id,
                state = %self.state,
                requested = %to,
                error = %e,
                "Run end state not recorded"
            );
        }
    }

    fn record_transition(&mut self, to: ExecutionState) {
        let from = self.state;
        self.state = to;
        self.transitions.push(StateTransition {
            from,
            to,
            at: Utc::now(),
        });
        tracing::info!(
            execution_id = ?self.execution_id,
            from = %from,
            to = %to,
            "Execution state transition"
        );
    }

    /// Fail the run if it has outlived the configured timeout.
    fn check_deadline(&mut self) -> Result<(), AtomicExecutionError> {
        let (Some(started), Some(execution_id)) = (self.started, self.execution_id.clone()) else {
            return Err(AtomicExecutionError::NotRunning);
        };
        let elapsed = started.elapsed();
        if elapsed <= self.run_timeout() {
            return Ok(());
        }

        tracing::error!(
            execution_id = %execution_id,
            elapsed_secs = elapsed.as_secs(),
            timeout_secs = self.config.run_timeout_seconds,
            "Atomic execution exceeded run timeout"
        );
        if !self.state.is_terminal() {
            self.record_transition(ExecutionState::Failed);
        }
        self.guard = None;
        Err(AtomicExecutionError::Timeout {
            execution_id,
            elapsed_secs: elapsed.as_secs(),
        })
    }

    /// Advance the run state.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` (after forcing FAILED and releasing the gate) if the
    /// run has outlived its timeout, or `InvalidTransition` for a backward
    /// move or a move out of a terminal state.
    pub fn transition_to(&mut self, to: ExecutionState) -> Result<(), AtomicExecutionError> {
        self.check_deadline()?;
        self.state.validate_transition(to)?;
        self.record_transition(to);
        Ok(())
    }

    /// Register a strategy's desired position.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if the run has outlived its timeout and
    /// `IntentRejected` outside ANALYZING and EXECUTING.
    pub fn register_intent(&mut self, intent: PositionIntent) -> Result<(), AtomicExecutionError> {
        self.check_deadline()?;
        if !self.state.accepts_intents() {
            return Err(AtomicExecutionError::IntentRejected { state: self.state });
        }
        tracing::debug!(
            symbol = %intent.symbol(),
            strategy = intent.strategy_name(),
            allocation = %intent.target_allocation(),
            confidence = %intent.confidence(),
            "Intent registered"
        );
        self.intents.push(intent);
        Ok(())
    }

    /// Resolve registered intents into one allocation per symbol.
    #[must_use]
    pub fn detect_conflicts(&self) -> Vec<ConflictResolution> {
        let resolutions = self.resolver.resolve(&self.intents);
        for resolution in resolutions.iter().filter(|r| r.is_contested()) {
            tracing::info!(
                symbol = %resolution.symbol,
                method = %resolution.resolution_method,
                allocation = %resolution.final_allocation,
                confidence = %resolution.confidence,
                strategies = ?resolution.contributing_strategies,
                "Resolved conflicting intents"
            );
        }
        resolutions
    }

    /// Target portfolio after conflict resolution and consolidation.
    #[must_use]
    pub fn consolidated_portfolio(&self) -> BTreeMap<Symbol, Decimal> {
        self.consolidator.consolidate(&self.detect_conflicts())
    }
}
