//! Portfolio coordination value objects.

mod conflict_resolution;
mod coordination_policy;
mod execution_state;
mod position_intent;

pub use conflict_resolution::{ConflictResolution, ResolutionMethod};
pub use coordination_policy::CoordinationPolicy;
pub use execution_state::ExecutionState;
pub use position_intent::PositionIntent;
