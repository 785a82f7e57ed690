//! Market Clock Adapters

mod fixed_session;

pub use fixed_session::FixedSessionClock;
