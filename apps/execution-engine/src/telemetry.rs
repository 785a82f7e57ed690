//! Tracing Setup
//!
//! Installs a `tracing-subscriber` fmt subscriber configured from
//! [`LoggingConfig`].
//!
//! # Configuration
//!
//! - `RUST_LOG`: overrides the configured level when set
//!
//! # Usage
//!
//! ```rust,ignore
//! use smart_execution::{config::load_config, telemetry::init_tracing};
//!
//! let config = load_config(None)?;
//! init_tracing(&config.observability.logging)?;
//! ```

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Tracing initialization errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured level or directives could not be parsed.
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidFilter {
        /// Filter text.
        filter: String,
        /// Parser message.
        message: String,
    },

    /// A global subscriber is already installed.
    #[error("Tracing subscriber already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Build the env filter: `RUST_LOG` wins, otherwise the configured level.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if the configured level does not
/// parse.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| TelemetryError::InvalidFilter {
        filter: config.level.clone(),
        message: e.to_string(),
    })
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let env_filter = build_env_filter(config)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.include_target);

    let result = if config.format == "pretty" {
        builder.pretty().try_init()
    } else {
        builder.json().try_init()
    };
    result.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        level = %config.level,
        format = %config.format,
        "Tracing initialized"
    );
    Ok(())
}
