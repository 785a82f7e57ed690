//! Configuration module for the execution engine.
//!
//! Loads YAML with environment variable interpolation and validates the
//! thresholds the execution services rely on.
//!
//! # Usage
//!
//! ```rust,ignore
//! use smart_execution::config::load_config;
//!
//! let config = load_config(Some("config.yaml"))?;
//! println!("max repegs: {}", config.execution.max_repegs_per_order);
//! ```

mod atomic;
mod execution;
mod observability;
mod session;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use atomic::AtomicConfig;
pub use execution::ExecutionConfig;
pub use observability::{LoggingConfig, ObservabilityConfig};
pub use session::SessionConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Order execution settings.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Atomic multi-strategy execution settings.
    #[serde(default)]
    pub atomic: AtomicConfig,
    /// Regular session hours.
    #[serde(default)]
    pub session: SessionConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<Option<regex::Regex>> = OnceLock::new();

    let Some(re) = ENV_VAR_REGEX
        .get_or_init(|| regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").ok())
    else {
        return input.to_string();
    };

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match cap.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

fn ensure(condition: bool, message: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(message.to_string()))
    }
}

fn in_unit_interval(value: Decimal) -> bool {
    value > Decimal::ZERO && value <= Decimal::ONE
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let execution = &config.execution;
    ensure(
        execution.bid_anchor_offset_cents > Decimal::ZERO
            && execution.ask_anchor_offset_cents > Decimal::ZERO,
        "execution anchor offsets must be positive",
    )?;
    ensure(
        execution.max_spread_percent > Decimal::ZERO,
        "execution.max_spread_percent must be positive",
    )?;
    ensure(
        execution.repeg_threshold_percent >= Decimal::ZERO,
        "execution.repeg_threshold_percent must not be negative",
    )?;
    ensure(
        execution.min_bid_ask_size >= Decimal::ZERO && execution.low_liquidity_min_size >= Decimal::ZERO,
        "execution minimum sizes must not be negative",
    )?;
    ensure(
        execution.order_placement_timeout_seconds > 0,
        "execution.order_placement_timeout_seconds must be positive",
    )?;
    ensure(
        execution.quote_retry_attempts > 0,
        "execution.quote_retry_attempts must be at least 1",
    )?;

    let atomic = &config.atomic;
    ensure(
        atomic.run_timeout_seconds > 0,
        "atomic.run_timeout_seconds must be positive",
    )?;
    ensure(
        in_unit_interval(atomic.max_concentration),
        "atomic.max_concentration must be within (0, 1]",
    )?;
    ensure(
        in_unit_interval(atomic.opposing_confidence_penalty),
        "atomic.opposing_confidence_penalty must be within (0, 1]",
    )?;
    ensure(
        in_unit_interval(atomic.over_allocation_target),
        "atomic.over_allocation_target must be within (0, 1]",
    )?;
    ensure(
        atomic.min_allocation >= Decimal::ZERO,
        "atomic.min_allocation must not be negative",
    )?;
    ensure(
        !atomic.cash_symbol.trim().is_empty(),
        "atomic.cash_symbol must not be empty",
    )?;

    ensure(
        config.session.open_time_utc < config.session.close_time_utc,
        "session.open_time_utc must be before session.close_time_utc",
    )?;

    let valid_formats = ["json", "pretty"];
    if !valid_formats.contains(&config.observability.logging.format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be one of: {valid_formats:?}"
        )));
    }

    Ok(())
}
