//! Controller tunables.
//!
//! Loaded from TOML; every field has a default, so an empty document is a
//! valid configuration.
//!
//! ```toml
//! reset_timeout_ms = 500
//! debug_dump = false
//!
//! [idle_poll]
//! timeout_ms = 500
//! initial_backoff_us = 10
//! max_backoff_us = 1000
//! ```

use core::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Bounded polling of a lane's idle status after a disable command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdlePollConfig {
    /// Give up after this long.
    pub timeout_ms: u64,
    /// First sleep between status reads.
    pub initial_backoff_us: u64,
    /// Upper bound of the doubling sleep.
    pub max_backoff_us: u64,
}

impl IdlePollConfig {
    /// Poll deadline.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// First backoff interval.
    #[must_use]
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_micros(self.initial_backoff_us)
    }

    /// Largest backoff interval.
    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        Duration::from_micros(self.max_backoff_us.max(self.initial_backoff_us))
    }
}

impl Default for IdlePollConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 500,
            initial_backoff_us: 10,
            max_backoff_us: 1000,
        }
    }
}

/// Controller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IspifConfig {
    /// How long to wait for the reset-done interrupt.
    pub reset_timeout_ms: u64,
    /// Idle polling after a disable-at-boundary command.
    pub idle_poll: IdlePollConfig,
    /// Initial state of the register dump after each command.
    pub debug_dump: bool,
}

impl IspifConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid TOML or names an
    /// unknown field.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError {
            message: err.message().to_owned(),
        })
    }

    /// Reset completion deadline.
    #[must_use]
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

impl Default for IspifConfig {
    fn default() -> Self {
        Self {
            reset_timeout_ms: 500,
            idle_poll: IdlePollConfig::default(),
            debug_dump: false,
        }
    }
}

/// A configuration document could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid ispif config: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
