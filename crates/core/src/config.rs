// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration sections for the pipeline reliability core
//!
//! ```toml
//! [buffer]
//! capacity = 512
//! batch_size = 8
//!
//! [backoff]
//! initial_delay = "50ms"
//! max_retries = 10
//! max_delay = "30s"
//!
//! [state]
//! compact_after = 10000
//! ```

use crate::backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration, one section per component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub buffer: BufferConfig,
    pub backoff: BackoffConfig,
    pub state: StateConfig,
}

impl CoreConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.buffer.validate()?;
        self.state.validate()
    }
}

/// Buffer sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferConfig {
    /// Maximum number of records held at once
    pub capacity: usize,
    /// Number of records a read waits for before returning early
    pub batch_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: 512,
            batch_size: 8,
        }
    }
}

impl BufferConfig {
    pub fn new(capacity: usize, batch_size: usize) -> Self {
        Self {
            capacity,
            batch_size,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("buffer capacity must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("buffer batch_size must be positive".into()));
        }
        if self.batch_size > self.capacity {
            return Err(ConfigError::Invalid(format!(
                "buffer batch_size {} exceeds capacity {}",
                self.batch_size, self.capacity
            )));
        }
        Ok(())
    }
}

/// Retry delay schedule for sink deliveries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackoffConfig {
    /// Delay before the first retry; later delays grow exponentially from it
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Number of retries before giving up (`None` retries forever)
    pub max_retries: Option<u32>,
    /// Upper bound on a single delay (`None` is uncapped)
    #[serde(with = "humantime_serde")]
    pub max_delay: Option<Duration>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(50),
            max_retries: None,
            max_delay: None,
        }
    }
}

impl BackoffConfig {
    pub fn new(initial_delay: Duration) -> Self {
        Self {
            initial_delay,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Start a fresh delay sequence
    pub fn sequence(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.initial_delay, self.max_retries, self.max_delay)
    }
}

/// Processor state store tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateConfig {
    /// Number of logged operations between log compactions
    pub compact_after: u64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            compact_after: 10_000,
        }
    }
}

impl StateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compact_after == 0 {
            return Err(ConfigError::Invalid("state compact_after must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
