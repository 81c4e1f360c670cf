//! Logging configuration.

use super::{ConfigError, Result};
use serde::{Deserialize, Serialize};

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const FORMATS: &[&str] = &["text", "json"];

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level; `RUST_LOG` overrides it.
    pub level: String,

    /// Output format (text, json).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Validates logging settings.
    pub fn validate(&self) -> Result<()> {
        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                "logging.level",
                format!("must be one of {}", LEVELS.join(", ")),
            ));
        }
        if !FORMATS.contains(&self.format.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::invalid("logging.format", "must be text or json"));
        }
        Ok(())
    }
}
