//! # Descent Configuration
//!
//! Configuration for the descent resolver, loaded from YAML, JSON or TOML.
//! Every section has defaults, so an empty file is a valid configuration.
//!
//! ```yaml
//! resolver:
//!   query_timeout_ms: 2000
//!   max_cname_chain: 8
//! cache:
//!   capacity: 10000
//! logging:
//!   level: debug
//!   format: json
//! ```

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod cache;
pub mod logging;
pub mod resolver;

pub use cache::CacheConfig;
pub use logging::LoggingConfig;
pub use resolver::{ResolverConfig, RootHintConfig};

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML syntax or schema error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON syntax or schema error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML syntax or schema error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A field holds an unacceptable value.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Dotted path of the field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The configuration file does not exist.
    #[error("File not found: {0}")]
    NotFound(PathBuf),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete descent configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Iterative resolver settings.
    pub resolver: ResolverConfig,

    /// Zone cache settings.
    pub cache: CacheConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads configuration from a file, choosing the format by extension
    /// (`.yaml`/`.yml`, `.json`, `.toml`; anything else is read as YAML).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => Self::from_yaml(&content)?,
        };

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parses configuration from a YAML string. Empty input yields the
    /// defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.resolver.validate()?;
        self.cache.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Serializes to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolver.max_cname_chain, 8);
        assert_eq!(config.cache.capacity, 10_000);
    }

    #[test]
    fn test_empty_yaml() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(
            ".yaml",
            "resolver:\n  query_timeout_ms: 500\n  prefer_ipv6: true\ncache:\n  capacity: 42\n",
        );
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.resolver.query_timeout_ms, 500);
        assert!(config.resolver.prefer_ipv6);
        assert_eq!(config.cache.capacity, 42);
        assert_eq!(config.cache.max_ttl, CacheConfig::default().max_ttl);
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            ".toml",
            r#"
[resolver]
max_cname_chain = 4

[[resolver.root_hints]]
name = "a.root-servers.net"
address = "198.41.0.4"

[logging]
level = "debug"
format = "json"
"#,
        );
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.resolver.max_cname_chain, 4);
        assert_eq!(config.resolver.root_hints.len(), 1);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_json() {
        let file = write_config(".json", r#"{"cache": {"min_ttl": 60, "max_ttl": 30}}"#);
        let config = Config::from_file(file.path()).unwrap();
        match config.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "cache.min_ttl"),
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/nonexistent/descent.yaml");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_parse_error() {
        let file = write_config(".toml", "resolver = [");
        assert!(matches!(Config::from_file(file.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = Config::default();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
    }
}
