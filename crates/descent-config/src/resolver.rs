//! Resolver configuration.

use super::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Iterative resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Timeout for one exchange with one server (milliseconds).
    pub query_timeout_ms: u64,

    /// Deadline for a whole resolution (milliseconds).
    pub total_timeout_ms: u64,

    /// Maximum CNAMEs followed per question.
    pub max_cname_chain: u8,

    /// Maximum referrals followed per resolution.
    pub max_referrals: u8,

    /// EDNS UDP payload size advertised in queries.
    pub udp_payload_size: u16,

    /// Query IPv6 nameserver addresses first.
    pub prefer_ipv6: bool,

    /// Root servers to start from. Empty means the IANA root servers.
    pub root_hints: Vec<RootHintConfig>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 2000,
            total_timeout_ms: 30_000,
            max_cname_chain: 8,
            max_referrals: 30,
            udp_payload_size: 1232,
            prefer_ipv6: false,
            root_hints: Vec::new(),
        }
    }
}

impl ResolverConfig {
    /// Validates resolver settings.
    pub fn validate(&self) -> Result<()> {
        if self.query_timeout_ms == 0 {
            return Err(ConfigError::invalid("resolver.query_timeout_ms", "must be at least 1"));
        }
        if self.total_timeout_ms < self.query_timeout_ms {
            return Err(ConfigError::invalid(
                "resolver.total_timeout_ms",
                "must not be shorter than query_timeout_ms",
            ));
        }
        if self.max_referrals == 0 {
            return Err(ConfigError::invalid("resolver.max_referrals", "must be at least 1"));
        }
        if self.udp_payload_size < 512 {
            return Err(ConfigError::invalid("resolver.udp_payload_size", "must be at least 512"));
        }
        for (i, hint) in self.root_hints.iter().enumerate() {
            if hint.name.trim().is_empty() {
                return Err(ConfigError::invalid(
                    &format!("resolver.root_hints[{i}].name"),
                    "must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// Returns the per-exchange timeout.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Returns the resolution deadline.
    pub fn total_timeout(&self) -> Duration {
        Duration::from_millis(self.total_timeout_ms)
    }
}

/// One root server address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootHintConfig {
    /// Server host name.
    pub name: String,
    /// Server address.
    pub address: IpAddr,
}
