//! # Descent Iterative Resolver
//!
//! Resolves a question by walking the delegation tree from the root
//! servers down to an authoritative answer.
//!
//! ## Features
//!
//! - Delegation following with bailiwick checks on referrals and glue
//! - Nested nameserver address lookups when a referral carries no glue
//! - CNAME chasing bounded by a configurable chain limit
//! - Loop detection shared by every nested lookup of a resolution
//! - Positive and negative caching through [`descent_cache::ZoneCache`]
//! - UDP with TCP fallback on truncation, behind a pluggable [`Transport`]
//! - Optional DNSSEC verification of final answers

#![warn(missing_docs)]

use std::net::SocketAddr;
use std::time::Duration;

use descent_dnssec::ValidationResult;
use descent_proto::{Message, Name, ResponseCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod hints;
pub mod iterative;
pub mod stats;
pub mod transport;

pub use hints::RootHints;
pub use iterative::IterativeResolver;
pub use stats::{ResolverStats, StatsSnapshot};
pub use transport::{NetTransport, Transport, TransportError};

/// Resolver error.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The same server was asked the same question twice within one
    /// resolution.
    #[error("Delegation loop detected at {server} for zone {zone}")]
    LoopDetected {
        /// Zone apex the server was queried for.
        zone: Name,
        /// Nameserver that was about to be queried again.
        server: Name,
    },

    /// More CNAMEs than `max_cname_chain` were followed.
    #[error("CNAME chain longer than {limit}")]
    CnameChainTooLong {
        /// Configured limit.
        limit: u8,
    },

    /// More referrals than `max_referrals` were followed.
    #[error("Referral limit of {limit} exceeded")]
    ReferralLimitExceeded {
        /// Configured limit.
        limit: u8,
    },

    /// Every candidate nameserver failed.
    #[error("Resolution of {name} failed: {reason}")]
    ResolutionFailed {
        /// Name being resolved when the candidates ran out.
        name: Name,
        /// Last per-server failure.
        reason: String,
    },

    /// The resolution deadline passed.
    #[error("Timeout")]
    Timeout,

    /// Transport failure talking to one server.
    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    /// A server sent something undecodable or inconsistent.
    #[error("Format error: {0}")]
    Format(String),

    /// A server answered with an error response code.
    #[error("Server {server} answered {rcode}")]
    ServerError {
        /// Address of the server.
        server: SocketAddr,
        /// Response code it returned.
        rcode: ResponseCode,
    },
}

impl ResolverError {
    /// Creates a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Returns true if the error is confined to one server or one nested
    /// lookup, so resolution may continue with the next candidate.
    ///
    /// Loop, chain, referral and deadline violations abort the whole
    /// resolution.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Format(_) | Self::ServerError { .. } | Self::ResolutionFailed { .. }
        )
    }
}

impl From<descent_proto::Error> for ResolverError {
    fn from(err: descent_proto::Error) -> Self {
        Self::Format(err.to_string())
    }
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolverError>;

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Timeout for a single exchange with one server.
    #[serde(with = "duration_ms")]
    pub query_timeout: Duration,

    /// Deadline for a whole resolution, nested lookups included.
    #[serde(with = "duration_ms")]
    pub total_timeout: Duration,

    /// Maximum number of CNAMEs followed for one question.
    pub max_cname_chain: u8,

    /// Maximum number of referrals followed across a resolution.
    pub max_referrals: u8,

    /// UDP payload size advertised through EDNS.
    pub udp_payload_size: u16,

    /// Try IPv6 nameserver addresses before IPv4 ones.
    pub prefer_ipv6: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(2),
            total_timeout: Duration::from_secs(30),
            max_cname_chain: 8,
            max_referrals: 30,
            udp_payload_size: descent_proto::DEFAULT_EDNS_UDP_SIZE,
            prefer_ipv6: false,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Outcome of a resolution.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Response carrying the original question, the CNAME chain followed
    /// and the final answer (or the negative result and its SOA).
    pub message: Message,

    /// Server that produced the final response; `None` when answered from
    /// cache.
    pub server: Option<SocketAddr>,

    /// True if the final response arrived truncated over UDP and was
    /// fetched again over TCP.
    pub truncated: bool,

    /// True if the answer came from the cache without network traffic.
    pub from_cache: bool,

    /// DNSSEC status of the answer; `None` without a verifier.
    pub validation: Option<ValidationResult>,
}

impl QueryResult {
    /// Returns the response code of the final answer.
    pub fn rcode(&self) -> ResponseCode {
        self.message.rcode()
    }

    /// Returns true for NXDOMAIN and NODATA results.
    pub fn is_negative(&self) -> bool {
        self.message.is_nxdomain() || self.message.is_nodata()
    }
}
