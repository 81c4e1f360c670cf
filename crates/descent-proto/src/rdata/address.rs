//! Address record types (A, AAAA).

use crate::error::Result;
use crate::wire::WireReader;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A record - IPv4 host address (RFC 1035).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct A {
    address: Ipv4Addr,
}

impl A {
    /// Creates a new A record.
    #[inline]
    pub const fn new(address: Ipv4Addr) -> Self {
        Self { address }
    }

    /// Returns the IPv4 address.
    #[inline]
    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Parses an A record. The caller has already checked RDLENGTH is 4.
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let octets: [u8; 4] = reader.read_bytes(4)?.try_into().unwrap_or_default();
        Ok(Self::new(Ipv4Addr::from(octets)))
    }

    /// Writes the A record to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.address.octets());
    }
}

impl From<Ipv4Addr> for A {
    fn from(address: Ipv4Addr) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// AAAA record - IPv6 host address (RFC 3596).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AAAA {
    address: Ipv6Addr,
}

impl AAAA {
    /// Creates a new AAAA record.
    #[inline]
    pub const fn new(address: Ipv6Addr) -> Self {
        Self { address }
    }

    /// Returns the IPv6 address.
    #[inline]
    pub const fn address(&self) -> Ipv6Addr {
        self.address
    }

    /// Parses an AAAA record. The caller has already checked RDLENGTH is 16.
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let octets: [u8; 16] = reader.read_bytes(16)?.try_into().unwrap_or_default();
        Ok(Self::new(Ipv6Addr::from(octets)))
    }

    /// Writes the AAAA record to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.address.octets());
    }
}

impl From<Ipv6Addr> for AAAA {
    fn from(address: Ipv6Addr) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for AAAA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}
