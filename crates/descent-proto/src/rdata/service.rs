//! Service location record (SRV).

use crate::error::Result;
use crate::name::Name;
use crate::wire::WireReader;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SRV record - location of a service (RFC 2782).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SRV {
    priority: u16,
    weight: u16,
    port: u16,
    target: Name,
}

impl SRV {
    /// Creates a new SRV record.
    pub fn new(priority: u16, weight: u16, port: u16, target: Name) -> Self {
        Self {
            priority,
            weight,
            port,
            target,
        }
    }

    /// Returns the priority. Lower values are tried first.
    #[inline]
    pub const fn priority(&self) -> u16 {
        self.priority
    }

    /// Returns the relative weight among equal priorities.
    #[inline]
    pub const fn weight(&self) -> u16 {
        self.weight
    }

    /// Returns the service port.
    #[inline]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the target host.
    #[inline]
    pub fn target(&self) -> &Name {
        &self.target
    }

    /// Returns true if the record says the service is not available
    /// (target is the root name).
    pub fn is_unavailable(&self) -> bool {
        self.target.is_root()
    }

    /// Parses an SRV record.
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let priority = reader.read_u16()?;
        let weight = reader.read_u16()?;
        let port = reader.read_u16()?;
        let target = reader.read_name()?;
        Ok(Self::new(priority, weight, port, target))
    }

    /// Writes the SRV record to wire format. RFC 2782 forbids compressing
    /// the target.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u16(self.priority);
        buf.put_u16(self.weight);
        buf.put_u16(self.port);
        self.target.write_wire(buf);
    }
}

impl fmt::Display for SRV {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.priority, self.weight, self.port, self.target
        )
    }
}
