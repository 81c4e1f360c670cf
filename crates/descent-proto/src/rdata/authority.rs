//! Start of authority record (SOA).

use crate::error::Result;
use crate::name::{CompressionTable, Name};
use crate::wire::WireReader;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SOA record - start of a zone of authority (RFC 1035).
///
/// Besides marking the zone apex, the SOA in the authority section of a
/// negative answer bounds how long that answer may be cached (RFC 2308).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SOA {
    /// Primary name server for the zone.
    mname: Name,
    /// Mailbox of the responsible person.
    rname: Name,
    serial: u32,
    refresh: u32,
    retry: u32,
    expire: u32,
    /// Negative caching TTL.
    minimum: u32,
}

impl SOA {
    /// Creates a new SOA record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mname: Name,
        rname: Name,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    ) -> Self {
        Self {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        }
    }

    /// Returns the primary name server.
    #[inline]
    pub fn mname(&self) -> &Name {
        &self.mname
    }

    /// Returns the responsible mailbox.
    #[inline]
    pub fn rname(&self) -> &Name {
        &self.rname
    }

    /// Returns the zone serial number.
    #[inline]
    pub const fn serial(&self) -> u32 {
        self.serial
    }

    /// Returns the refresh interval in seconds.
    #[inline]
    pub const fn refresh(&self) -> u32 {
        self.refresh
    }

    /// Returns the retry interval in seconds.
    #[inline]
    pub const fn retry(&self) -> u32 {
        self.retry
    }

    /// Returns the expire limit in seconds.
    #[inline]
    pub const fn expire(&self) -> u32 {
        self.expire
    }

    /// Returns the negative caching TTL in seconds.
    #[inline]
    pub const fn minimum(&self) -> u32 {
        self.minimum
    }

    /// Parses an SOA record. Both names may be compressed.
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let mname = reader.read_name()?;
        let rname = reader.read_name()?;
        Ok(Self {
            mname,
            rname,
            serial: reader.read_u32()?,
            refresh: reader.read_u32()?,
            retry: reader.read_u32()?,
            expire: reader.read_u32()?,
            minimum: reader.read_u32()?,
        })
    }

    /// Writes the SOA record to wire format.
    pub fn write_to(&self, buf: &mut BytesMut, table: &mut CompressionTable) {
        self.mname.write_compressed(buf, table);
        self.rname.write_compressed(buf, table);
        buf.put_u32(self.serial);
        buf.put_u32(self.refresh);
        buf.put_u32(self.retry);
        buf.put_u32(self.expire);
        buf.put_u32(self.minimum);
    }
}

impl fmt::Display for SOA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            self.mname,
            self.rname,
            self.serial,
            self.refresh,
            self.retry,
            self.expire,
            self.minimum
        )
    }
}
