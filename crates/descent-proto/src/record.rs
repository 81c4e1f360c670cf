//! DNS resource records.
//!
//! A resource record (RR) is the fundamental unit of DNS data,
//! containing a name, type, class, TTL, and record-specific data.

use crate::class::RecordClass;
use crate::edns::Edns;
use crate::error::{Error, Result};
use crate::name::{CompressionTable, Name};
use crate::rdata::{self, RData};
use crate::rtype::RecordType;
use crate::wire::WireReader;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A DNS resource record.
///
/// The record type is not stored separately; it is always the type of the
/// RDATA, so the two cannot disagree.
///
/// # Wire Format
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// /                      NAME                     /
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      TYPE                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                     CLASS                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      TTL                      |
/// |                                               |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                   RDLENGTH                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// /                     RDATA                     /
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRecord {
    name: Name,
    rclass: RecordClass,
    /// Time to live in seconds.
    ttl: u32,
    rdata: RData,
}

/// One entry of an answer, authority or additional section.
#[derive(Debug)]
pub(crate) enum SectionEntry {
    Record(ResourceRecord),
    Opt(Edns),
}

impl ResourceRecord {
    /// Creates a new resource record.
    pub fn new(name: Name, rclass: RecordClass, ttl: u32, rdata: RData) -> Self {
        Self {
            name,
            rclass,
            ttl,
            rdata,
        }
    }

    /// Creates an IN-class A record.
    pub fn a(name: Name, ttl: u32, addr: Ipv4Addr) -> Self {
        Self::new(name, RecordClass::IN, ttl, RData::A(rdata::A::new(addr)))
    }

    /// Creates an IN-class AAAA record.
    pub fn aaaa(name: Name, ttl: u32, addr: Ipv6Addr) -> Self {
        Self::new(name, RecordClass::IN, ttl, RData::AAAA(rdata::AAAA::new(addr)))
    }

    /// Creates an IN-class NS record.
    pub fn ns(name: Name, ttl: u32, nsdname: Name) -> Self {
        Self::new(name, RecordClass::IN, ttl, RData::NS(rdata::NS::new(nsdname)))
    }

    /// Creates an IN-class CNAME record.
    pub fn cname(name: Name, ttl: u32, target: Name) -> Self {
        Self::new(
            name,
            RecordClass::IN,
            ttl,
            RData::CNAME(rdata::CNAME::new(target)),
        )
    }

    /// Creates an IN-class SOA record.
    pub fn soa(name: Name, ttl: u32, soa: rdata::SOA) -> Self {
        Self::new(name, RecordClass::IN, ttl, RData::SOA(soa))
    }

    /// Returns the owner name.
    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the record type.
    #[inline]
    pub fn rtype(&self) -> RecordType {
        self.rdata.record_type()
    }

    /// Returns the record class.
    #[inline]
    pub const fn rclass(&self) -> RecordClass {
        self.rclass
    }

    /// Returns the TTL in seconds.
    #[inline]
    pub const fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Returns the record data.
    #[inline]
    pub fn rdata(&self) -> &RData {
        &self.rdata
    }

    /// Returns a copy with a different TTL.
    #[must_use]
    pub fn with_ttl(&self, ttl: u32) -> Self {
        Self {
            ttl,
            ..self.clone()
        }
    }

    /// Sets the TTL.
    pub fn set_ttl(&mut self, ttl: u32) {
        self.ttl = ttl;
    }

    /// Returns true if the owner, type and class match.
    pub fn matches(&self, name: &Name, rtype: RecordType, rclass: RecordClass) -> bool {
        self.rtype() == rtype && self.rclass == rclass && &self.name == name
    }

    /// Returns true if two records carry the same data for the same key,
    /// ignoring TTL.
    pub fn same_data(&self, other: &Self) -> bool {
        self.rclass == other.rclass && self.name == other.name && self.rdata == other.rdata
    }

    /// Reads a resource record at the reader's position.
    ///
    /// OPT records are decoded like any other unknown payload; use the
    /// message codec to have them lifted into [`Edns`].
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let (name, rtype, class, ttl, rdlength) = Self::parse_fixed(reader)?;
        let rdata = Self::parse_rdata(reader, rtype, rdlength)?;
        Ok(Self::new(name, RecordClass::from_u16(class), ttl, rdata))
    }

    pub(crate) fn parse_entry(reader: &mut WireReader<'_>) -> Result<SectionEntry> {
        let start = reader.position();
        let (name, rtype, class, ttl, rdlength) = Self::parse_fixed(reader)?;

        if rtype == RecordType::OPT {
            if !name.is_root() {
                return Err(Error::invalid_data(start, "OPT record owner must be root"));
            }
            let rdata_start = reader.position();
            let end = rdata_start + usize::from(rdlength);
            if end > reader.end() {
                return Err(Error::unexpected_eof(reader.end()));
            }
            let mut rdata = WireReader::bounded(reader.data(), rdata_start, end);
            let edns = Edns::from_opt(class, ttl, &mut rdata)?;
            reader.read_bytes(usize::from(rdlength))?;
            return Ok(SectionEntry::Opt(edns));
        }

        let rdata = Self::parse_rdata(reader, rtype, rdlength)?;
        Ok(SectionEntry::Record(Self::new(
            name,
            RecordClass::from_u16(class),
            ttl,
            rdata,
        )))
    }

    fn parse_fixed(reader: &mut WireReader<'_>) -> Result<(Name, RecordType, u16, u32, u16)> {
        let name = reader.read_name()?;
        let rtype = RecordType::from_u16(reader.read_u16()?);
        let class = reader.read_u16()?;
        let ttl = reader.read_u32()?;
        let rdlength = reader.read_u16()?;
        Ok((name, rtype, class, ttl, rdlength))
    }

    fn parse_rdata(reader: &mut WireReader<'_>, rtype: RecordType, rdlength: u16) -> Result<RData> {
        let offset = reader.position();
        let rdata = RData::parse(rtype, reader.data(), offset, rdlength)?;
        reader.read_bytes(usize::from(rdlength))?;
        Ok(rdata)
    }

    /// Writes the record, compressing the owner name (and RDATA names where
    /// allowed) against `table`.
    pub fn write_to(&self, buf: &mut BytesMut, table: &mut CompressionTable) {
        self.name.write_compressed(buf, table);
        buf.put_u16(self.rtype().to_u16());
        buf.put_u16(self.rclass.to_u16());
        buf.put_u32(self.ttl);

        let len_pos = buf.len();
        buf.put_u16(0);
        self.rdata.write_to(buf, table);
        let rdlength = (buf.len() - len_pos - 2) as u16;
        buf[len_pos..len_pos + 2].copy_from_slice(&rdlength.to_be_bytes());
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name,
            self.ttl,
            self.rclass,
            self.rtype(),
            self.rdata
        )
    }
}
