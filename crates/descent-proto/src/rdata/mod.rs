//! DNS record data (RDATA) types.
//!
//! [`RData`] is a tagged union over the payloads the codec understands,
//! organized by category:
//!
//! - **Address records**: A, AAAA
//! - **Name records**: NS, CNAME, PTR, DNAME, MX
//! - **Authority records**: SOA
//! - **Text records**: TXT
//! - **Service records**: SRV
//! - **Security records**: DNSKEY, DS, RRSIG, NSEC, NSEC3
//!
//! Every other type code decodes to [`RData::Unknown`], which keeps the raw
//! octets so the record re-encodes byte for byte.

pub mod address;
pub mod authority;
pub mod dnssec;
pub mod name;
pub mod service;
pub mod text;
pub mod unknown;

pub use address::{A, AAAA};
pub use authority::SOA;
pub use dnssec::{DNSKEY, DS, NSEC, NSEC3, RRSIG, TypeBitmap};
pub use name::{CNAME, DNAME, MX, NS, PTR};
pub use service::SRV;
pub use text::TXT;
pub use unknown::Unknown;

use crate::error::{Error, Result};
use crate::name::{CompressionTable, Name};
use crate::rtype::RecordType;
use crate::wire::WireReader;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// DNS record data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[allow(clippy::upper_case_acronyms)]
pub enum RData {
    // =========================================================================
    // Address Records
    // =========================================================================
    /// IPv4 address (A record)
    A(A),

    /// IPv6 address (AAAA record)
    AAAA(AAAA),

    // =========================================================================
    // Name Records
    // =========================================================================
    /// Name server (NS record)
    NS(NS),

    /// Canonical name (CNAME record)
    CNAME(CNAME),

    /// Pointer (PTR record)
    PTR(PTR),

    /// Delegation name (DNAME record)
    DNAME(DNAME),

    /// Mail exchange (MX record)
    MX(MX),

    // =========================================================================
    // Authority, Text and Service Records
    // =========================================================================
    /// Start of authority (SOA record)
    SOA(SOA),

    /// Text (TXT record)
    TXT(TXT),

    /// Service location (SRV record)
    SRV(SRV),

    // =========================================================================
    // DNSSEC Records
    // =========================================================================
    /// DNS public key (DNSKEY record)
    DNSKEY(DNSKEY),

    /// Delegation signer (DS record)
    DS(DS),

    /// DNSSEC signature (RRSIG record)
    RRSIG(RRSIG),

    /// Next secure (NSEC record)
    NSEC(NSEC),

    /// Hashed next secure (NSEC3 record)
    NSEC3(NSEC3),

    // =========================================================================
    // Other
    // =========================================================================
    /// Any type without a structured codec, kept as raw bytes.
    Unknown(Unknown),
}

impl RData {
    /// Decodes RDATA of type `rtype` found at `offset` in `message`.
    ///
    /// `message` is the complete enclosing message so compressed names in
    /// the payload can be resolved. Reads never go past `offset + rdlength`;
    /// a payload that needs more bytes, or leaves some unread, fails with a
    /// malformed-record error.
    pub fn parse(rtype: RecordType, message: &[u8], offset: usize, rdlength: u16) -> Result<Self> {
        let end = offset + usize::from(rdlength);
        if end > message.len() {
            return Err(Error::unexpected_eof(message.len()));
        }

        if let Some(expected) = rtype.fixed_length() {
            if expected != usize::from(rdlength) {
                return Err(Error::rdata_length(rtype.name(), expected, rdlength.into()));
            }
        }

        let mut reader = WireReader::bounded(message, offset, end);
        let rdata = Self::decode(rtype, &mut reader).map_err(|err| match err {
            Error::UnexpectedEof { .. } => {
                Error::invalid_rdata(rtype.name(), "payload overruns RDLENGTH")
            }
            other => other,
        })?;

        if !reader.is_empty() {
            return Err(Error::rdata_length(
                rtype.name(),
                reader.position() - offset,
                rdlength.into(),
            ));
        }

        Ok(rdata)
    }

    fn decode(rtype: RecordType, reader: &mut WireReader<'_>) -> Result<Self> {
        Ok(match rtype {
            RecordType::A => RData::A(A::parse(reader)?),
            RecordType::AAAA => RData::AAAA(AAAA::parse(reader)?),
            RecordType::NS => RData::NS(NS::parse(reader)?),
            RecordType::CNAME => RData::CNAME(CNAME::parse(reader)?),
            RecordType::PTR => RData::PTR(PTR::parse(reader)?),
            RecordType::DNAME => RData::DNAME(DNAME::parse(reader)?),
            RecordType::MX => RData::MX(MX::parse(reader)?),
            RecordType::SOA => RData::SOA(SOA::parse(reader)?),
            RecordType::TXT => RData::TXT(TXT::parse(reader)?),
            RecordType::SRV => RData::SRV(SRV::parse(reader)?),
            RecordType::DNSKEY => RData::DNSKEY(DNSKEY::parse(reader)?),
            RecordType::DS => RData::DS(DS::parse(reader)?),
            RecordType::RRSIG => RData::RRSIG(RRSIG::parse(reader)?),
            RecordType::NSEC => RData::NSEC(NSEC::parse(reader)?),
            RecordType::NSEC3 => RData::NSEC3(NSEC3::parse(reader)?),
            other => RData::Unknown(Unknown::parse(other, reader)?),
        })
    }

    /// Returns the record type for this RDATA.
    pub fn record_type(&self) -> RecordType {
        match self {
            RData::A(_) => RecordType::A,
            RData::AAAA(_) => RecordType::AAAA,
            RData::NS(_) => RecordType::NS,
            RData::CNAME(_) => RecordType::CNAME,
            RData::PTR(_) => RecordType::PTR,
            RData::DNAME(_) => RecordType::DNAME,
            RData::MX(_) => RecordType::MX,
            RData::SOA(_) => RecordType::SOA,
            RData::TXT(_) => RecordType::TXT,
            RData::SRV(_) => RecordType::SRV,
            RData::DNSKEY(_) => RecordType::DNSKEY,
            RData::DS(_) => RecordType::DS,
            RData::RRSIG(_) => RecordType::RRSIG,
            RData::NSEC(_) => RecordType::NSEC,
            RData::NSEC3(_) => RecordType::NSEC3,
            RData::Unknown(u) => u.record_type(),
        }
    }

    /// Writes this RDATA at the end of `buf`.
    ///
    /// Names in NS, CNAME, PTR, MX and SOA payloads are compressed against
    /// `table`; other types write their names in full.
    pub fn write_to(&self, buf: &mut BytesMut, table: &mut CompressionTable) {
        match self {
            RData::A(r) => r.write_to(buf),
            RData::AAAA(r) => r.write_to(buf),
            RData::NS(r) => r.write_to(buf, table),
            RData::CNAME(r) => r.write_to(buf, table),
            RData::PTR(r) => r.write_to(buf, table),
            RData::DNAME(r) => r.write_to(buf),
            RData::MX(r) => r.write_to(buf, table),
            RData::SOA(r) => r.write_to(buf, table),
            RData::TXT(r) => r.write_to(buf),
            RData::SRV(r) => r.write_to(buf),
            RData::DNSKEY(r) => r.write_to(buf),
            RData::DS(r) => r.write_to(buf),
            RData::RRSIG(r) => r.write_to(buf),
            RData::NSEC(r) => r.write_to(buf),
            RData::NSEC3(r) => r.write_to(buf),
            RData::Unknown(r) => r.write_to(buf),
        }
    }

    /// Returns the IPv4 address if this is an A record.
    pub fn as_a(&self) -> Option<Ipv4Addr> {
        match self {
            RData::A(a) => Some(a.address()),
            _ => None,
        }
    }

    /// Returns the IPv6 address if this is an AAAA record.
    pub fn as_aaaa(&self) -> Option<Ipv6Addr> {
        match self {
            RData::AAAA(aaaa) => Some(aaaa.address()),
            _ => None,
        }
    }

    /// Returns the address of an A or AAAA record.
    pub fn as_ip(&self) -> Option<IpAddr> {
        match self {
            RData::A(a) => Some(IpAddr::V4(a.address())),
            RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.address())),
            _ => None,
        }
    }

    /// Returns the target name if this is a CNAME record.
    pub fn as_cname(&self) -> Option<&Name> {
        match self {
            RData::CNAME(cname) => Some(cname.target()),
            _ => None,
        }
    }

    /// Returns the server name if this is an NS record.
    pub fn as_ns(&self) -> Option<&Name> {
        match self {
            RData::NS(ns) => Some(ns.nsdname()),
            _ => None,
        }
    }

    /// Returns the SOA payload if this is an SOA record.
    pub fn as_soa(&self) -> Option<&SOA> {
        match self {
            RData::SOA(soa) => Some(soa),
            _ => None,
        }
    }

    /// Returns the DNSKEY payload if this is a DNSKEY record.
    pub fn as_dnskey(&self) -> Option<&DNSKEY> {
        match self {
            RData::DNSKEY(key) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RData::A(r) => write!(f, "{r}"),
            RData::AAAA(r) => write!(f, "{r}"),
            RData::NS(r) => write!(f, "{r}"),
            RData::CNAME(r) => write!(f, "{r}"),
            RData::PTR(r) => write!(f, "{r}"),
            RData::DNAME(r) => write!(f, "{r}"),
            RData::MX(r) => write!(f, "{r}"),
            RData::SOA(r) => write!(f, "{r}"),
            RData::TXT(r) => write!(f, "{r}"),
            RData::SRV(r) => write!(f, "{r}"),
            RData::DNSKEY(r) => write!(f, "{r}"),
            RData::DS(r) => write!(f, "{r}"),
            RData::RRSIG(r) => write!(f, "{r}"),
            RData::NSEC(r) => write!(f, "{r}"),
            RData::NSEC3(r) => write!(f, "{r}"),
            RData::Unknown(r) => write!(f, "{r}"),
        }
    }
}
