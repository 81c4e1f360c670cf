//! DNS record types.
//!
//! [`RecordType`] is the type registry's key: it names every type the codec
//! decodes into a structured payload, and carries any other 16-bit code in
//! [`RecordType::Unknown`] (presented as `TYPE<n>` per RFC 3597).

use crate::error::Error;
use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// DNS record type.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    IntoPrimitive,
    FromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u16)]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordType {
    // =========================================================================
    // Standard Record Types (RFC 1035)
    // =========================================================================
    /// IPv4 address - RFC 1035
    A = 1,

    /// Authoritative name server - RFC 1035
    NS = 2,

    /// Canonical name (alias) - RFC 1035
    CNAME = 5,

    /// Start of authority - RFC 1035
    SOA = 6,

    /// Null record - RFC 1035
    NULL = 10,

    /// Domain name pointer - RFC 1035
    PTR = 12,

    /// Host information - RFC 1035
    HINFO = 13,

    /// Mail exchange - RFC 1035
    MX = 15,

    /// Text strings - RFC 1035
    TXT = 16,

    // =========================================================================
    // Extended Record Types
    // =========================================================================
    /// IPv6 address - RFC 3596
    AAAA = 28,

    /// Service locator - RFC 2782
    SRV = 33,

    /// Delegation name - RFC 6672
    DNAME = 39,

    /// EDNS0 option pseudo-record - RFC 6891
    OPT = 41,

    /// SSH key fingerprint - RFC 4255
    SSHFP = 44,

    /// TLSA certificate association - RFC 6698
    TLSA = 52,

    /// Service binding - RFC 9460
    SVCB = 64,

    /// HTTPS service binding - RFC 9460
    HTTPS = 65,

    /// Certification authority authorization - RFC 8659
    CAA = 257,

    // =========================================================================
    // DNSSEC Record Types
    // =========================================================================
    /// Delegation signer - RFC 4034
    DS = 43,

    /// DNSSEC signature - RFC 4034
    RRSIG = 46,

    /// Next secure record - RFC 4034
    NSEC = 47,

    /// DNS public key - RFC 4034
    DNSKEY = 48,

    /// Hashed next secure record - RFC 5155
    NSEC3 = 50,

    /// NSEC3 parameters - RFC 5155
    NSEC3PARAM = 51,

    /// Child DS - RFC 7344
    CDS = 59,

    /// Child DNSKEY - RFC 7344
    CDNSKEY = 60,

    // =========================================================================
    // Query-only Types
    // =========================================================================
    /// Incremental zone transfer - RFC 1995
    IXFR = 251,

    /// Full zone transfer - RFC 5936
    AXFR = 252,

    /// All records - RFC 1035
    ANY = 255,

    /// Any type without a registered payload codec.
    #[num_enum(catch_all)]
    Unknown(u16),
}

impl RecordType {
    /// Returns the numeric value of the record type.
    #[inline]
    pub fn to_u16(self) -> u16 {
        self.into()
    }

    /// Creates a record type from its numeric value.
    #[inline]
    pub fn from_u16(value: u16) -> Self {
        Self::from_primitive(value)
    }

    /// Returns true if this is a DNSSEC-related record type.
    #[inline]
    pub const fn is_dnssec(self) -> bool {
        matches!(
            self,
            Self::DS
                | Self::RRSIG
                | Self::NSEC
                | Self::DNSKEY
                | Self::NSEC3
                | Self::NSEC3PARAM
                | Self::CDS
                | Self::CDNSKEY
        )
    }

    /// Returns true if this is a query-only type (not stored in zones).
    #[inline]
    pub const fn is_query_type(self) -> bool {
        matches!(self, Self::IXFR | Self::AXFR | Self::ANY)
    }

    /// Returns true if this is a pseudo-record type (OPT).
    #[inline]
    pub const fn is_pseudo_record(self) -> bool {
        matches!(self, Self::OPT)
    }

    /// Returns true if RDATA names of this type may be compressed.
    ///
    /// RFC 3597 Section 4 limits compression to the RFC 1035 types.
    #[inline]
    pub const fn allows_name_compression(self) -> bool {
        matches!(
            self,
            Self::NS | Self::CNAME | Self::SOA | Self::PTR | Self::MX
        )
    }

    /// Returns the exact RDATA length for fixed-size types.
    #[inline]
    pub const fn fixed_length(self) -> Option<usize> {
        match self {
            Self::A => Some(4),
            Self::AAAA => Some(16),
            _ => None,
        }
    }

    /// Returns the mnemonic of the record type.
    pub fn name(self) -> std::borrow::Cow<'static, str> {
        let name = match self {
            Self::A => "A",
            Self::NS => "NS",
            Self::CNAME => "CNAME",
            Self::SOA => "SOA",
            Self::NULL => "NULL",
            Self::PTR => "PTR",
            Self::HINFO => "HINFO",
            Self::MX => "MX",
            Self::TXT => "TXT",
            Self::AAAA => "AAAA",
            Self::SRV => "SRV",
            Self::DNAME => "DNAME",
            Self::OPT => "OPT",
            Self::SSHFP => "SSHFP",
            Self::TLSA => "TLSA",
            Self::SVCB => "SVCB",
            Self::HTTPS => "HTTPS",
            Self::CAA => "CAA",
            Self::DS => "DS",
            Self::RRSIG => "RRSIG",
            Self::NSEC => "NSEC",
            Self::DNSKEY => "DNSKEY",
            Self::NSEC3 => "NSEC3",
            Self::NSEC3PARAM => "NSEC3PARAM",
            Self::CDS => "CDS",
            Self::CDNSKEY => "CDNSKEY",
            Self::IXFR => "IXFR",
            Self::AXFR => "AXFR",
            Self::ANY => "ANY",
            Self::Unknown(v) => return format!("TYPE{v}").into(),
        };
        name.into()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Default for RecordType {
    fn default() -> Self {
        Self::A
    }
}

impl FromStr for RecordType {
    type Err = Error;

    /// Parses a mnemonic (`"AAAA"`, case-insensitive) or `TYPE<n>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        if let Some(code) = upper.strip_prefix("TYPE") {
            if let Ok(value) = code.parse::<u16>() {
                return Ok(Self::from_u16(value));
            }
        }

        KNOWN_TYPES
            .iter()
            .copied()
            .find(|t| t.name() == upper.as_str())
            .ok_or_else(|| Error::InvalidRecordType {
                value: s.to_owned(),
            })
    }
}

const KNOWN_TYPES: &[RecordType] = &[
    RecordType::A,
    RecordType::NS,
    RecordType::CNAME,
    RecordType::SOA,
    RecordType::NULL,
    RecordType::PTR,
    RecordType::HINFO,
    RecordType::MX,
    RecordType::TXT,
    RecordType::AAAA,
    RecordType::SRV,
    RecordType::DNAME,
    RecordType::OPT,
    RecordType::SSHFP,
    RecordType::TLSA,
    RecordType::SVCB,
    RecordType::HTTPS,
    RecordType::CAA,
    RecordType::DS,
    RecordType::RRSIG,
    RecordType::NSEC,
    RecordType::DNSKEY,
    RecordType::NSEC3,
    RecordType::NSEC3PARAM,
    RecordType::CDS,
    RecordType::CDNSKEY,
    RecordType::IXFR,
    RecordType::AXFR,
    RecordType::ANY,
];
