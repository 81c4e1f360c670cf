//! DNS response codes (RCODEs).
//!
//! Response codes indicate the status of a DNS operation.
//! Defined in RFC 1035 Section 4.1.1 with extensions from subsequent RFCs.

use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};

/// DNS response code.
///
/// With EDNS0 the response code is 12 bits wide: 4 bits in the header and
/// 8 bits in the OPT record. Values without a name are kept in
/// [`ResponseCode::Unknown`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    IntoPrimitive,
    FromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u16)]
pub enum ResponseCode {
    /// No error condition - RFC 1035
    NoError = 0,

    /// Format error - RFC 1035
    FormErr = 1,

    /// Server failure - RFC 1035
    ServFail = 2,

    /// Name error - RFC 1035
    ///
    /// The domain name referenced in the query does not exist.
    NXDomain = 3,

    /// Not implemented - RFC 1035
    NotImp = 4,

    /// Query refused - RFC 1035
    Refused = 5,

    /// Name exists when it should not - RFC 2136
    YXDomain = 6,

    /// RR set exists when it should not - RFC 2136
    YXRRSet = 7,

    /// RR set that should exist does not - RFC 2136
    NXRRSet = 8,

    /// Server not authoritative for zone - RFC 2136
    NotAuth = 9,

    /// Name not contained in zone - RFC 2136
    NotZone = 10,

    /// Bad OPT version - RFC 6891
    BadVers = 16,

    /// Bad/missing server cookie - RFC 7873
    BadCookie = 23,

    /// Any other value.
    #[num_enum(catch_all)]
    Unknown(u16),
}

impl ResponseCode {
    /// Returns the numeric value of the response code.
    #[inline]
    pub fn to_u16(self) -> u16 {
        self.into()
    }

    /// Returns the 4-bit value for the header RCODE field.
    #[inline]
    pub fn header_rcode(self) -> u8 {
        (self.to_u16() & 0x0F) as u8
    }

    /// Returns the 8-bit extended RCODE for the OPT record.
    #[inline]
    pub fn extended_rcode(self) -> u8 {
        (self.to_u16() >> 4) as u8
    }

    /// Combines header RCODE and extended RCODE into a full response code.
    #[inline]
    pub fn from_parts(header_rcode: u8, extended_rcode: u8) -> Self {
        Self::from_primitive(u16::from(extended_rcode) << 4 | u16::from(header_rcode & 0x0F))
    }

    /// Returns true if this response indicates success.
    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::NoError)
    }

    /// Returns true if this response indicates the name does not exist.
    #[inline]
    pub const fn is_nxdomain(self) -> bool {
        matches!(self, Self::NXDomain)
    }

    /// Returns true if this is an extended RCODE (requires EDNS0).
    #[inline]
    pub fn is_extended(self) -> bool {
        self.to_u16() > 15
    }

    /// Returns the mnemonic of the response code.
    pub fn name(self) -> std::borrow::Cow<'static, str> {
        let name = match self {
            Self::NoError => "NOERROR",
            Self::FormErr => "FORMERR",
            Self::ServFail => "SERVFAIL",
            Self::NXDomain => "NXDOMAIN",
            Self::NotImp => "NOTIMP",
            Self::Refused => "REFUSED",
            Self::YXDomain => "YXDOMAIN",
            Self::YXRRSet => "YXRRSET",
            Self::NXRRSet => "NXRRSET",
            Self::NotAuth => "NOTAUTH",
            Self::NotZone => "NOTZONE",
            Self::BadVers => "BADVERS",
            Self::BadCookie => "BADCOOKIE",
            Self::Unknown(v) => return format!("RCODE{v}").into(),
        };
        name.into()
    }
}

impl Default for ResponseCode {
    fn default() -> Self {
        Self::NoError
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}
