//! DNS message header.
//!
//! The DNS header is a fixed 12-byte structure at the start of every DNS
//! message. Section counts are not stored in [`Header`]; they are derived
//! from the message sections when encoding and returned separately as
//! [`SectionCounts`] when decoding.

use crate::error::{Error, Result};
use crate::opcode::OpCode;
use crate::rcode::ResponseCode;
use bitflags::bitflags;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of the DNS header in bytes.
pub const HEADER_SIZE: usize = 12;

/// The reserved Z bit, which must be zero.
const Z_BIT: u16 = 0x0040;

bitflags! {
    /// DNS header flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct HeaderFlags: u16 {
        /// Query/Response flag: 0 = query, 1 = response
        const QR = 0x8000;

        /// Authoritative Answer
        const AA = 0x0400;

        /// Truncation: message was truncated
        const TC = 0x0200;

        /// Recursion Desired
        const RD = 0x0100;

        /// Recursion Available
        const RA = 0x0080;

        /// Authentic Data (DNSSEC)
        const AD = 0x0020;

        /// Checking Disabled (DNSSEC)
        const CD = 0x0010;
    }
}

/// DNS message header.
///
/// # Wire Format
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      ID                       |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QR|   Opcode  |AA|TC|RD|RA| Z|AD|CD|   RCODE   |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    QDCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ANCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    NSCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ARCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// The default header has every flag cleared, opcode QUERY and NOERROR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Header {
    /// Message identifier for matching requests to responses.
    pub id: u16,

    /// Single-bit flags.
    pub flags: HeaderFlags,

    /// Operation code.
    pub opcode: OpCode,

    /// Response code. Values above 15 need an OPT record to be encoded.
    pub rcode: ResponseCode,
}

/// Section counts read from a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionCounts {
    /// Number of questions.
    pub qd_count: u16,
    /// Number of answer records.
    pub an_count: u16,
    /// Number of authority records.
    pub ns_count: u16,
    /// Number of additional records.
    pub ar_count: u16,
}

macro_rules! flag_accessors {
    ($($(#[$doc:meta])* $get:ident, $set:ident => $flag:ident;)*) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $get(&self) -> bool {
                self.flags.contains(HeaderFlags::$flag)
            }

            #[doc = concat!("Sets the ", stringify!($flag), " flag.")]
            #[inline]
            pub fn $set(&mut self, value: bool) {
                self.flags.set(HeaderFlags::$flag, value);
            }
        )*
    };
}

impl Header {
    /// Creates a new header with the given message ID and all flags cleared.
    #[inline]
    pub fn new(id: u16) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Creates a response header from a query header.
    pub fn response_from(query: &Header) -> Self {
        Self {
            id: query.id,
            flags: HeaderFlags::QR | (query.flags & (HeaderFlags::RD | HeaderFlags::CD)),
            opcode: query.opcode,
            rcode: ResponseCode::NoError,
        }
    }

    /// Returns true if this is a query.
    #[inline]
    pub fn is_query(&self) -> bool {
        !self.flags.contains(HeaderFlags::QR)
    }

    flag_accessors! {
        /// Returns true if this is a response.
        is_response, set_response => QR;
        /// Returns true if the response is from an authoritative server.
        is_authoritative, set_authoritative => AA;
        /// Returns true if the message was truncated.
        is_truncated, set_truncated => TC;
        /// Returns true if recursion was requested.
        recursion_desired, set_recursion_desired => RD;
        /// Returns true if recursion is available.
        recursion_available, set_recursion_available => RA;
        /// Returns true if the response data is authenticated (DNSSEC).
        is_authentic_data, set_authentic_data => AD;
        /// Returns true if DNSSEC checking is disabled.
        checking_disabled, set_checking_disabled => CD;
    }

    /// Parses a header from wire format.
    ///
    /// Fails with [`Error::ReservedFlagSet`] if the Z bit is set.
    pub fn parse(data: &[u8]) -> Result<(Self, SectionCounts)> {
        if data.len() < HEADER_SIZE {
            return Err(Error::unexpected_eof(data.len()));
        }

        let word = |i: usize| u16::from_be_bytes([data[i], data[i + 1]]);
        let id = word(0);
        let flags_raw = word(2);

        if flags_raw & Z_BIT != 0 {
            return Err(Error::ReservedFlagSet { flags: flags_raw });
        }

        let header = Self {
            id,
            flags: HeaderFlags::from_bits_truncate(flags_raw),
            opcode: OpCode::from_u8((flags_raw >> 11) as u8),
            rcode: ResponseCode::from_parts((flags_raw & 0x0F) as u8, 0),
        };
        let counts = SectionCounts {
            qd_count: word(4),
            an_count: word(6),
            ns_count: word(8),
            ar_count: word(10),
        };

        Ok((header, counts))
    }

    /// Returns the 16-bit flags word as written on the wire.
    pub fn flags_word(&self) -> u16 {
        self.flags.bits()
            | u16::from(self.opcode.to_u8() & 0x0F) << 11
            | u16::from(self.rcode.header_rcode())
    }

    /// Writes the header with the given counts.
    pub fn write_to(&self, counts: SectionCounts, buf: &mut BytesMut) {
        buf.put_u16(self.id);
        buf.put_u16(self.flags_word());
        buf.put_u16(counts.qd_count);
        buf.put_u16(counts.an_count);
        buf.put_u16(counts.ns_count);
        buf.put_u16(counts.ar_count);
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "opcode: {}, status: {}, id: {}", self.opcode, self.rcode, self.id)?;
        write!(f, "\nflags:")?;

        for (flag, name) in [
            (HeaderFlags::QR, "qr"),
            (HeaderFlags::AA, "aa"),
            (HeaderFlags::TC, "tc"),
            (HeaderFlags::RD, "rd"),
            (HeaderFlags::RA, "ra"),
            (HeaderFlags::AD, "ad"),
            (HeaderFlags::CD, "cd"),
        ] {
            if self.flags.contains(flag) {
                write!(f, " {name}")?;
            }
        }
        Ok(())
    }
}
