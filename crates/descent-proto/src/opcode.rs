//! DNS operation codes (OpCodes).
//!
//! OpCodes specify the kind of query in a DNS message header.
//! Defined in RFC 1035 Section 4.1.1 with extensions from subsequent RFCs.

use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};

/// DNS operation code.
///
/// Unassigned values are preserved in [`OpCode::Unknown`] so a message with
/// an unusual opcode still decodes and re-encodes unchanged.
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
#[repr(u8)]
pub enum OpCode {
    /// Standard query (QUERY) - RFC 1035
    Query = 0,

    /// Inverse query (IQUERY) - RFC 1035, obsoleted by RFC 3425
    IQuery = 1,

    /// Server status request (STATUS) - RFC 1035
    Status = 2,

    /// Zone change notification - RFC 1996
    Notify = 4,

    /// Dynamic update - RFC 2136
    Update = 5,

    /// DNS Stateful Operations (DSO) - RFC 8490
    Dso = 6,

    /// Any other 4-bit value.
    #[num_enum(catch_all)]
    Unknown(u8),
}

impl OpCode {
    /// Returns the numeric value of the opcode.
    #[inline]
    pub fn to_u8(self) -> u8 {
        self.into()
    }

    /// Creates an opcode from the 4-bit header field.
    #[inline]
    pub fn from_u8(value: u8) -> Self {
        Self::from_primitive(value & 0x0F)
    }
}

impl Default for OpCode {
    fn default() -> Self {
        Self::Query
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query => f.write_str("QUERY"),
            Self::IQuery => f.write_str("IQUERY"),
            Self::Status => f.write_str("STATUS"),
            Self::Notify => f.write_str("NOTIFY"),
            Self::Update => f.write_str("UPDATE"),
            Self::Dso => f.write_str("DSO"),
            Self::Unknown(v) => write!(f, "OPCODE{v}"),
        }
    }
}
