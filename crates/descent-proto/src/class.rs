//! DNS record classes.

use crate::error::Error;
use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// DNS record class.
///
/// Almost all traffic is `IN`. Unassigned values are kept in
/// [`RecordClass::Unknown`] and presented as `CLASS<n>`. The OPT
/// pseudo-record reuses the class field for the UDP payload size, which is
/// why decoding never rejects a class value.
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
pub enum RecordClass {
    /// Internet - RFC 1035
    IN = 1,

    /// Chaos - RFC 1035
    CH = 3,

    /// Hesiod - RFC 1035
    HS = 4,

    /// No class (dynamic update) - RFC 2136
    NONE = 254,

    /// Any class (queries only) - RFC 1035
    ANY = 255,

    /// Any other class value.
    #[num_enum(catch_all)]
    Unknown(u16),
}

impl RecordClass {
    /// Returns the numeric value of the class.
    #[inline]
    pub fn to_u16(self) -> u16 {
        self.into()
    }

    /// Creates a class from its numeric value.
    #[inline]
    pub fn from_u16(value: u16) -> Self {
        Self::from_primitive(value)
    }
}

impl Default for RecordClass {
    fn default() -> Self {
        Self::IN
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IN => f.write_str("IN"),
            Self::CH => f.write_str("CH"),
            Self::HS => f.write_str("HS"),
            Self::NONE => f.write_str("NONE"),
            Self::ANY => f.write_str("ANY"),
            Self::Unknown(v) => write!(f, "CLASS{v}"),
        }
    }
}

impl FromStr for RecordClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "IN" => Ok(Self::IN),
            "CH" | "CHAOS" => Ok(Self::CH),
            "HS" | "HESIOD" => Ok(Self::HS),
            "NONE" => Ok(Self::NONE),
            "ANY" => Ok(Self::ANY),
            other => other
                .strip_prefix("CLASS")
                .and_then(|v| v.parse::<u16>().ok())
                .map(Self::from_u16)
                .ok_or_else(|| Error::InvalidRecordClass {
                    value: s.to_owned(),
                }),
        }
    }
}
