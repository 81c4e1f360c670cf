//! Opaque record data for types without a structured decoder.

use crate::error::Result;
use crate::rtype::RecordType;
use crate::wire::WireReader;
use bytes::BytesMut;
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw RDATA kept verbatim (RFC 3597).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unknown {
    rtype: u16,
    data: Vec<u8>,
}

impl Unknown {
    /// Creates opaque record data for the given type.
    pub fn new(rtype: RecordType, data: &[u8]) -> Self {
        Self {
            rtype: rtype.to_u16(),
            data: data.to_vec(),
        }
    }

    /// Returns the record type this payload belongs to.
    #[inline]
    pub fn record_type(&self) -> RecordType {
        RecordType::from_u16(self.rtype)
    }

    /// Returns the raw octets.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Takes the remainder of the reader as opaque data.
    pub fn parse(rtype: RecordType, reader: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self::new(rtype, reader.read_rest()))
    }

    /// Writes the payload unchanged.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.data);
    }
}

impl fmt::Display for Unknown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\# {}", self.data.len())?;
        if !self.data.is_empty() {
            write!(f, " {}", HEXLOWER.encode(&self.data))?;
        }
        Ok(())
    }
}
