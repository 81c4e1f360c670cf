//! Wire format utilities.
//!
//! This module provides the bounds-checked cursor used by every decoder in
//! the crate, plus a few free helpers shared by record types.

use crate::error::{Error, Result};
use crate::name::{Name, NameParser};

/// A cursor for reading DNS wire format data.
///
/// The cursor always keeps a reference to the *whole* message so names can
/// follow compression pointers anywhere before them, while reads of fixed
/// fields are limited to `end`. Record decoders use this to stay inside a
/// record's RDLENGTH without losing access to the enclosing buffer.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    /// The complete message.
    data: &'a [u8],
    /// Current position.
    pos: usize,
    /// Exclusive upper bound for reads.
    end: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a new wire reader over the whole buffer.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            end: data.len(),
        }
    }

    /// Creates a reader positioned at `start` that may not read past `end`.
    ///
    /// `end` is clamped to the buffer length.
    #[inline]
    pub fn bounded(data: &'a [u8], start: usize, end: usize) -> Self {
        Self {
            data,
            pos: start,
            end: end.min(data.len()),
        }
    }

    /// Returns the underlying message.
    #[inline]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the current position.
    #[inline]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the read limit.
    #[inline]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Returns the number of bytes left before the limit.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.pos)
    }

    /// Returns true if there are no remaining bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        if self.pos >= self.end {
            return Err(Error::unexpected_eof(self.pos));
        }
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    /// Reads a big-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a big-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a slice of bytes.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.pos + len > self.end {
            return Err(Error::unexpected_eof(self.end));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Reads everything up to the limit.
    #[inline]
    pub fn read_rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos.min(self.end)..self.end];
        self.pos = self.end;
        slice
    }

    /// Reads a `<character-string>` (length byte followed by data).
    pub fn read_character_string(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u8()? as usize;
        self.read_bytes(len)
    }

    /// Reads a possibly compressed domain name.
    ///
    /// Pointers may reference any earlier part of the message, but the bytes
    /// of the name at the current position must lie within the read limit.
    pub fn read_name(&mut self) -> Result<Name> {
        let (name, consumed) = NameParser::new(self.data).parse_name(self.pos)?;
        if self.pos + consumed > self.end {
            return Err(Error::unexpected_eof(self.end));
        }
        self.pos += consumed;
        Ok(name)
    }
}

/// Calculates the RFC 4034 Appendix B checksum over DNSKEY RDATA.
pub fn key_tag_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    for (i, &byte) in data.iter().enumerate() {
        if i & 1 == 0 {
            sum += u32::from(byte) << 8;
        } else {
            sum += u32::from(byte);
        }
    }

    sum += (sum >> 16) & 0xFFFF;
    (sum & 0xFFFF) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_reader() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A];
        let mut reader = WireReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x12);
        assert_eq!(reader.read_u16().unwrap(), 0x3456);
        assert_eq!(reader.remaining(), 2);
        assert_eq!(reader.read_bytes(2).unwrap(), &[0x78, 0x9A]);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_wire_reader_bounds() {
        let data = [0x12, 0x34];
        let mut reader = WireReader::new(&data);

        assert!(matches!(
            reader.read_u32(),
            Err(Error::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_bounded_reader_stops_at_limit() {
        let data = [1, 2, 3, 4, 5, 6];
        let mut reader = WireReader::bounded(&data, 1, 4);

        assert_eq!(reader.read_u16().unwrap(), 0x0203);
        assert!(reader.read_u16().is_err());
        assert_eq!(reader.read_rest(), &[4]);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_name_respects_limit() {
        // "a" at offset 0, then a pointer back to it at offset 3
        let data = [1, b'a', 0, 0xC0, 0x00];
        let mut reader = WireReader::bounded(&data, 3, 5);
        let name = reader.read_name().unwrap();
        assert_eq!(name.to_string(), "a.");
        assert_eq!(reader.position(), 5);

        // Same pointer with only one byte of room
        let mut reader = WireReader::bounded(&data, 3, 4);
        assert!(reader.read_name().is_err());
    }

    #[test]
    fn test_key_tag_checksum() {
        let data = [0x01, 0x00, 0x03, 0x08];
        assert_eq!(key_tag_checksum(&data), 0x0408);
    }
}
