//! DNS name parsing from wire format with compression support.
//!
//! Handles RFC 1035 Section 4.1.4 compression pointers. A pointer must
//! reference an offset strictly before the start of the label run it ends
//! (the name's first byte, or the target of the previous jump). Segment
//! starts therefore strictly decrease and decoding terminates.

use super::Name;
use crate::MAX_NAME_LENGTH;
use crate::error::{Error, Result};
use smallvec::SmallVec;

/// Parser for reading domain names from DNS wire format.
///
/// Holds the complete message buffer so pointers can be resolved.
#[derive(Debug, Clone, Copy)]
pub struct NameParser<'a> {
    /// The complete message buffer.
    message: &'a [u8],
}

impl<'a> NameParser<'a> {
    /// Creates a new name parser with the given message buffer.
    #[inline]
    pub const fn new(message: &'a [u8]) -> Self {
        Self { message }
    }

    /// Parses a domain name starting at the given offset.
    ///
    /// Returns the parsed name and the number of bytes consumed from the
    /// starting position (a followed pointer counts as its two bytes).
    pub fn parse_name(&self, offset: usize) -> Result<(Name, usize)> {
        let mut wire = SmallVec::<[u8; 64]>::new();
        let mut consumed = None;
        let mut pos = offset;
        let mut segment_start = offset;
        let mut label_count = 0u8;

        loop {
            let len_byte = *self
                .message
                .get(pos)
                .ok_or(Error::unexpected_eof(pos))?;

            match len_byte & 0xC0 {
                0xC0 => {
                    let low = *self
                        .message
                        .get(pos + 1)
                        .ok_or(Error::unexpected_eof(pos + 1))?;
                    let target = usize::from(u16::from_be_bytes([len_byte & 0x3F, low]));

                    if target >= segment_start {
                        return Err(Error::CompressionLoop {
                            offset: pos,
                            target,
                        });
                    }

                    if consumed.is_none() {
                        consumed = Some(pos - offset + 2);
                    }
                    pos = target;
                    segment_start = target;
                }
                0x00 => {
                    let len = usize::from(len_byte);

                    if len == 0 {
                        wire.push(0);
                        if consumed.is_none() {
                            consumed = Some(pos - offset + 1);
                        }
                        break;
                    }

                    let label = self
                        .message
                        .get(pos + 1..pos + 1 + len)
                        .ok_or(Error::unexpected_eof(pos + 1 + len))?;

                    // Leave room for the terminating root byte
                    if wire.len() + 1 + len + 1 > MAX_NAME_LENGTH {
                        return Err(Error::name_too_long(wire.len() + 1 + len + 1));
                    }

                    wire.push(len_byte);
                    wire.extend_from_slice(label);
                    label_count += 1;
                    pos += 1 + len;
                }
                _ => {
                    return Err(Error::InvalidLabelType {
                        offset: pos,
                        byte: len_byte,
                    });
                }
            }
        }

        let consumed = consumed.unwrap_or_default();
        Ok((Name::from_parts(wire, label_count), consumed))
    }

    /// Parses a name and returns only the name.
    #[inline]
    pub fn parse(&self, offset: usize) -> Result<Name> {
        self.parse_name(offset).map(|(name, _)| name)
    }
}
