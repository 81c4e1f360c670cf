//! DNS label handling.
//!
//! A label is a single component of a domain name, 1 to 63 bytes.

use std::cmp::Ordering;
use std::fmt;

/// A single DNS label, borrowed from a [`Name`](super::Name).
///
/// In `www.example.com.` the labels are `www`, `example` and `com`; the
/// terminating root label is not yielded.
#[derive(Clone, Copy)]
pub struct Label<'a> {
    /// The raw bytes of the label (without length prefix).
    bytes: &'a [u8],
}

impl<'a> Label<'a> {
    /// Creates a label from a byte slice.
    #[inline]
    pub const fn from_bytes(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes of the label.
    #[inline]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Returns the length of the label in bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the label has no bytes.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns true if this label is the wildcard `*`.
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.bytes == b"*"
    }

    /// Case-insensitive comparison with another label (ASCII folding only).
    #[inline]
    pub fn eq_ignore_ascii_case(&self, other: &Label<'_>) -> bool {
        self.bytes.eq_ignore_ascii_case(other.bytes)
    }

    /// Canonical comparison per RFC 4034 Section 6.1.
    ///
    /// Labels compare as octet strings after ASCII lowercasing; a label that
    /// is a prefix of another sorts first.
    pub fn cmp_canonical(&self, other: &Label<'_>) -> Ordering {
        self.bytes
            .iter()
            .map(u8::to_ascii_lowercase)
            .cmp(other.bytes.iter().map(u8::to_ascii_lowercase))
    }
}

impl fmt::Display for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.bytes {
            if byte == b'.' || byte == b'\\' {
                write!(f, "\\{}", byte as char)?;
            } else if byte.is_ascii_graphic() {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\{byte:03}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label(\"{self}\")")
    }
}

impl PartialEq for Label<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.eq_ignore_ascii_case(other)
    }
}

impl Eq for Label<'_> {}

impl PartialOrd for Label<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_canonical(other)
    }
}

/// Iterator over the labels of an uncompressed wire-format name.
#[derive(Debug, Clone)]
pub struct LabelIter<'a> {
    /// The wire format bytes.
    wire: &'a [u8],
    /// Current position in the wire data.
    pos: usize,
}

impl<'a> LabelIter<'a> {
    /// Creates a new label iterator from uncompressed wire format bytes.
    #[inline]
    pub const fn new(wire: &'a [u8]) -> Self {
        Self { wire, pos: 0 }
    }
}

impl<'a> Iterator for LabelIter<'a> {
    type Item = Label<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = *self.wire.get(self.pos)? as usize;
        if len == 0 {
            return None;
        }
        let start = self.pos + 1;
        let bytes = self.wire.get(start..start + len)?;
        self.pos = start + len;
        Some(Label::from_bytes(bytes))
    }
}
