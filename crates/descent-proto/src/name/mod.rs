//! DNS domain name representation and operations.
//!
//! This module provides the domain name type used throughout descent:
//!
//! - Inline storage of the uncompressed wire form
//! - Presentation-format parsing with `\.` and `\DDD` escapes
//! - Wire format parsing with backward-only compression pointers
//! - Compressed encoding through an explicit [`CompressionTable`]
//! - Case-insensitive comparison and hashing (ASCII folding only)

mod compress;
mod label;
mod parse;

pub use compress::CompressionTable;
pub use label::{Label, LabelIter};
pub use parse::NameParser;

use crate::error::{Error, Result};
use crate::{MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A DNS domain name.
///
/// Domain names are sequences of labels. Each label can be up to 63 bytes,
/// and the entire name in wire format can be up to 255 bytes including
/// length bytes and the terminating root label.
///
/// # Wire Format
///
/// `www.example.com.` is encoded as:
///
/// ```text
/// 03 'w' 'w' 'w' 07 'e' 'x' 'a' 'm' 'p' 'l' 'e' 03 'c' 'o' 'm' 00
/// ```
///
/// Inside a message a trailing part of the name may be replaced by a two-byte
/// pointer (top bits `11`, 14-bit offset) to an earlier copy of that suffix.
///
/// # Comparison Semantics
///
/// Names keep the case they were created with but compare and hash
/// case-insensitively over ASCII letters. Other octets compare exactly.
///
/// # Example
///
/// ```rust
/// use descent_proto::name::Name;
/// use std::str::FromStr;
///
/// let name = Name::from_str("www.example.com.").unwrap();
/// assert_eq!(name.label_count(), 3);
/// assert_eq!(Name::from_str("WWW.EXAMPLE.COM").unwrap(), name);
/// ```
#[derive(Clone)]
pub struct Name {
    /// Uncompressed wire form, always terminated by the root byte.
    wire: SmallVec<[u8; 64]>,
    /// Number of labels, not counting the root.
    label_count: u8,
}

impl Name {
    /// Creates the root domain name (zero labels).
    #[inline]
    pub fn root() -> Self {
        let mut wire = SmallVec::new();
        wire.push(0);
        Self {
            wire,
            label_count: 0,
        }
    }

    /// Assembles a name from already validated parts.
    pub(crate) fn from_parts(wire: SmallVec<[u8; 64]>, label_count: u8) -> Self {
        Self { wire, label_count }
    }

    /// Creates a name from raw labels.
    pub fn from_labels<'a, I>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut wire = SmallVec::<[u8; 64]>::new();
        let mut label_count = 0u8;

        for label in labels {
            if label.is_empty() {
                return Err(Error::EmptyLabel {
                    position: usize::from(label_count),
                });
            }
            if label.len() > MAX_LABEL_LENGTH {
                return Err(Error::label_too_long(label.len()));
            }
            wire.push(label.len() as u8);
            wire.extend_from_slice(label);
            label_count += 1;

            if wire.len() + 1 > MAX_NAME_LENGTH {
                return Err(Error::name_too_long(wire.len() + 1));
            }
        }

        wire.push(0);
        Ok(Self { wire, label_count })
    }

    /// Creates a name from uncompressed wire format bytes.
    pub fn from_wire(wire: &[u8]) -> Result<Self> {
        let (name, consumed) = NameParser::new(wire).parse_name(0)?;
        if consumed != wire.len() {
            return Err(Error::invalid_data(consumed, "trailing bytes after name"));
        }
        Ok(name)
    }

    /// Returns the uncompressed wire format representation.
    #[inline]
    pub fn as_wire(&self) -> &[u8] {
        &self.wire
    }

    /// Returns the uncompressed wire format length (including terminating zero).
    #[inline]
    pub fn wire_len(&self) -> usize {
        self.wire.len()
    }

    /// Returns the number of labels in the name, not counting the root.
    #[inline]
    pub const fn label_count(&self) -> usize {
        self.label_count as usize
    }

    /// Returns true if this is the root domain.
    #[inline]
    pub const fn is_root(&self) -> bool {
        self.label_count == 0
    }

    /// Returns an iterator over the labels in the name, leftmost first.
    #[inline]
    pub fn labels(&self) -> LabelIter<'_> {
        LabelIter::new(&self.wire)
    }

    /// Returns the label at the given index (0 = leftmost label).
    pub fn label(&self, index: usize) -> Option<Label<'_>> {
        self.labels().nth(index)
    }

    /// Byte offset in `wire` after skipping `skip` leading labels.
    fn suffix_offset(&self, skip: usize) -> usize {
        let mut pos = 0;
        for _ in 0..skip {
            pos += 1 + self.wire[pos] as usize;
        }
        pos
    }

    /// Returns the name made of the rightmost `count` labels.
    ///
    /// Returns `None` if the name has fewer than `count` labels.
    pub fn trim_to(&self, count: usize) -> Option<Self> {
        let skip = self.label_count().checked_sub(count)?;
        let start = self.suffix_offset(skip);
        Some(Self {
            wire: SmallVec::from_slice(&self.wire[start..]),
            label_count: count as u8,
        })
    }

    /// Returns the parent domain (removes the leftmost label).
    ///
    /// Returns `None` for the root domain.
    pub fn parent(&self) -> Option<Self> {
        self.trim_to(self.label_count().checked_sub(1)?)
    }

    /// Returns the subdomain formed by prepending a label.
    pub fn prepend_label(&self, label: &[u8]) -> Result<Self> {
        if label.is_empty() {
            return Err(Error::EmptyLabel { position: 0 });
        }
        if label.len() > MAX_LABEL_LENGTH {
            return Err(Error::label_too_long(label.len()));
        }

        let new_len = 1 + label.len() + self.wire.len();
        if new_len > MAX_NAME_LENGTH {
            return Err(Error::name_too_long(new_len));
        }

        let mut wire = SmallVec::with_capacity(new_len);
        wire.push(label.len() as u8);
        wire.extend_from_slice(label);
        wire.extend_from_slice(&self.wire);

        Ok(Self {
            wire,
            label_count: self.label_count + 1,
        })
    }

    /// Returns true if this name equals `other` or lies beneath it.
    pub fn is_subdomain_of(&self, other: &Name) -> bool {
        let Some(skip) = self.label_count().checked_sub(other.label_count()) else {
            return false;
        };
        let start = self.suffix_offset(skip);
        self.wire[start..].eq_ignore_ascii_case(&other.wire)
    }

    /// Returns true if this name lies strictly beneath `other`.
    pub fn is_strict_subdomain_of(&self, other: &Name) -> bool {
        self.label_count > other.label_count && self.is_subdomain_of(other)
    }

    /// Returns the number of rightmost labels shared with `other`.
    pub fn common_label_count(&self, other: &Name) -> usize {
        let a: SmallVec<[Label<'_>; 8]> = self.labels().collect();
        let b: SmallVec<[Label<'_>; 8]> = other.labels().collect();
        a.iter()
            .rev()
            .zip(b.iter().rev())
            .take_while(|(x, y)| x.eq_ignore_ascii_case(y))
            .count()
    }

    /// Returns a lowercased copy of the name.
    #[must_use]
    pub fn to_lowercase(&self) -> Self {
        Self {
            wire: self.wire.iter().map(u8::to_ascii_lowercase).collect(),
            label_count: self.label_count,
        }
    }

    /// Writes the name uncompressed.
    ///
    /// Used for RDATA names that RFC 3597 forbids compressing (SRV, RRSIG,
    /// NSEC) and for canonical forms.
    pub fn write_wire(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.wire);
    }

    /// Writes the name, replacing the longest already-written suffix with a
    /// pointer.
    ///
    /// `buf` must start at the first byte of the message so buffer offsets
    /// are message offsets. Every suffix written out in full is recorded in
    /// `table` for later names.
    pub fn write_compressed(&self, buf: &mut BytesMut, table: &mut CompressionTable) {
        let mut pos = 0;

        while self.wire[pos] != 0 {
            let suffix = &self.wire[pos..];
            if let Some(offset) = table.lookup(suffix) {
                buf.put_u16(0xC000 | offset);
                return;
            }

            table.record(suffix, buf.len());
            let len = self.wire[pos] as usize;
            buf.extend_from_slice(&self.wire[pos..=pos + len]);
            pos += 1 + len;
        }

        buf.put_u8(0);
    }
}

/// Parses presentation-format text into wire labels.
fn parse_presentation(text: &str) -> Result<Name> {
    let bytes = text.as_bytes();
    let mut wire = SmallVec::<[u8; 64]>::new();
    let mut label = SmallVec::<[u8; 64]>::new();
    let mut label_count = 0u8;
    let mut i = 0;

    let invalid_escape = |position| Error::InvalidEscape {
        text: text.to_owned(),
        position,
    };

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                let next = *bytes.get(i + 1).ok_or_else(|| invalid_escape(i))?;
                if next.is_ascii_digit() {
                    let digits = bytes.get(i + 1..i + 4).ok_or_else(|| invalid_escape(i))?;
                    if !digits.iter().all(u8::is_ascii_digit) {
                        return Err(invalid_escape(i));
                    }
                    let value = digits
                        .iter()
                        .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
                    let value = u8::try_from(value).map_err(|_| invalid_escape(i))?;
                    label.push(value);
                    i += 4;
                } else {
                    label.push(next);
                    i += 2;
                }
            }
            b'.' => {
                if label.is_empty() {
                    return Err(Error::EmptyLabel { position: i });
                }
                push_label(&mut wire, &mut label, &mut label_count)?;
                i += 1;
            }
            byte => {
                label.push(byte);
                i += 1;
            }
        }

        if label.len() > MAX_LABEL_LENGTH {
            return Err(Error::label_too_long(label.len()));
        }
    }

    if !label.is_empty() {
        push_label(&mut wire, &mut label, &mut label_count)?;
    }

    wire.push(0);
    Ok(Name { wire, label_count })
}

fn push_label(
    wire: &mut SmallVec<[u8; 64]>,
    label: &mut SmallVec<[u8; 64]>,
    label_count: &mut u8,
) -> Result<()> {
    // +1 for the root byte still to come
    let new_len = wire.len() + 1 + label.len() + 1;
    if new_len > MAX_NAME_LENGTH {
        return Err(Error::name_too_long(new_len));
    }
    wire.push(label.len() as u8);
    wire.extend_from_slice(label);
    label.clear();
    *label_count += 1;
    Ok(())
}

impl FromStr for Name {
    type Err = Error;

    /// Parses a domain name in presentation format.
    ///
    /// The trailing dot is optional; `""` and `"."` are the root. Supported
    /// escapes are `\X` for a literal character and `\DDD` for a decimal
    /// octet value.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s == "." {
            return Ok(Self::root());
        }
        parse_presentation(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in self.labels() {
            write!(f, "{label}.")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name(\"{self}\")")
    }
}

impl PartialEq for Name {
    /// Case-insensitive comparison per DNS semantics.
    fn eq(&self, other: &Self) -> bool {
        // Length bytes are below 64 and never change under ASCII folding
        self.label_count == other.label_count && self.wire.eq_ignore_ascii_case(&other.wire)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.label_count);
        for byte in &self.wire {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    /// Canonical DNS name ordering per RFC 4034 Section 6.1.
    fn cmp(&self, other: &Self) -> Ordering {
        let a: SmallVec<[Label<'_>; 8]> = self.labels().collect();
        let b: SmallVec<[Label<'_>; 8]> = other.labels().collect();

        for (x, y) in a.iter().rev().zip(b.iter().rev()) {
            match x.cmp_canonical(y) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }

        a.len().cmp(&b.len())
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::root()
    }
}

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
