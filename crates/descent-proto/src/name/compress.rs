//! Name compression table used while encoding a message.

use crate::MAX_POINTER_OFFSET;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Offsets of name suffixes already written to the message being encoded.
///
/// A table lives for exactly one encode call. It is created by
/// [`Message::write_to`](crate::Message::write_to) and handed down by
/// `&mut` to every name written into the message, so identical suffixes
/// anywhere in the message share one copy.
///
/// Keys are the exact uncompressed wire form of the suffix. Suffixes that
/// differ only in case are written separately so every name keeps its own
/// case through an encode/decode round trip.
#[derive(Debug, Default, Clone)]
pub struct CompressionTable {
    offsets: HashMap<SmallVec<[u8; 64]>, u16>,
}

impl CompressionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of recorded suffixes.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Looks up the message offset of a previously written suffix.
    pub fn lookup(&self, suffix: &[u8]) -> Option<u16> {
        self.offsets.get(suffix).copied()
    }

    /// Records that `suffix` starts at `offset` in the message.
    ///
    /// Offsets a 14-bit pointer cannot reach are not recorded. Returns
    /// whether the entry was stored.
    pub fn record(&mut self, suffix: &[u8], offset: usize) -> bool {
        if offset > MAX_POINTER_OFFSET {
            return false;
        }
        self.offsets
            .entry(SmallVec::from_slice(suffix))
            .or_insert(offset as u16);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_exact() {
        let mut table = CompressionTable::new();
        assert!(table.record(b"\x07Example\x03COM\x00", 12));
        assert_eq!(table.lookup(b"\x07Example\x03COM\x00"), Some(12));
        assert_eq!(table.lookup(b"\x07example\x03com\x00"), None);
        assert_eq!(table.lookup(b"\x03com\x00"), None);
    }

    #[test]
    fn test_unreachable_offsets_not_recorded() {
        let mut table = CompressionTable::new();
        assert!(!table.record(b"\x03com\x00", 0x4000));
        assert!(table.is_empty());
        assert!(table.record(b"\x03com\x00", 0x3FFF));
        assert_eq!(table.lookup(b"\x03com\x00"), Some(0x3FFF));
    }

    #[test]
    fn test_first_offset_wins() {
        let mut table = CompressionTable::new();
        table.record(b"\x03com\x00", 20);
        table.record(b"\x03com\x00", 40);
        assert_eq!(table.lookup(b"\x03com\x00"), Some(20));
        assert_eq!(table.len(), 1);
    }
}
