//! Cache entry implementation.

use descent_proto::{ResourceRecord, ResponseCode};
use std::time::Instant;

/// What a cache entry asserts about its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryData {
    /// The RRset exists; records carry their originally received TTLs.
    Positive(Vec<ResourceRecord>),
    /// The name or type does not exist (NXDOMAIN or NODATA).
    Negative(ResponseCode),
}

/// How far cached data may be relied on.
///
/// Ordered so that `Delegation < Answer`: data from a referral never
/// replaces data an authoritative server gave as an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Trust {
    /// Parent-side NS records and glue from a referral. Good enough to find
    /// nameservers, never returned as an answer.
    Delegation,
    /// Answer-section data or a negative result.
    Answer,
}

/// A cached RRset or negative result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    data: EntryData,
    trust: Trust,
    inserted_at: Instant,
    /// Lifetime in seconds, counted from `inserted_at`.
    ttl: u32,
}

impl CacheEntry {
    /// Creates a positive entry.
    pub fn positive(records: Vec<ResourceRecord>, trust: Trust, ttl: u32, now: Instant) -> Self {
        Self {
            data: EntryData::Positive(records),
            trust,
            inserted_at: now,
            ttl,
        }
    }

    /// Creates a negative entry.
    pub fn negative(rcode: ResponseCode, ttl: u32, now: Instant) -> Self {
        Self {
            data: EntryData::Negative(rcode),
            trust: Trust::Answer,
            inserted_at: now,
            ttl,
        }
    }

    /// Returns the entry payload.
    pub fn data(&self) -> &EntryData {
        &self.data
    }

    /// Returns the trust level of the entry.
    pub fn trust(&self) -> Trust {
        self.trust
    }

    /// Returns true for a negative entry.
    pub fn is_negative(&self) -> bool {
        matches!(self.data, EntryData::Negative(_))
    }

    /// Returns when the entry was stored.
    pub fn inserted_at(&self) -> Instant {
        self.inserted_at
    }

    /// Returns the TTL the entry was stored with.
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Returns the seconds left before expiry; zero once expired.
    pub fn remaining_ttl(&self, now: Instant) -> u32 {
        let elapsed = now
            .checked_duration_since(self.inserted_at)
            .map_or(0, |d| d.as_secs());
        u64::from(self.ttl).saturating_sub(elapsed) as u32
    }

    /// Returns true once the remaining TTL has reached zero.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.remaining_ttl(now) == 0
    }

    /// Returns the records rewritten with the remaining TTL, or an empty
    /// list for a negative entry.
    pub fn records_at(&self, now: Instant) -> Vec<ResourceRecord> {
        let remaining = self.remaining_ttl(now);
        match &self.data {
            EntryData::Positive(records) => records.iter().map(|r| r.with_ttl(remaining)).collect(),
            EntryData::Negative(_) => Vec::new(),
        }
    }
}
