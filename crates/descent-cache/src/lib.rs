//! # Descent Zone Cache
//!
//! A bounded, TTL-aware store of resource records keyed by
//! `(name, type, class)`, shared by every resolution in a process.
//!
//! ## Behaviour
//!
//! - Lookups return records with their *remaining* TTL; expired entries are
//!   dropped lazily on lookup or in bulk with [`ZoneCache::evict_expired`]
//! - Inserting into an existing live entry merges and deduplicates records;
//!   the entry TTL becomes the minimum over the merged set
//! - Negative results (NXDOMAIN / NODATA) are cached per key
//! - Referral NS records and glue are kept at [`Trust::Delegation`]: they
//!   help find nameservers but [`ZoneCache::get_entry`] never reports them
//!   as an answer, and they never overwrite answer data
//! - Least-recently-used entries are evicted beyond the configured capacity;
//!   a capacity of zero turns the cache into a pass-through
//! - Time comes from an injectable [`Clock`]

#![warn(missing_docs)]

use descent_proto::{Name, RecordClass, RecordType, ResourceRecord, ResponseCode};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

pub mod clock;
pub mod entry;
pub mod key;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, EntryData, Trust};
pub use key::CacheKey;

/// Zone cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of RRsets held. Zero disables caching.
    pub capacity: usize,

    /// TTL floor in seconds for positive entries.
    pub min_ttl: u32,

    /// TTL ceiling in seconds for positive entries.
    pub max_ttl: u32,

    /// Ceiling in seconds for negative entries.
    pub negative_ttl_cap: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            min_ttl: 0,
            max_ttl: 86400 * 7,
            negative_ttl_cap: 10_800,
        }
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// A live answer RRset, TTLs set to the remaining lifetime.
    Positive(Vec<ResourceRecord>),
    /// A live RRset learned from a referral (NS or glue). Not an answer.
    Delegation(Vec<ResourceRecord>),
    /// A live negative result.
    Negative {
        /// NXDOMAIN or NOERROR (NODATA).
        rcode: ResponseCode,
        /// Seconds left.
        remaining_ttl: u32,
    },
}

/// TTL-aware LRU record cache.
#[derive(Debug)]
pub struct ZoneCache {
    config: CacheConfig,
    /// `None` when capacity is zero.
    entries: Option<Mutex<LruCache<CacheKey, CacheEntry>>>,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
}

impl ZoneCache {
    /// Creates a cache driven by the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache with an explicit clock.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let entries = NonZeroUsize::new(config.capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self {
            config,
            entries,
            clock,
            stats: CacheStats::default(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the live records for a key at any trust level, or an empty
    /// list on a miss or a negative entry.
    pub fn get(&self, name: &Name, rtype: RecordType, rclass: RecordClass) -> Vec<ResourceRecord> {
        match self.get_entry(name, rtype, rclass) {
            Some(CacheLookup::Positive(records) | CacheLookup::Delegation(records)) => records,
            _ => Vec::new(),
        }
    }

    /// Looks up a key, distinguishing positive and negative entries.
    pub fn get_entry(
        &self,
        name: &Name,
        rtype: RecordType,
        rclass: RecordClass,
    ) -> Option<CacheLookup> {
        let Some(entries) = &self.entries else {
            self.stats.record_miss();
            return None;
        };

        let key = CacheKey::new(name, rtype, rclass);
        let now = self.clock.now();
        let mut entries = entries.lock();

        let expired = match entries.get(&key) {
            None => {
                self.stats.record_miss();
                trace!(%key, "cache miss");
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            entries.pop(&key);
            self.stats.record_expiration();
            self.stats.record_miss();
            trace!(%key, "cache entry expired");
            return None;
        }

        let entry = entries.get(&key)?;
        self.stats.record_hit();
        trace!(%key, remaining = entry.remaining_ttl(now), "cache hit");

        Some(match entry.data() {
            EntryData::Positive(_) if entry.trust() == Trust::Delegation => {
                CacheLookup::Delegation(entry.records_at(now))
            }
            EntryData::Positive(_) => CacheLookup::Positive(entry.records_at(now)),
            EntryData::Negative(rcode) => CacheLookup::Negative {
                rcode: *rcode,
                remaining_ttl: entry.remaining_ttl(now),
            },
        })
    }

    /// Stores answer records, grouped by `(name, type, class)`.
    ///
    /// Records with a TTL of zero are not cached. A group is merged with a
    /// live answer entry for the same key (duplicates dropped); the merged
    /// entry is stamped now with the smallest TTL of the set. A positive
    /// entry replaces a negative one and any delegation data.
    pub fn put<'a, I>(&self, records: I)
    where
        I: IntoIterator<Item = &'a ResourceRecord>,
    {
        self.store(records, Trust::Answer);
    }

    /// Stores NS records and glue taken from a referral.
    ///
    /// They merge with live delegation data for the same key. A live answer
    /// or negative entry for the key is left untouched.
    pub fn put_delegation<'a, I>(&self, records: I)
    where
        I: IntoIterator<Item = &'a ResourceRecord>,
    {
        self.store(records, Trust::Delegation);
    }

    fn store<'a, I>(&self, records: I, trust: Trust)
    where
        I: IntoIterator<Item = &'a ResourceRecord>,
    {
        let Some(entries) = &self.entries else {
            return;
        };

        let mut groups: Vec<(CacheKey, Vec<ResourceRecord>)> = Vec::new();
        for record in records {
            if record.ttl() == 0 || record.rtype().is_pseudo_record() {
                continue;
            }
            let key = CacheKey::new(record.name(), record.rtype(), record.rclass());
            let ttl = record.ttl().clamp(self.config.min_ttl, self.config.max_ttl.max(self.config.min_ttl));
            let record = record.with_ttl(ttl);
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, group)) => push_unique(group, record),
                None => groups.push((key, vec![record])),
            }
        }

        let now = self.clock.now();
        let mut entries = entries.lock();
        for (key, mut records) in groups {
            if let Some(existing) = entries.peek(&key) {
                if !existing.is_expired(now) {
                    if existing.trust() > trust {
                        trace!(%key, "keeping answer over delegation data");
                        continue;
                    }
                    if existing.trust() == trust {
                        for record in existing.records_at(now) {
                            push_unique(&mut records, record);
                        }
                    }
                }
            }

            let ttl = records.iter().map(ResourceRecord::ttl).min().unwrap_or(0);
            if ttl == 0 {
                entries.pop(&key);
                continue;
            }
            trace!(%key, ttl, count = records.len(), "caching rrset");
            self.insert(&mut entries, key, CacheEntry::positive(records, trust, ttl, now));
        }
    }

    /// Stores a negative result for a key. The TTL is capped by
    /// `negative_ttl_cap`; a TTL of zero stores nothing.
    pub fn put_negative(
        &self,
        name: &Name,
        rtype: RecordType,
        rclass: RecordClass,
        ttl: u32,
        rcode: ResponseCode,
    ) {
        let Some(entries) = &self.entries else {
            return;
        };
        let ttl = ttl.min(self.config.negative_ttl_cap);
        if ttl == 0 {
            return;
        }

        let key = CacheKey::new(name, rtype, rclass);
        debug!(%key, ttl, %rcode, "caching negative answer");
        let entry = CacheEntry::negative(rcode, ttl, self.clock.now());
        self.insert(&mut entries.lock(), key, entry);
    }

    fn insert(&self, entries: &mut LruCache<CacheKey, CacheEntry>, key: CacheKey, entry: CacheEntry) {
        if !entries.contains(&key) && entries.len() == entries.cap().get() {
            if let Some((evicted, _)) = entries.pop_lru() {
                self.stats.record_eviction();
                trace!(key = %evicted, "evicted least recently used entry");
            }
        }
        entries.put(key, entry);
        self.stats.record_insert();
    }

    /// Drops every expired entry. Returns the number removed.
    pub fn evict_expired(&self) -> usize {
        let Some(entries) = &self.entries else {
            return 0;
        };
        let now = self.clock.now();
        let mut entries = entries.lock();

        let expired: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
            self.stats.record_expiration();
        }

        if !expired.is_empty() {
            debug!(removed = expired.len(), remaining = entries.len(), "evicted expired entries");
        }
        expired.len()
    }

    /// Removes everything.
    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().clear();
        }
    }

    /// Returns the number of stored entries, expired ones included until
    /// they are evicted.
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |e| e.lock().len())
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

fn push_unique(records: &mut Vec<ResourceRecord>, record: ResourceRecord) {
    if !records.iter().any(|r| r.same_data(&record)) {
        records.push(record);
    }
}

/// Cache statistics.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl CacheStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    /// Lookups that found a live entry.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that found nothing usable.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Entries written.
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Entries dropped to make room.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Entries dropped because their TTL ran out.
    pub fn expirations(&self) -> u64 {
        self.expirations.load(Ordering::Relaxed)
    }

    /// Fraction of lookups that hit.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::str::FromStr;
    use std::time::Duration;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    fn a(owner: &str, ttl: u32, last: u8) -> ResourceRecord {
        ResourceRecord::a(name(owner), ttl, Ipv4Addr::new(192, 0, 2, last))
    }

    fn manual_cache(capacity: usize) -> (ZoneCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig {
            capacity,
            ..CacheConfig::default()
        };
        (ZoneCache::with_clock(config, clock.clone()), clock)
    }

    #[test]
    fn test_hit_then_expiry() {
        let (cache, clock) = manual_cache(16);
        cache.put(&[a("www.example.com", 30, 1)]);

        let hit = cache.get(&name("WWW.example.com"), RecordType::A, RecordClass::IN);
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].ttl(), 30);

        clock.advance(Duration::from_secs(10));
        let hit = cache.get(&name("www.example.com"), RecordType::A, RecordClass::IN);
        assert_eq!(hit[0].ttl(), 20);

        clock.advance(Duration::from_secs(20));
        assert!(cache.get(&name("www.example.com"), RecordType::A, RecordClass::IN).is_empty());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations(), 1);
    }

    #[test]
    fn test_merge_dedupes_and_takes_min_ttl() {
        let (cache, clock) = manual_cache(16);
        cache.put(&[a("example.com", 300, 1), a("example.com", 300, 2)]);
        clock.advance(Duration::from_secs(100));
        cache.put(&[a("example.com", 60, 2), a("example.com", 600, 3)]);

        let records = cache.get(&name("example.com"), RecordType::A, RecordClass::IN);
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.ttl() == 60));
    }

    #[test]
    fn test_zero_ttl_not_cached() {
        let (cache, _) = manual_cache(16);
        cache.put(&[a("example.com", 0, 1)]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_negative_entry() {
        let (cache, clock) = manual_cache(16);
        let owner = name("nope.example.com");
        cache.put_negative(&owner, RecordType::A, RecordClass::IN, 60, ResponseCode::NXDomain);

        assert_eq!(
            cache.get_entry(&owner, RecordType::A, RecordClass::IN),
            Some(CacheLookup::Negative {
                rcode: ResponseCode::NXDomain,
                remaining_ttl: 60
            })
        );
        assert!(cache.get(&owner, RecordType::A, RecordClass::IN).is_empty());

        clock.advance(Duration::from_secs(60));
        assert_eq!(cache.get_entry(&owner, RecordType::A, RecordClass::IN), None);
    }

    #[test]
    fn test_negative_ttl_capped() {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig {
            negative_ttl_cap: 30,
            ..CacheConfig::default()
        };
        let cache = ZoneCache::with_clock(config, clock);
        let owner = name("nope.example");
        cache.put_negative(&owner, RecordType::A, RecordClass::IN, 3600, ResponseCode::NXDomain);

        assert!(matches!(
            cache.get_entry(&owner, RecordType::A, RecordClass::IN),
            Some(CacheLookup::Negative { remaining_ttl: 30, .. })
        ));
    }

    #[test]
    fn test_positive_replaces_negative() {
        let (cache, _) = manual_cache(16);
        let owner = name("late.example");
        cache.put_negative(&owner, RecordType::A, RecordClass::IN, 60, ResponseCode::NoError);
        cache.put(&[a("late.example", 60, 9)]);

        assert_eq!(cache.get(&owner, RecordType::A, RecordClass::IN).len(), 1);
    }

    #[test]
    fn test_delegation_data_is_not_an_answer() {
        let (cache, _) = manual_cache(16);
        let owner = name("ns.example.com");
        cache.put_delegation(&[a("ns.example.com", 3600, 2)]);

        assert_eq!(
            cache.get_entry(&owner, RecordType::A, RecordClass::IN),
            Some(CacheLookup::Delegation(vec![a("ns.example.com", 3600, 2)]))
        );
        // Still usable for finding nameserver addresses
        assert_eq!(cache.get(&owner, RecordType::A, RecordClass::IN).len(), 1);
    }

    #[test]
    fn test_answer_replaces_delegation() {
        let (cache, _) = manual_cache(16);
        let owner = name("ns.example.com");
        cache.put_delegation(&[a("ns.example.com", 3600, 2)]);
        cache.put(&[a("ns.example.com", 300, 9)]);

        assert_eq!(
            cache.get_entry(&owner, RecordType::A, RecordClass::IN),
            Some(CacheLookup::Positive(vec![a("ns.example.com", 300, 9)]))
        );
    }

    #[test]
    fn test_delegation_does_not_downgrade_answer() {
        let (cache, _) = manual_cache(16);
        let owner = name("ns.example.com");
        cache.put(&[a("ns.example.com", 300, 9)]);
        cache.put_delegation(&[a("ns.example.com", 3600, 2)]);
        assert_eq!(
            cache.get_entry(&owner, RecordType::A, RecordClass::IN),
            Some(CacheLookup::Positive(vec![a("ns.example.com", 300, 9)]))
        );

        let gone = name("gone.example.com");
        cache.put_negative(&gone, RecordType::A, RecordClass::IN, 60, ResponseCode::NXDomain);
        cache.put_delegation(&[a("gone.example.com", 3600, 3)]);
        assert!(matches!(
            cache.get_entry(&gone, RecordType::A, RecordClass::IN),
            Some(CacheLookup::Negative { .. })
        ));
    }

    #[test]
    fn test_lru_eviction() {
        let (cache, _) = manual_cache(2);
        cache.put(&[a("one.example", 60, 1)]);
        cache.put(&[a("two.example", 60, 2)]);
        // Touch "one" so "two" becomes least recently used.
        assert!(!cache.get(&name("one.example"), RecordType::A, RecordClass::IN).is_empty());
        cache.put(&[a("three.example", 60, 3)]);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions(), 1);
        assert!(cache.get(&name("two.example"), RecordType::A, RecordClass::IN).is_empty());
        assert!(!cache.get(&name("one.example"), RecordType::A, RecordClass::IN).is_empty());
    }

    #[test]
    fn test_zero_capacity_is_pass_through() {
        let (cache, _) = manual_cache(0);
        cache.put(&[a("example.com", 60, 1)]);
        cache.put_negative(&name("x.example"), RecordType::A, RecordClass::IN, 60, ResponseCode::NXDomain);

        assert!(cache.is_empty());
        assert!(cache.get(&name("example.com"), RecordType::A, RecordClass::IN).is_empty());
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_evict_expired() {
        let (cache, clock) = manual_cache(16);
        cache.put(&[a("short.example", 10, 1), a("long.example", 100, 2)]);
        assert_eq!(cache.len(), 2);

        clock.advance(Duration::from_secs(10));
        assert_eq!(cache.evict_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_shared_across_tasks() {
        let cache = Arc::new(ZoneCache::new(CacheConfig::default()));

        let mut handles = Vec::new();
        for i in 0..8u8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let owner = format!("host{i}.example");
                cache.put(&[a(&owner, 60, i)]);
                cache.get(&name(&owner), RecordType::A, RecordClass::IN).len()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }
        assert_eq!(cache.len(), 8);
    }
}
