//! Resolver counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for resolver activity.
#[derive(Debug, Default)]
pub struct ResolverStats {
    /// Resolutions started.
    pub resolutions: AtomicU64,
    /// Queries sent to nameservers, TCP retries included.
    pub queries_sent: AtomicU64,
    /// Referrals followed.
    pub referrals_followed: AtomicU64,
    /// Questions answered from the cache.
    pub cache_hits: AtomicU64,
    /// Truncated UDP responses retried over TCP.
    pub truncation_retries: AtomicU64,
    /// Exchanges that failed and moved on to the next server.
    pub server_failures: AtomicU64,
}

impl ResolverStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            resolutions: self.resolutions.load(Ordering::Relaxed),
            queries_sent: self.queries_sent.load(Ordering::Relaxed),
            referrals_followed: self.referrals_followed.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            truncation_retries: self.truncation_retries.load(Ordering::Relaxed),
            server_failures: self.server_failures.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`ResolverStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Resolutions started.
    pub resolutions: u64,
    /// Queries sent to nameservers.
    pub queries_sent: u64,
    /// Referrals followed.
    pub referrals_followed: u64,
    /// Cache answers.
    pub cache_hits: u64,
    /// TCP retries after truncation.
    pub truncation_retries: u64,
    /// Failed exchanges.
    pub server_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let stats = ResolverStats::new();
        ResolverStats::incr(&stats.queries_sent);
        ResolverStats::incr(&stats.queries_sent);
        ResolverStats::incr(&stats.cache_hits);

        let snap = stats.snapshot();
        assert_eq!(snap.queries_sent, 2);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.referrals_followed, 0);
    }
}
