//! Lookup and churn counters for [`SharedLruCache`](crate::SharedLruCache)

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated without taking the cache lock
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Lookups that found their key
    pub hits: u64,
    /// Lookups that did not
    pub misses: u64,
    /// New keys stored (overwrites excluded)
    pub inserts: u64,
    /// Entries dropped to make room
    pub evictions: u64,
}

impl StatsSnapshot {
    /// Fraction of lookups that hit, 0.0 when nothing was looked up
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl CacheStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_lookup(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self, evicted: bool) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
        if evicted {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get total hits
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Get total misses
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get total inserts
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Get total evictions
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        self.snapshot().hit_ratio()
    }

    /// Copy all counters at once
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            inserts: self.inserts(),
            evictions: self.evictions(),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [&self.hits, &self.misses, &self.inserts, &self.evictions] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
