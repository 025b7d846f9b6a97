//! SharedLruCache: a cloneable, lock-guarded handle to an LruCache

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::lru::LruCache;
use crate::stats::CacheStats;

/// Thread-safe handle combining an LRU cache with hit/miss statistics
///
/// Every operation holds one exclusive lock for its whole duration, so each
/// call is a single atomic step on the underlying cache. Reads return clones.
pub struct SharedLruCache<K, V> {
    cache: Arc<Mutex<LruCache<K, V>>>,
    stats: Arc<CacheStats>,
    capacity: usize,
}

impl<K, V> Clone for SharedLruCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            stats: Arc::clone(&self.stats),
            capacity: self.capacity,
        }
    }
}

impl<K, V> SharedLruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a new shared cache with the given capacity
    ///
    /// # Errors
    /// * `CacheError::InvalidArgument` - `capacity` is zero
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self::from_cache(LruCache::new(capacity)?))
    }

    /// Wrap an existing cache
    pub fn from_cache(cache: LruCache<K, V>) -> Self {
        let capacity = cache.capacity();
        Self {
            cache: Arc::new(Mutex::new(cache)),
            stats: Arc::new(CacheStats::new()),
            capacity,
        }
    }

    /// Insert or overwrite a value
    pub fn put(&self, key: K, value: V) {
        let mut cache = self.cache.lock();
        let is_new = !cache.contains(&key);
        let evicted = cache.push(key, value).is_some();
        if is_new {
            self.stats.record_insert(evicted);
        }
    }

    /// Get a clone of the value, marking it most recently used
    ///
    /// # Errors
    /// * `CacheError::KeyNotFound` - `key` is not cached
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        let mut cache = self.cache.lock();
        let value = cache.get(key).cloned();
        self.stats.record_lookup(value.is_ok());
        value
    }

    /// Get a clone of the value if present, marking it most recently used
    pub fn try_get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut cache = self.cache.lock();
        let value = cache.try_get(key).cloned();
        self.stats.record_lookup(value.is_some());
        value
    }

    /// Remove a key, returning whether it was present
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cache.lock().remove(key)
    }

    /// Clear the cache and reset statistics
    pub fn clear(&self) {
        self.cache.lock().clear();
        self.stats.reset();
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Get current cache size
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fraction of capacity in use
    pub fn utilization(&self) -> f64 {
        self.cache.lock().utilization()
    }

    /// Snapshot of keys from most to least recently used
    pub fn keys(&self) -> Vec<K> {
        self.cache.lock().keys().cloned().collect()
    }
}
