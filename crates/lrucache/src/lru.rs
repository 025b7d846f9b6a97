//! LRU (Least Recently Used) cache implementation
//!
//! Entries live in an arena-backed doubly-linked list addressed by slot index,
//! and the key index maps each key to its slot. Front of the list is the most
//! recently used entry, back is the next eviction victim.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::error::{CacheError, Result};

/// Most slots reserved up front; larger caches grow on demand.
const PREALLOC_LIMIT: usize = 4096;

/// Node in the LRU doubly-linked list
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// LRU cache with fixed capacity
pub struct LruCache<K, V> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Option<Node<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache with the given capacity
    ///
    /// # Errors
    /// * `CacheError::InvalidArgument` - `capacity` is zero
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidArgument(
                "capacity must be greater than 0".to_string(),
            ));
        }

        debug!(capacity, "created lru cache");

        let reserve = capacity.min(PREALLOC_LIMIT);
        Ok(Self {
            map: HashMap::with_capacity_and_hasher(reserve, RandomState::new()),
            nodes: Vec::with_capacity(reserve),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
        })
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the current size of the cache
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Fraction of capacity in use, in `[0.0, 1.0]`
    pub fn utilization(&self) -> f64 {
        self.len() as f64 / self.capacity as f64
    }

    /// Insert a key-value pair into the cache
    ///
    /// An existing key has its value overwritten and becomes most recently
    /// used. A new key arriving at a full cache evicts the least recently
    /// used entry first.
    pub fn put(&mut self, key: K, value: V) {
        let _ = self.push(key, value);
    }

    /// Same as [`LruCache::put`], returning the evicted entry if there was one
    pub fn push(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(node) = &mut self.nodes[idx] {
                node.value = value;
            }
            self.move_to_front(idx);
            return None;
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let idx = self.alloc_node();
        self.nodes[idx] = Some(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.attach_front(idx);
        self.map.insert(key, idx);

        evicted
    }

    /// Get a value, marking it most recently used
    ///
    /// # Errors
    /// * `CacheError::KeyNotFound` - `key` is not cached
    pub fn get<Q>(&mut self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        self.try_get(key)
            .ok_or_else(|| CacheError::KeyNotFound(format!("{:?}", key)))
    }

    /// Get a value if present, marking it most recently used
    pub fn try_get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Get a value without touching recency
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Check for a key without touching recency
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Remove a key from the cache, returning whether it was present
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.pop(key).is_some()
    }

    /// Remove a key from the cache, returning its value
    pub fn pop<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.map.remove(key)?;
        self.detach(idx).map(|node| node.value)
    }

    /// Clear the cache; capacity is unchanged
    pub fn clear(&mut self) {
        debug!(entries = self.map.len(), "clearing lru cache");
        self.map.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterate entries from most to least recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            next: self.head,
            remaining: self.map.len(),
        }
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }

        self.unlink(idx);
        self.attach_front(idx);
    }

    fn attach_front(&mut self, idx: usize) {
        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &mut self.nodes[idx] {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    /// Unlink a slot and hand it back to the free list. Caller owns the map.
    fn detach(&mut self, idx: usize) -> Option<Node<K, V>> {
        self.unlink(idx);
        let node = self.nodes[idx].take();
        if node.is_some() {
            self.free_list.push(idx);
        }
        node
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let tail_idx = self.tail?;
        let node = self.detach(tail_idx)?;
        self.map.remove(&node.key);
        trace!(capacity = self.capacity, slot = tail_idx, "evicted least recently used entry");
        Some((node.key, node.value))
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }
}

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("entries", &DebugEntries(self))
            .finish()
    }
}

struct DebugEntries<'a, K, V>(&'a LruCache<K, V>);

impl<K, V> fmt::Debug for DebugEntries<'_, K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

/// Iterator over cache entries, most recently used first
pub struct Iter<'a, K, V> {
    nodes: &'a [Option<Node<K, V>>],
    next: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes: &'a [Option<Node<K, V>>] = self.nodes;
        let node = nodes[self.next?].as_ref()?;
        self.next = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walk the list both ways and cross-check it against the key index.
    fn assert_consistent<K, V>(cache: &LruCache<K, V>)
    where
        K: Hash + Eq + Clone + fmt::Debug,
    {
        let mut forward = Vec::new();
        let mut cursor = cache.head;
        let mut prev = None;
        while let Some(idx) = cursor {
            let node = cache.nodes[idx].as_ref().unwrap();
            assert_eq!(node.prev, prev, "broken back link at slot {}", idx);
            assert_eq!(cache.map.get(&node.key), Some(&idx), "stale handle for {:?}", node.key);
            forward.push(idx);
            prev = Some(idx);
            cursor = node.next;
        }
        assert_eq!(cache.tail, prev);
        assert_eq!(forward.len(), cache.map.len());
        assert!(cache.map.len() <= cache.capacity);
        for idx in &cache.free_list {
            assert!(cache.nodes[*idx].is_none());
        }
    }

    fn keys_of<V>(cache: &LruCache<&'static str, V>) -> Vec<&'static str> {
        cache.keys().copied().collect()
    }

    #[test]
    fn test_lru_new_rejects_zero_capacity() {
        let err = LruCache::<String, i32>::new(0).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_lru_new_is_empty() {
        for capacity in [1, 2, 10, 10_000] {
            let cache = LruCache::<String, String>::new(capacity).unwrap();
            assert_eq!(cache.capacity(), capacity);
            assert_eq!(cache.len(), 0);
            assert!(cache.is_empty());
            assert_eq!(cache.utilization(), 0.0);
        }
    }

    #[test]
    fn test_lru_new_huge_capacity() {
        for capacity in [usize::MAX, 1usize << 60] {
            let mut cache = LruCache::<u64, u64>::new(capacity).unwrap();
            assert_eq!(cache.capacity(), capacity);
            assert_eq!(cache.utilization(), 0.0);

            for i in 0..(PREALLOC_LIMIT as u64 + 10) {
                cache.put(i, i);
            }
            assert_eq!(cache.len(), PREALLOC_LIMIT + 10);
            assert_eq!(cache.get(&0), Ok(&0));
        }
    }

    #[test]
    fn test_lru_basic() {
        let mut cache = LruCache::new(2).unwrap();

        cache.put(1, "a");
        cache.put(2, "b");

        assert_eq!(cache.get(&1), Ok(&"a"));
        assert_eq!(cache.try_get(&2), Some(&"b"));
        assert_eq!(cache.len(), 2);
        assert_consistent(&cache);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = LruCache::new(2).unwrap();

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3); // Should evict a

        assert_eq!(cache.get("b"), Ok(&2));
        assert_eq!(cache.get("c"), Ok(&3));
        assert!(cache.get("a").unwrap_err().is_not_found());
        assert_eq!(cache.try_get("a"), None);
        assert_consistent(&cache);
    }

    #[test]
    fn test_lru_read_refreshes_recency() {
        let mut cache = LruCache::new(2).unwrap();

        cache.put("a", 1);
        cache.put("b", 2);
        cache.get("a").unwrap(); // Move a to front
        cache.put("c", 3); // Should evict b

        assert_eq!(cache.get("a"), Ok(&1));
        assert_eq!(cache.get("c"), Ok(&3));
        assert!(cache.get("b").is_err());
        assert_consistent(&cache);
    }

    #[test]
    fn test_lru_try_get_refreshes_recency() {
        let mut cache = LruCache::new(3).unwrap();

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        assert_eq!(cache.try_get("a"), Some(&1));

        assert_eq!(cache.push("d", 4), Some(("b", 2)));
        assert_eq!(keys_of(&cache), vec!["d", "a", "c"]);
    }

    #[test]
    fn test_lru_eviction_follows_access_order() {
        let mut cache = LruCache::new(3).unwrap();

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        cache.get("b").unwrap();
        cache.get("a").unwrap();
        // recency now: a, b, c

        let mut evicted = Vec::new();
        for (key, value) in [("x", 10), ("y", 11), ("z", 12)] {
            evicted.push(cache.push(key, value).map(|(k, _)| k));
            assert_consistent(&cache);
        }

        assert_eq!(evicted, vec![Some("c"), Some("b"), Some("a")]);
        assert_eq!(keys_of(&cache), vec!["z", "y", "x"]);
    }

    #[test]
    fn test_lru_capacity_plus_one_evicts_once() {
        let capacity = 10;
        let mut cache = LruCache::new(capacity).unwrap();

        let mut evictions = 0;
        for i in 0..=capacity {
            if cache.push(i, i * 100).is_some() {
                evictions += 1;
            }
        }

        assert_eq!(evictions, 1);
        assert_eq!(cache.len(), capacity);
        assert!(cache.get(&0).is_err());
        for i in 1..=capacity {
            assert_eq!(cache.get(&i), Ok(&(i * 100)));
        }
        assert_consistent(&cache);
    }

    #[test]
    fn test_lru_overwrite() {
        let mut cache = LruCache::new(2).unwrap();

        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.push("a", 10), None); // Overwrite, no eviction

        assert_eq!(cache.len(), 2);
        assert_eq!(keys_of(&cache), vec!["a", "b"]);
        assert_eq!(cache.get("a"), Ok(&10));
        assert_eq!(cache.get("b"), Ok(&2));
        assert_consistent(&cache);
    }

    #[test]
    fn test_lru_stores_nil_values() {
        let mut cache: LruCache<String, Option<i32>> = LruCache::new(2).unwrap();

        cache.put("nil".to_string(), None);

        assert_eq!(cache.get("nil"), Ok(&None));
        assert_eq!(cache.try_get("nil"), Some(&None));
        assert_eq!(cache.try_get("other"), None);
    }

    #[test]
    fn test_lru_remove() {
        let mut cache = LruCache::new(3).unwrap();

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        assert!(cache.remove("b"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_err());
        assert_eq!(cache.try_get("b"), None);
        assert_eq!(keys_of(&cache), vec!["c", "a"]);
        assert_consistent(&cache);
    }

    #[test]
    fn test_lru_remove_missing() {
        let mut cache: LruCache<&str, i32> = LruCache::new(3).unwrap();
        assert!(!cache.remove("a"));

        cache.put("a", 1);
        cache.put("b", 2);
        assert!(!cache.remove("z"));
        assert_eq!(keys_of(&cache), vec!["b", "a"]);
        assert_consistent(&cache);
    }

    #[test]
    fn test_lru_remove_head_and_tail() {
        let mut cache = LruCache::new(3).unwrap();

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        assert_eq!(cache.pop("c"), Some(3));
        assert_consistent(&cache);
        assert_eq!(cache.pop("a"), Some(1));
        assert_consistent(&cache);
        assert_eq!(keys_of(&cache), vec!["b"]);

        // Freed slots are reused without disturbing the survivor
        cache.put("d", 4);
        cache.put("e", 5);
        assert_eq!(cache.nodes.len(), 3);
        assert_eq!(keys_of(&cache), vec!["e", "d", "b"]);
        assert_consistent(&cache);
    }

    #[test]
    fn test_lru_capacity_one() {
        let mut cache = LruCache::new(1).unwrap();

        cache.put("a", 1);
        assert_eq!(cache.utilization(), 1.0);
        assert_eq!(cache.push("b", 2), Some(("a", 1)));
        assert_eq!(cache.get("b"), Ok(&2));
        assert!(cache.get("a").is_err());
        assert_consistent(&cache);
    }

    #[test]
    fn test_lru_clear() {
        let mut cache = LruCache::new(3).unwrap();

        cache.put("a", 1);
        cache.put("b", 2);
        cache.clear();

        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.utilization(), 0.0);
        assert_eq!(cache.capacity(), 3);
        assert!(cache.get("a").is_err());

        cache.put("c", 3);
        assert_eq!(cache.get("c"), Ok(&3));
        assert_consistent(&cache);
    }

    #[test]
    fn test_lru_utilization_is_fractional() {
        let mut cache = LruCache::new(4).unwrap();

        cache.put(1, ());
        assert_eq!(cache.utilization(), 0.25);
        cache.put(2, ());
        cache.put(3, ());
        assert_eq!(cache.utilization(), 0.75);
    }

    #[test]
    fn test_lru_peek_and_contains_do_not_touch() {
        let mut cache = LruCache::new(2).unwrap();

        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.peek("a"), Some(&1));
        assert!(cache.contains("a"));

        assert_eq!(cache.push("c", 3), Some(("a", 1)));
    }

    #[test]
    fn test_lru_iter_order_and_debug() {
        let mut cache = LruCache::new(3).unwrap();

        cache.put("a", 1);
        cache.put("b", 2);
        cache.get("a").unwrap();

        let entries: Vec<_> = (&cache).into_iter().collect();
        assert_eq!(entries, vec![(&"a", &1), (&"b", &2)]);
        assert_eq!(cache.iter().len(), 2);
        assert_eq!(
            format!("{:?}", cache),
            r#"LruCache { capacity: 3, entries: {"a": 1, "b": 2} }"#
        );
    }

    #[test]
    fn test_lru_churn_keeps_structures_in_sync() {
        let mut cache = LruCache::new(8).unwrap();

        for i in 0u32..500 {
            let key = (i * 7) % 13;
            match i % 5 {
                0 | 1 => cache.put(key, i),
                2 => {
                    let _ = cache.try_get(&key);
                }
                3 => {
                    cache.remove(&key);
                }
                _ => {
                    let _ = cache.get(&key);
                }
            }
            assert_consistent(&cache);
        }
    }
}
