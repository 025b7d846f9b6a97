//! # lrucache
//!
//! Fixed-capacity in-memory key-value cache with least-recently-used eviction.
//!
//! ## Architecture
//! - **HashMap**: AHash index from key to arena slot (O(1))
//! - **LRU List**: Arena-backed doubly-linked list, front = most recently used (O(1))
//! - **SharedLruCache**: Optional `parking_lot` lock around the core plus hit/miss stats
//!
//! The core [`LruCache`] has no internal synchronization. Callers that need
//! concurrent access wrap it in a lock, or use [`SharedLruCache`].
//!
//! ```
//! use lrucache::LruCache;
//!
//! let mut cache = LruCache::new(2)?;
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.get("a")?;
//! cache.put("c", 3); // evicts "b"
//!
//! assert_eq!(cache.try_get("b"), None);
//! assert_eq!(cache.utilization(), 1.0);
//! # Ok::<(), lrucache::CacheError>(())
//! ```

#![warn(missing_docs)]

mod error;
mod lru;
mod shared;
mod stats;

pub use error::{CacheError, Result};
pub use lru::{Iter, LruCache};
pub use shared::SharedLruCache;
pub use stats::{CacheStats, StatsSnapshot};
