//! # Cache Contract
//!
//! The harness drives every cache through the small contract defined here, so
//! scenarios never depend on the concrete engine behind it.
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────────────────────┐
//!   │              BasicCache<K, V>               │
//!   │                                             │
//!   │  get(&, &K) → Option<Arc<V>>                │
//!   │  put(&, Arc<K>, Arc<V>)                     │
//!   │  remove(&, &K)                              │
//!   │  clear(&)                                   │
//!   │  clean_up(&)                                │
//!   └──────────────────────┬──────────────────────┘
//!                          │
//!                          ▼
//!   ┌─────────────────────────────────────────────┐
//!   │             ComputeCache<K, V>              │
//!   │                                             │
//!   │  get_with(&, Arc<K>, FnOnce(&K) → Arc<V>)   │
//!   └─────────────────────────────────────────────┘
//!
//!   ConcurrentCache: marker, Send + Sync
//! ```
//!
//! ## Ownership
//!
//! Keys and values cross the contract as `Arc`s. A cache configured with weak
//! keys or weak values keeps only a `Weak` handle, so the caller (or a
//! [`StrongRefTracker`](crate::harness::tracker::StrongRefTracker)) decides how
//! long an entry stays reachable. Once the last strong handle is dropped the
//! entry reads as absent and is reaped by the next maintenance pass.
//!
//! ## Naming
//!
//! | Contract     | Caffeine-style alias   |
//! |--------------|------------------------|
//! | `get`        | `get_if_present`       |
//! | `remove`     | `invalidate`           |
//! | `clear`      | `invalidate_all`       |
//! | `clean_up`   | `clean_up`             |
//!
//! The aliases are provided as default methods.

use std::sync::Arc;

/// Operations every cache driven by the harness supports.
///
/// All methods take `&self`: implementations synchronize internally.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use weakkit::builder::WeakCacheBuilder;
/// use weakkit::traits::BasicCache;
///
/// fn populate<C: BasicCache<u32, bool>>(cache: &C, keys: &[Arc<u32>], value: &Arc<bool>) {
///     for key in keys {
///         cache.put(Arc::clone(key), Arc::clone(value));
///     }
/// }
///
/// let cache = WeakCacheBuilder::new().maximum_size(16).build::<u32, bool>();
/// let keys: Vec<_> = (0..4).map(Arc::new).collect();
/// let yes = Arc::new(true);
/// populate(&cache, &keys, &yes);
/// assert_eq!(cache.get(&2).as_deref(), Some(&true));
/// ```
pub trait BasicCache<K, V> {
    /// Returns the current mapping for `key`, or `None` if absent or collected.
    fn get(&self, key: &K) -> Option<Arc<V>>;

    /// Inserts or replaces the mapping for `key`.
    fn put(&self, key: Arc<K>, value: Arc<V>);

    /// Removes the mapping for `key` if present.
    fn remove(&self, key: &K);

    /// Removes all mappings.
    fn clear(&self);

    /// Runs deferred maintenance (reaping, eviction) synchronously.
    fn clean_up(&self);

    /// Alias for [`get`](Self::get).
    fn get_if_present(&self, key: &K) -> Option<Arc<V>> {
        self.get(key)
    }

    /// Alias for [`remove`](Self::remove).
    fn invalidate(&self, key: &K) {
        self.remove(key)
    }

    /// Alias for [`clear`](Self::clear).
    fn invalidate_all(&self) {
        self.clear()
    }
}

/// Caches with an atomic compute-if-absent.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use weakkit::builder::WeakCacheBuilder;
/// use weakkit::traits::ComputeCache;
///
/// let cache = WeakCacheBuilder::new().build::<u32, String>();
/// let key = Arc::new(7);
/// let value = cache.get_with(Arc::clone(&key), |k| Arc::new(format!("v{k}")));
/// assert_eq!(*value, "v7");
///
/// // Present keys do not recompute
/// let again = cache.get_with(key, |_| unreachable!());
/// assert!(Arc::ptr_eq(&value, &again));
/// ```
pub trait ComputeCache<K, V>: BasicCache<K, V> {
    /// Returns the live value for `key`, computing and inserting it with
    /// `mapping` if absent. The mapping runs at most once per absent key
    /// among concurrent callers.
    fn get_with<F>(&self, key: Arc<K>, mapping: F) -> Arc<V>
    where
        F: FnOnce(&K) -> Arc<V>;
}

/// Marker for caches that may be shared across threads.
pub trait ConcurrentCache: Send + Sync {}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use rustc_hash::FxHashMap;

    use super::*;

    /// Strong-only map used to check the default alias methods.
    #[derive(Default)]
    struct MapCache {
        map: Mutex<FxHashMap<u32, Arc<u32>>>,
    }

    impl BasicCache<u32, u32> for MapCache {
        fn get(&self, key: &u32) -> Option<Arc<u32>> {
            self.map.lock().get(key).cloned()
        }

        fn put(&self, key: Arc<u32>, value: Arc<u32>) {
            self.map.lock().insert(*key, value);
        }

        fn remove(&self, key: &u32) {
            self.map.lock().remove(key);
        }

        fn clear(&self) {
            self.map.lock().clear();
        }

        fn clean_up(&self) {}
    }

    #[test]
    fn aliases_delegate_to_contract() {
        let cache = MapCache::default();
        cache.put(Arc::new(1), Arc::new(10));
        cache.put(Arc::new(2), Arc::new(20));

        assert_eq!(cache.get_if_present(&1).as_deref(), Some(&10));

        cache.invalidate(&1);
        assert!(cache.get(&1).is_none());
        assert!(cache.get(&2).is_some());

        cache.invalidate_all();
        assert!(cache.get(&2).is_none());
    }
}
