//! # Weak-Reference Cache
//!
//! A sharded, bounded cache whose keys and/or values may be held weakly.
//! Without a tracing collector, "weakly held" means the cache stores a
//! [`Weak`](std::sync::Weak) handle; once every `Arc` outside the cache is
//! dropped the handle stops upgrading, the entry reads as absent, and a
//! maintenance pass reaps it.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                          WeakCache<K, V>                             │
//!   │                                                                      │
//!   │   ShardSelector ── hash(key) ──► shard = hash >> (64 - log2(n))      │
//!   │                                                                      │
//!   │   ┌────────────────────────────┐     ┌────────────────────────────┐  │
//!   │   │ Mutex<Shard 0>             │ ... │ Mutex<Shard n-1>           │  │
//!   │   │                            │     │                            │  │
//!   │   │  map: hash → [Slot]        │     │                            │  │
//!   │   │  order: VecDeque<(h, seq)> │     │                            │  │
//!   │   │  len / stale / capacity    │     │                            │  │
//!   │   │  sweep cursor              │     │                            │  │
//!   │   └────────────────────────────┘     └────────────────────────────┘  │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Slot { hash, key: Arc|Weak<K>, value: Arc|Weak<V>, seq }
//! ```
//!
//! ## Shard bookkeeping
//!
//! - Every slot has exactly one record in `order`, matched by `(hash, seq)`.
//! - Removing or reaping a slot leaves its record behind as *stale*;
//!   `order.len() == len + stale` at all times.
//! - Eviction pops records from the front (FIFO by first insertion). Stale
//!   records are skipped, collected slots are reaped, live slots are evicted.
//! - Every [`MAINTENANCE_INTERVAL`] writes the writer sweeps
//!   [`SWEEP_BATCH`] records from a cursor that walks the queue, reaping
//!   collected slots. When stale records outnumber live ones the queue is
//!   compacted.
//! - [`clean_up`](WeakCache::clean_up) reaps every shard completely.
//!
//! ## Capacity
//!
//! The maximum size is split across shards (remainder to the low shards), so
//! the global bound holds as long as each shard respects its own. A skewed
//! hash distribution can therefore evict before the cache is globally full.
//!
//! ## Thread Safety
//!
//! Each shard is guarded by a `parking_lot::Mutex`. Reads lock too: a `get`
//! may have to skip collected slots. Mapping functions passed to
//! [`get_with`](WeakCache::get_with) run under the shard lock and must not
//! call back into the same cache.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::builder::WeakCacheBuilder;
use crate::cache::entry::{RefHandle, Slot, Strength};
use crate::ds::ShardSelector;
use crate::error::InvariantError;
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::WeakCacheMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::WeakCacheMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{MetricsSnapshotProvider, WeakCacheMetricsRecorder};
use crate::traits::{BasicCache, ComputeCache, ConcurrentCache};

/// Shard count used when the builder is not told otherwise.
pub const DEFAULT_SHARDS: usize = 16;

/// Writes to a shard between two amortized maintenance passes.
pub const MAINTENANCE_INTERVAL: u32 = 64;

/// Order records examined by one amortized maintenance pass.
pub const SWEEP_BATCH: usize = 64;

/// Stale records tolerated beyond the live count before compaction.
const COMPACT_SLACK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct OrderRecord {
    hash: u64,
    seq: u64,
}

struct Shard<K, V> {
    map: FxHashMap<u64, Vec<Slot<K, V>>>,
    order: VecDeque<OrderRecord>,
    len: usize,
    stale: usize,
    capacity: usize,
    next_seq: u64,
    sweep: usize,
    writes: u32,
    #[cfg(feature = "metrics")]
    metrics: WeakCacheMetrics,
}

impl<K, V> Shard<K, V>
where
    K: Eq,
{
    fn new(capacity: usize, initial_capacity: usize) -> Self {
        Self {
            map: FxHashMap::with_capacity_and_hasher(initial_capacity, Default::default()),
            order: VecDeque::with_capacity(initial_capacity),
            len: 0,
            stale: 0,
            capacity,
            next_seq: 0,
            sweep: 0,
            writes: 0,
            #[cfg(feature = "metrics")]
            metrics: WeakCacheMetrics::new(),
        }
    }

    fn find(&self, hash: u64, key: &K) -> Option<&Slot<K, V>> {
        self.map
            .get(&hash)
            .and_then(|bucket| bucket.iter().find(|slot| slot.key.matches(key)))
    }

    fn get(&mut self, hash: u64, key: &K) -> Option<Arc<V>> {
        let found = self.find(hash, key).map(|slot| slot.value.upgrade());
        match found {
            Some(Some(value)) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_get_hit();
                Some(value)
            },
            Some(None) => {
                #[cfg(feature = "metrics")]
                {
                    self.metrics.record_collected_skip();
                    self.metrics.record_get_miss();
                }
                None
            },
            None => {
                #[cfg(feature = "metrics")]
                {
                    if self.has_collected_key(hash) {
                        self.metrics.record_collected_skip();
                    }
                    self.metrics.record_get_miss();
                }
                None
            },
        }
    }

    /// Whether the bucket for `hash` holds a slot whose key was dropped.
    #[cfg(feature = "metrics")]
    fn has_collected_key(&self, hash: u64) -> bool {
        self.map
            .get(&hash)
            .is_some_and(|bucket| bucket.iter().any(|slot| !slot.key.is_alive()))
    }

    fn insert(
        &mut self,
        hash: u64,
        key: Arc<K>,
        value: Arc<V>,
        key_strength: Strength,
        value_strength: Strength,
    ) {
        let bucket = self.map.entry(hash).or_default();
        if let Some(slot) = bucket.iter_mut().find(|slot| slot.key.matches(&key)) {
            #[cfg(feature = "metrics")]
            {
                if slot.value.is_alive() {
                    self.metrics.record_insert_update();
                } else {
                    self.metrics.record_collected_skip();
                    self.metrics.record_insert_new();
                }
            }
            slot.key = RefHandle::new(key, key_strength);
            slot.value = RefHandle::new(value, value_strength);
        } else {
            #[cfg(feature = "metrics")]
            if bucket.iter().any(|slot| !slot.key.is_alive()) {
                self.metrics.record_collected_skip();
            }
            let seq = self.next_seq;
            self.next_seq += 1;
            bucket.push(Slot {
                hash,
                key: RefHandle::new(key, key_strength),
                value: RefHandle::new(value, value_strength),
                seq,
            });
            self.order.push_back(OrderRecord { hash, seq });
            self.len += 1;
            #[cfg(feature = "metrics")]
            self.metrics.record_insert_new();
        }

        self.evict_overflow();
        self.after_write();
    }

    fn get_with<F>(
        &mut self,
        hash: u64,
        key: Arc<K>,
        mapping: F,
        key_strength: Strength,
        value_strength: Strength,
    ) -> Arc<V>
    where
        F: FnOnce(&K) -> Arc<V>,
    {
        #[cfg(feature = "metrics")]
        self.metrics.record_compute_call();

        if let Some(value) = self.find(hash, &key).and_then(|slot| slot.value.upgrade()) {
            return value;
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_compute_miss();

        let value = mapping(&key);
        self.insert(hash, key, Arc::clone(&value), key_strength, value_strength);
        value
    }

    fn remove(&mut self, hash: u64, key: &K) -> Option<Arc<V>> {
        #[cfg(feature = "metrics")]
        self.metrics.record_remove_call();

        let seq = self.find(hash, key)?.seq;
        let slot = self.take_slot(hash, seq)?;
        self.stale += 1;
        self.after_write();

        let value = slot.value.upgrade();
        #[cfg(feature = "metrics")]
        {
            if value.is_some() {
                self.metrics.record_remove_found();
            } else {
                self.metrics.record_collected_entry();
            }
        }
        value
    }

    /// Detaches the slot identified by `(hash, seq)`. The caller accounts for
    /// the slot's order record.
    fn take_slot(&mut self, hash: u64, seq: u64) -> Option<Slot<K, V>> {
        let bucket = self.map.get_mut(&hash)?;
        let index = bucket.iter().position(|slot| slot.seq == seq)?;
        let slot = bucket.swap_remove(index);
        if bucket.is_empty() {
            self.map.remove(&hash);
        }
        self.len -= 1;
        Some(slot)
    }

    fn evict_overflow(&mut self) {
        while self.len > self.capacity {
            let Some(record) = self.order.pop_front() else {
                break;
            };
            self.sweep = self.sweep.saturating_sub(1);

            match self.take_slot(record.hash, record.seq) {
                None => {
                    self.stale -= 1;
                    #[cfg(feature = "metrics")]
                    self.metrics.record_stale_skip();
                },
                Some(slot) => {
                    #[cfg(feature = "metrics")]
                    {
                        if slot.is_live() {
                            self.metrics.record_evicted_entry();
                        } else {
                            self.metrics.record_collected_entry();
                        }
                    }
                    drop(slot);
                },
            }
        }
    }

    fn after_write(&mut self) {
        self.writes += 1;
        if self.writes >= MAINTENANCE_INTERVAL {
            self.writes = 0;
            self.run_maintenance(SWEEP_BATCH);
        }
    }

    fn run_maintenance(&mut self, budget: usize) -> usize {
        #[cfg(feature = "metrics")]
        self.metrics.record_maintenance_run();

        let reaped = self.sweep(budget);
        if self.stale > self.len + COMPACT_SLACK {
            self.compact_order();
        }
        if reaped > 0 {
            trace!("maintenance reaped {} collected entries", reaped);
        }
        reaped
    }

    /// Walks up to `budget` order records from the sweep cursor and reaps
    /// collected slots.
    fn sweep(&mut self, budget: usize) -> usize {
        let mut reaped = 0;
        for _ in 0..budget.min(self.order.len()) {
            if self.sweep >= self.order.len() {
                self.sweep = 0;
            }
            let record = self.order[self.sweep];
            self.sweep += 1;

            let collected = self
                .map
                .get(&record.hash)
                .and_then(|bucket| bucket.iter().find(|slot| slot.seq == record.seq))
                .is_some_and(|slot| !slot.is_live());
            if collected && self.take_slot(record.hash, record.seq).is_some() {
                self.stale += 1;
                reaped += 1;
                #[cfg(feature = "metrics")]
                self.metrics.record_collected_entry();
            }
        }
        reaped
    }

    fn compact_order(&mut self) {
        let map = &self.map;
        self.order.retain(|record| {
            map.get(&record.hash)
                .is_some_and(|bucket| bucket.iter().any(|slot| slot.seq == record.seq))
        });
        self.stale = 0;
        self.sweep = 0;
        #[cfg(feature = "metrics")]
        self.metrics.record_order_compaction();
    }

    fn reap_all(&mut self) -> usize {
        let before = self.len;
        self.map.retain(|_, bucket| {
            bucket.retain(|slot| slot.is_live());
            !bucket.is_empty()
        });
        self.len = self.map.values().map(Vec::len).sum();
        let reaped = before - self.len;

        #[cfg(feature = "metrics")]
        {
            self.metrics.record_maintenance_run();
            self.metrics.collected_entries += reaped as u64;
        }
        self.compact_order();
        self.writes = 0;
        reaped
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
        self.len = 0;
        self.stale = 0;
        self.sweep = 0;
        self.writes = 0;
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();
    }

    fn live_len(&self) -> usize {
        self.map
            .values()
            .flat_map(|bucket| bucket.iter())
            .filter(|slot| slot.is_live())
            .count()
    }

    fn check_invariants(&self, index: usize) -> Result<(), InvariantError> {
        let slots: usize = self.map.values().map(Vec::len).sum();
        if slots != self.len {
            return Err(InvariantError::new(format!(
                "shard {index}: {slots} slots but len is {}",
                self.len
            )));
        }
        if self.order.len() != self.len + self.stale {
            return Err(InvariantError::new(format!(
                "shard {index}: order has {} records, expected len {} + stale {}",
                self.order.len(),
                self.len,
                self.stale
            )));
        }
        if self.len > self.capacity {
            return Err(InvariantError::new(format!(
                "shard {index}: len {} exceeds capacity {}",
                self.len, self.capacity
            )));
        }
        if self.sweep > self.order.len() {
            return Err(InvariantError::new(format!(
                "shard {index}: sweep cursor {} past order length {}",
                self.sweep,
                self.order.len()
            )));
        }

        let records: FxHashSet<OrderRecord> = self.order.iter().copied().collect();
        if records.len() != self.order.len() {
            return Err(InvariantError::new(format!(
                "shard {index}: duplicate order records"
            )));
        }
        for (&hash, bucket) in &self.map {
            if bucket.is_empty() {
                return Err(InvariantError::new(format!(
                    "shard {index}: empty bucket for hash {hash:#x}"
                )));
            }
            for slot in bucket {
                if slot.hash != hash {
                    return Err(InvariantError::new(format!(
                        "shard {index}: slot {} filed under the wrong hash",
                        slot.seq
                    )));
                }
                if !records.contains(&OrderRecord {
                    hash,
                    seq: slot.seq,
                }) {
                    return Err(InvariantError::new(format!(
                        "shard {index}: slot {} has no order record",
                        slot.seq
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Bounded concurrent cache with optional weak keys and weak values.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use weakkit::cache::WeakCache;
///
/// // Weak keys and weak values, at most 1 000 entries
/// let cache: WeakCache<u64, String> = WeakCache::new(1_000);
///
/// let key = Arc::new(1);
/// let value = Arc::new("one".to_string());
/// cache.put(Arc::clone(&key), Arc::clone(&value));
/// assert_eq!(cache.get(&1).as_deref().map(String::as_str), Some("one"));
///
/// // Dropping the last strong value handle makes the entry unreachable
/// drop(value);
/// assert!(cache.get(&1).is_none());
/// assert_eq!(cache.clean_up(), 1);
/// assert!(cache.is_empty());
/// ```
pub struct WeakCache<K, V> {
    shards: Box<[Mutex<Shard<K, V>>]>,
    selector: ShardSelector,
    key_strength: Strength,
    value_strength: Strength,
    maximum_size: Option<usize>,
}

impl<K, V> WeakCache<K, V>
where
    K: Eq + Hash,
{
    /// Creates a cache with weak keys, weak values, and the given maximum
    /// size, pre-sized for `maximum_size` entries.
    ///
    /// Use [`WeakCacheBuilder`] for other configurations.
    pub fn new(maximum_size: usize) -> Self {
        WeakCacheBuilder::new()
            .initial_capacity(maximum_size)
            .maximum_size(maximum_size)
            .weak_keys()
            .weak_values()
            .build()
    }

    /// Assembles a cache from validated builder parameters.
    pub(crate) fn from_parts(
        maximum_size: Option<usize>,
        initial_capacity: usize,
        selector: ShardSelector,
        key_strength: Strength,
        value_strength: Strength,
    ) -> Self {
        let count = selector.shard_count();
        let per_shard_initial = initial_capacity.div_ceil(count);
        let shards = (0..count)
            .map(|index| {
                let capacity = match maximum_size {
                    Some(max) => max / count + usize::from(index < max % count),
                    None => usize::MAX,
                };
                Mutex::new(Shard::new(capacity, per_shard_initial.min(capacity)))
            })
            .collect();

        debug!(
            "weak cache created: shards={} maximum_size={:?} keys={:?} values={:?}",
            count, maximum_size, key_strength, value_strength
        );

        Self {
            shards,
            selector,
            key_strength,
            value_strength,
            maximum_size,
        }
    }

    #[inline]
    fn shard(&self, hash: u64) -> &Mutex<Shard<K, V>> {
        &self.shards[self.selector.shard_for_hash(hash)]
    }

    /// Returns the live value for `key`, or `None` if absent or collected.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let hash = self.selector.hash_key(key);
        self.shard(hash).lock().get(hash, key)
    }

    /// Returns `true` if `key` maps to a live value.
    pub fn contains(&self, key: &K) -> bool {
        let hash = self.selector.hash_key(key);
        self.shard(hash)
            .lock()
            .find(hash, key)
            .is_some_and(|slot| slot.value.is_alive())
    }

    /// Inserts or replaces the mapping for `key`.
    ///
    /// Replacing swaps in both new handles but keeps the entry's original
    /// eviction position. May evict or reap entries of the same shard.
    pub fn put(&self, key: Arc<K>, value: Arc<V>) {
        let hash = self.selector.hash_key(&*key);
        let mut shard = self.shard(hash).lock();
        #[cfg(feature = "metrics")]
        shard.metrics.record_put_call();
        shard.insert(hash, key, value, self.key_strength, self.value_strength);
    }

    /// Returns the live value for `key`, computing it with `mapping` if absent.
    ///
    /// `mapping` runs under the shard lock, so concurrent callers for the same
    /// key observe a single computation. It must not call back into this cache.
    pub fn get_with<F>(&self, key: Arc<K>, mapping: F) -> Arc<V>
    where
        F: FnOnce(&K) -> Arc<V>,
    {
        let hash = self.selector.hash_key(&*key);
        self.shard(hash).lock().get_with(
            hash,
            key,
            mapping,
            self.key_strength,
            self.value_strength,
        )
    }

    /// Removes the mapping for `key`, returning its value if it was live.
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        let hash = self.selector.hash_key(key);
        self.shard(hash).lock().remove(hash, key)
    }

    /// Removes every mapping.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.lock().clear();
        }
        debug!("weak cache cleared ({} shards)", self.shards.len());
    }

    /// Reaps every collected entry in every shard and compacts the eviction
    /// queues. Returns the number of entries reaped.
    pub fn clean_up(&self) -> usize {
        let reaped: usize = self.shards.iter().map(|shard| shard.lock().reap_all()).sum();
        debug!("clean_up reaped {} collected entries", reaped);
        reaped
    }

    /// Entries currently stored, including collected entries not yet reaped.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len).sum()
    }

    /// Returns `true` if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries whose key and value are both still reachable. O(n).
    pub fn live_len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().live_len()).sum()
    }

    /// Returns the configured maximum size, or `None` if unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.maximum_size
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Returns how keys are held.
    pub fn key_strength(&self) -> Strength {
        self.key_strength
    }

    /// Returns how values are held.
    pub fn value_strength(&self) -> Strength {
        self.value_strength
    }

    /// Returns `true` if keys are held weakly.
    pub fn weak_keys(&self) -> bool {
        self.key_strength == Strength::Weak
    }

    /// Returns `true` if values are held weakly.
    pub fn weak_values(&self) -> bool {
        self.value_strength == Strength::Weak
    }

    /// Verifies the bookkeeping of every shard.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        for (index, shard) in self.shards.iter().enumerate() {
            shard.lock().check_invariants(index)?;
        }
        Ok(())
    }
}

#[cfg(feature = "metrics")]
impl<K, V> WeakCache<K, V>
where
    K: Eq + Hash,
{
    /// Sums the per-shard counters into a snapshot.
    pub fn metrics_snapshot(&self) -> WeakCacheMetricsSnapshot {
        let mut snapshot = WeakCacheMetricsSnapshot::default();
        for shard in self.shards.iter() {
            let shard = shard.lock();
            shard.metrics.accumulate(&mut snapshot);
            snapshot.cache_len += shard.len;
            snapshot.order_len += shard.order.len();
        }
        snapshot.capacity = self.maximum_size.unwrap_or(usize::MAX);
        snapshot
    }
}

#[cfg(feature = "metrics")]
impl<K, V> MetricsSnapshotProvider<WeakCacheMetricsSnapshot> for WeakCache<K, V>
where
    K: Eq + Hash,
{
    fn snapshot(&self) -> WeakCacheMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<K, V> BasicCache<K, V> for WeakCache<K, V>
where
    K: Eq + Hash,
{
    fn get(&self, key: &K) -> Option<Arc<V>> {
        WeakCache::get(self, key)
    }

    fn put(&self, key: Arc<K>, value: Arc<V>) {
        WeakCache::put(self, key, value)
    }

    fn remove(&self, key: &K) {
        let _ = WeakCache::remove(self, key);
    }

    fn clear(&self) {
        WeakCache::clear(self)
    }

    fn clean_up(&self) {
        let _ = WeakCache::clean_up(self);
    }
}

impl<K, V> ComputeCache<K, V> for WeakCache<K, V>
where
    K: Eq + Hash,
{
    fn get_with<F>(&self, key: Arc<K>, mapping: F) -> Arc<V>
    where
        F: FnOnce(&K) -> Arc<V>,
    {
        WeakCache::get_with(self, key, mapping)
    }
}

impl<K, V> ConcurrentCache for WeakCache<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
}

impl<K, V> fmt::Debug for WeakCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakCache")
            .field("len", &self.len())
            .field("maximum_size", &self.maximum_size)
            .field("shards", &self.shards.len())
            .field("keys", &self.key_strength)
            .field("values", &self.value_strength)
            .finish_non_exhaustive()
    }
}
