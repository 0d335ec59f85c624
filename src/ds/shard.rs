//! Seeded key hashing and hash-to-shard selection.
//!
//! [`WeakCache`](crate::cache::WeakCache) hashes each key exactly once with
//! [`ShardSelector::hash_key`]; the resulting 64-bit hash picks the shard (top
//! bits) and is stored with the entry so that lookups and maintenance never
//! rehash a key, which matters because a weakly held key may no longer be
//! available to hash.
//!
//! ## Architecture
//!
//! ```text
//!   key ──► FxHasher(seed) ──► hash: u64
//!                                 │
//!              ┌──────────────────┴───────────────────┐
//!              ▼                                      ▼
//!     hash >> (64 - log2(shards))             bucket key inside shard
//!              │
//!              ▼
//!   ┌─────────┬─────────┬─────────┬─────────┐
//!   │ Shard 0 │ Shard 1 │ Shard 2 │ Shard 3 │
//!   └─────────┴─────────┴─────────┴─────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use weakkit::ds::ShardSelector;
//!
//! let selector = ShardSelector::new(4, 0);
//! let hash = selector.hash_key(&"user:123");
//! let shard = selector.shard_for_hash(hash);
//! assert!(shard < 4);
//!
//! // Same key always maps to the same shard
//! assert_eq!(selector.shard_for_key(&"user:123"), shard);
//! ```

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

/// Deterministic shard selector using a seeded hash.
///
/// The shard count is rounded up to a power of two so selection is a shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardSelector {
    shards: usize,
    shift: u32,
    seed: u64,
}

impl ShardSelector {
    /// Creates a selector for `shards` shards with the given `seed`.
    ///
    /// The shard count is clamped to at least 1 and rounded up to the next
    /// power of two.
    ///
    /// # Example
    ///
    /// ```
    /// use weakkit::ds::ShardSelector;
    ///
    /// assert_eq!(ShardSelector::new(16, 0).shard_count(), 16);
    /// assert_eq!(ShardSelector::new(0, 0).shard_count(), 1);
    /// assert_eq!(ShardSelector::new(5, 0).shard_count(), 8);
    /// ```
    pub fn new(shards: usize, seed: u64) -> Self {
        let shards = shards.max(1).next_power_of_two();
        Self {
            shards,
            shift: 64 - shards.trailing_zeros(),
            seed,
        }
    }

    /// Returns the number of shards.
    #[inline]
    pub fn shard_count(&self) -> usize {
        self.shards
    }

    /// Hashes `key` with this selector's seed.
    #[inline]
    pub fn hash_key<K: Hash + ?Sized>(&self, key: &K) -> u64 {
        let mut hasher = FxHasher::default();
        self.seed.hash(&mut hasher);
        key.hash(&mut hasher);
        hasher.finish()
    }

    /// Maps a precomputed hash to a shard index in `[0, shards)`.
    #[inline]
    pub fn shard_for_hash(&self, hash: u64) -> usize {
        if self.shards == 1 {
            0
        } else {
            (hash >> self.shift) as usize
        }
    }

    /// Hashes `key` and maps it to a shard index.
    #[inline]
    pub fn shard_for_key<K: Hash + ?Sized>(&self, key: &K) -> usize {
        self.shard_for_hash(self.hash_key(key))
    }
}

impl Default for ShardSelector {
    /// Creates a single-shard selector with seed 0.
    fn default() -> Self {
        Self::new(1, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_selector_is_deterministic() {
        let selector = ShardSelector::new(8, 123);

        let a = selector.shard_for_key(&"key");
        let b = selector.shard_for_key(&"key");
        assert_eq!(a, b);
        assert!(a < selector.shard_count());
    }

    #[test]
    fn single_shard_always_zero() {
        let selector = ShardSelector::default();
        for key in 0u64..1_000 {
            assert_eq!(selector.shard_for_key(&key), 0);
        }
    }

    #[test]
    fn sequential_keys_reach_every_shard() {
        let selector = ShardSelector::new(16, 7);
        let mut seen = [0usize; 16];
        for key in 0u64..16_384 {
            seen[selector.shard_for_key(&key)] += 1;
        }
        assert!(
            seen.iter().all(|&count| count > 0),
            "unused shard in {:?}",
            seen
        );
    }

    #[test]
    fn seed_changes_hash() {
        let a = ShardSelector::new(4, 1);
        let b = ShardSelector::new(4, 2);
        assert_ne!(a.hash_key(&42u64), b.hash_key(&42u64));
    }
}
