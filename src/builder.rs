//! Builder for [`WeakCache`].
//!
//! Mirrors the construction contract the harness expects from a cache:
//! weak-key and weak-value flags plus a maximum size, with optional initial
//! capacity and shard count.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use weakkit::builder::WeakCacheBuilder;
//!
//! let cache = WeakCacheBuilder::new()
//!     .initial_capacity(1_024)
//!     .maximum_size(1_024)
//!     .weak_keys()
//!     .weak_values()
//!     .build::<u64, bool>();
//!
//! assert!(cache.weak_keys() && cache.weak_values());
//! assert_eq!(cache.capacity(), Some(1_024));
//! ```

use std::hash::Hash;

use crate::cache::entry::Strength;
use crate::cache::weak::{DEFAULT_SHARDS, WeakCache};
use crate::ds::ShardSelector;
use crate::error::ConfigError;

/// Fluent configuration for a [`WeakCache`].
///
/// Defaults: unbounded, strong keys and values, [`DEFAULT_SHARDS`] shards,
/// no pre-allocation.
#[derive(Debug, Clone)]
pub struct WeakCacheBuilder {
    maximum_size: Option<usize>,
    initial_capacity: Option<usize>,
    shards: usize,
    key_strength: Strength,
    value_strength: Strength,
    seed: u64,
}

impl Default for WeakCacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WeakCacheBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            maximum_size: None,
            initial_capacity: None,
            shards: DEFAULT_SHARDS,
            key_strength: Strength::Strong,
            value_strength: Strength::Strong,
            seed: 0,
        }
    }

    /// Bounds the number of entries. `0` is allowed: every insert is evicted
    /// immediately.
    pub fn maximum_size(mut self, maximum_size: usize) -> Self {
        self.maximum_size = Some(maximum_size);
        self
    }

    /// Pre-allocates room for `initial_capacity` entries across all shards.
    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = Some(initial_capacity);
        self
    }

    /// Sets the shard count. Must be a power of two.
    ///
    /// Bounded caches never use more shards than the largest power of two not
    /// above the maximum size, so small caches keep a global FIFO order.
    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Holds keys weakly.
    pub fn weak_keys(mut self) -> Self {
        self.key_strength = Strength::Weak;
        self
    }

    /// Holds values weakly.
    pub fn weak_values(mut self) -> Self {
        self.value_strength = Strength::Weak;
        self
    }

    /// Seeds the key hash used for shard selection.
    pub fn hash_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the configuration and builds the cache.
    ///
    /// # Example
    ///
    /// ```
    /// use weakkit::builder::WeakCacheBuilder;
    ///
    /// let err = WeakCacheBuilder::new()
    ///     .maximum_size(10)
    ///     .initial_capacity(20)
    ///     .try_build::<u32, u32>()
    ///     .unwrap_err();
    /// assert!(err.message().contains("initial_capacity"));
    /// ```
    pub fn try_build<K, V>(self) -> Result<WeakCache<K, V>, ConfigError>
    where
        K: Eq + Hash,
    {
        self.validate()?;

        let shards = match self.maximum_size {
            Some(max) => self.shards.min(largest_power_of_two_at_most(max.max(1))),
            None => self.shards,
        };

        Ok(WeakCache::from_parts(
            self.maximum_size,
            self.initial_capacity.unwrap_or(0),
            ShardSelector::new(shards, self.seed),
            self.key_strength,
            self.value_strength,
        ))
    }

    /// Builds the cache.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid; see [`try_build`](Self::try_build).
    pub fn build<K, V>(self) -> WeakCache<K, V>
    where
        K: Eq + Hash,
    {
        match self.try_build() {
            Ok(cache) => cache,
            Err(err) => panic!("invalid weak cache configuration: {err}"),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.shards == 0 {
            return Err(ConfigError::new("shards must be greater than zero"));
        }
        if !self.shards.is_power_of_two() {
            return Err(ConfigError::new(format!(
                "shards must be a power of two, got {}",
                self.shards
            )));
        }
        if let (Some(initial), Some(max)) = (self.initial_capacity, self.maximum_size) {
            if initial > max {
                return Err(ConfigError::new(format!(
                    "initial_capacity ({initial}) must not exceed maximum_size ({max})"
                )));
            }
        }
        Ok(())
    }
}

fn largest_power_of_two_at_most(n: usize) -> usize {
    1 << (usize::BITS - 1 - n.leading_zeros())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strong_and_unbounded() {
        let cache = WeakCacheBuilder::new().build::<u64, u64>();
        assert!(!cache.weak_keys());
        assert!(!cache.weak_values());
        assert_eq!(cache.capacity(), None);
        assert_eq!(cache.shard_count(), DEFAULT_SHARDS);
    }

    #[test]
    fn strength_flags_are_independent() {
        let keys = WeakCacheBuilder::new().weak_keys().build::<u64, u64>();
        assert!(keys.weak_keys() && !keys.weak_values());

        let values = WeakCacheBuilder::new().weak_values().build::<u64, u64>();
        assert!(!values.weak_keys() && values.weak_values());
    }

    #[test]
    fn rejects_zero_shards() {
        let err = WeakCacheBuilder::new().shards(0).try_build::<u64, u64>().unwrap_err();
        assert!(err.message().contains("greater than zero"));
    }

    #[test]
    fn rejects_non_power_of_two_shards() {
        let err = WeakCacheBuilder::new().shards(6).try_build::<u64, u64>().unwrap_err();
        assert!(err.message().contains("power of two"));
    }

    #[test]
    fn rejects_initial_capacity_above_maximum() {
        assert!(
            WeakCacheBuilder::new()
                .maximum_size(4)
                .initial_capacity(8)
                .try_build::<u64, u64>()
                .is_err()
        );
    }

    #[test]
    #[should_panic(expected = "invalid weak cache configuration")]
    fn build_panics_on_invalid_config() {
        let _ = WeakCacheBuilder::new().shards(3).build::<u64, u64>();
    }

    #[test]
    fn small_maximum_clamps_shards() {
        let cache = WeakCacheBuilder::new()
            .maximum_size(5)
            .shards(64)
            .build::<u64, u64>();
        assert_eq!(cache.shard_count(), 4);

        let single = WeakCacheBuilder::new().maximum_size(0).build::<u64, u64>();
        assert_eq!(single.shard_count(), 1);
    }

    #[test]
    fn largest_power_of_two_helper() {
        assert_eq!(largest_power_of_two_at_most(1), 1);
        assert_eq!(largest_power_of_two_at_most(5), 4);
        assert_eq!(largest_power_of_two_at_most(64), 64);
        assert_eq!(largest_power_of_two_at_most(100), 64);
    }
}
