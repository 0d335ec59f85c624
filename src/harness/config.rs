//! Scenario and run configuration.
//!
//! Defaults reproduce the sizes of the reference weak-reference benchmark
//! suite; [`ScenarioConfig::smoke`] and [`RunConfig::smoke`] shrink everything
//! for tests.

use std::time::Duration;

use crate::error::ConfigError;
use crate::harness::tracker::Admission;

/// Default maximum size of the extreme weak-keys cache.
pub const EXTREME_CACHE_SIZE: usize = 6_000_000;

/// Default number of strong key references kept alive at once.
pub const ACTIVE_STRONG_REFS: usize = 4_000_000;

/// Default eviction-scenario cache size.
pub const EVICTION_SIZE: usize = 10_000;

/// Eviction sizes swept by the full benchmark matrix.
pub const EVICTION_SIZES: [usize; 5] = [1, 100, 10_000, 1_000_000, 10_000_000];

/// Tunables shared by the scenarios.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    /// Overrides every group's default thread count when set.
    pub threads_per_group: Option<usize>,
    /// Base seed; each thread derives its own stream from it.
    pub seed: u64,
    /// Maximum size of the eviction scenario's cache.
    pub eviction_size: usize,
    /// Maximum size (and key universe) of the extreme weak-keys cache.
    pub cache_size: usize,
    /// Strong reference pool bound of the extreme weak-keys scenario.
    pub active_strong_refs: usize,
    /// Admission policy of the strong reference pool.
    pub admission: Admission,
    /// Holds the extreme weak-keys cache's values strongly, so an entry stays
    /// live exactly as long as its key is reachable.
    pub strong_values: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            threads_per_group: None,
            seed: 0x5EED,
            eviction_size: EVICTION_SIZE,
            cache_size: EXTREME_CACHE_SIZE,
            active_strong_refs: ACTIVE_STRONG_REFS,
            admission: Admission::BelowBound,
            strong_values: false,
        }
    }
}

impl ScenarioConfig {
    /// Small sizes and one thread per group.
    pub fn smoke() -> Self {
        Self {
            threads_per_group: Some(1),
            eviction_size: 64,
            cache_size: 2_048,
            active_strong_refs: 1_024,
            ..Self::default()
        }
    }

    /// Resolves a group's thread count.
    pub fn threads_for(&self, default_threads: usize) -> usize {
        self.threads_per_group.unwrap_or(default_threads)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads_per_group == Some(0) {
            return Err(ConfigError::new("threads_per_group must be greater than zero"));
        }
        if self.cache_size == 0 {
            return Err(ConfigError::new("cache_size must be greater than zero"));
        }
        if self.cache_size > i32::MAX as usize {
            return Err(ConfigError::new(format!(
                "cache_size ({}) must fit in a 32-bit key space",
                self.cache_size
            )));
        }
        if self.eviction_size > u32::MAX as usize {
            return Err(ConfigError::new(format!(
                "eviction_size ({}) must fit in a 32-bit key space",
                self.eviction_size
            )));
        }
        Ok(())
    }
}

/// Measurement settings for the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Iterations run and discarded before measuring.
    pub warmup_iterations: usize,
    /// Measured iterations.
    pub iterations: usize,
    /// Wall-clock length of each iteration.
    pub iteration_duration: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            warmup_iterations: 1,
            iterations: 5,
            iteration_duration: Duration::from_secs(1),
        }
    }
}

impl RunConfig {
    /// One short measured iteration, no warmup.
    pub fn smoke() -> Self {
        Self {
            warmup_iterations: 0,
            iterations: 1,
            iteration_duration: Duration::from_millis(50),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::new("iterations must be greater than zero"));
        }
        if self.iteration_duration.is_zero() {
            return Err(ConfigError::new("iteration_duration must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ScenarioConfig::default().validate().unwrap();
        ScenarioConfig::smoke().validate().unwrap();
        RunConfig::default().validate().unwrap();
        RunConfig::smoke().validate().unwrap();
    }

    #[test]
    fn zero_threads_rejected() {
        let config = ScenarioConfig {
            threads_per_group: Some(0),
            ..ScenarioConfig::default()
        };
        assert!(config.validate().unwrap_err().message().contains("threads_per_group"));
    }

    #[test]
    fn oversized_key_space_rejected() {
        let config = ScenarioConfig {
            cache_size: i32::MAX as usize + 1,
            ..ScenarioConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_duration_rejected() {
        let config = RunConfig {
            iteration_duration: Duration::ZERO,
            ..RunConfig::default()
        };
        assert!(config.validate().unwrap_err().message().contains("iteration_duration"));
    }

    #[test]
    fn threads_for_prefers_override() {
        assert_eq!(ScenarioConfig::default().threads_for(11), 11);
        assert_eq!(ScenarioConfig::smoke().threads_for(11), 1);
    }
}
