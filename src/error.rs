//! Error types for the weakkit library.
//!
//! ## Key Components
//!
//! - [`InvariantError`]: Returned by [`WeakCache::check_invariants`] when the
//!   shard bookkeeping (entry counts, FIFO order records, capacity) is
//!   inconsistent.
//! - [`ConfigError`]: Returned when cache, scenario or run configuration is
//!   invalid (e.g. a non power-of-two shard count, a zero-length measurement
//!   iteration).
//!
//! ## Example Usage
//!
//! ```
//! use weakkit::builder::WeakCacheBuilder;
//! use weakkit::error::ConfigError;
//!
//! let cache: Result<_, ConfigError> = WeakCacheBuilder::new()
//!     .maximum_size(1_000)
//!     .weak_keys()
//!     .try_build::<u64, u64>();
//! assert!(cache.is_ok());
//!
//! // Shard counts must be powers of two
//! let bad = WeakCacheBuilder::new().shards(3).try_build::<u64, u64>();
//! assert!(bad.is_err());
//! ```
//!
//! [`WeakCache::check_invariants`]: crate::cache::WeakCache::check_invariants

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Carries a human-readable description of which invariant failed and in
/// which shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when configuration parameters are invalid.
///
/// Produced by [`WeakCacheBuilder::try_build`](crate::builder::WeakCacheBuilder::try_build),
/// [`ScenarioConfig::validate`](crate::harness::config::ScenarioConfig::validate)
/// and [`RunConfig::validate`](crate::harness::config::RunConfig::validate).
///
/// # Example
///
/// ```
/// use weakkit::harness::config::RunConfig;
///
/// let err = RunConfig { iterations: 0, ..RunConfig::default() }
///     .validate()
///     .unwrap_err();
/// assert!(err.to_string().contains("iterations"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
