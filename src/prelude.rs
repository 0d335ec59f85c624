pub use crate::builder::WeakCacheBuilder;
pub use crate::cache::{Strength, WeakCache};
pub use crate::ds::ShardSelector;
pub use crate::error::{ConfigError, InvariantError};
pub use crate::harness::{
    Admission, Key, RunConfig, RunReport, Scenario, ScenarioConfig, ScrambledZipfianGenerator,
    StrongRefTracker,
};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::WeakCacheMetricsSnapshot;
pub use crate::traits::{BasicCache, ComputeCache, ConcurrentCache};
