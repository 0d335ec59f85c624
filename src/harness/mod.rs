//! Benchmark harness: keys, key generators, the strong reference pool, the
//! scenarios built from them, and the driver that runs them.

pub mod config;
pub mod driver;
pub mod key;
pub mod scenario;
pub mod tracker;
pub mod zipfian;

pub use config::{RunConfig, ScenarioConfig};
pub use driver::{GroupReport, RunReport, run};
pub use key::Key;
pub use scenario::{
    ComputeMode, ComputeScenario, EvictionScenario, ExtremeWeakKeysScenario, GroupSpec,
    PutRemoveScenario, Scenario,
};
pub use tracker::{Admission, StrongRefTracker};
pub use zipfian::{ScrambledZipfianGenerator, ZipfianGenerator};
