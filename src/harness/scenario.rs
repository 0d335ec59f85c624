//! Benchmark scenarios.
//!
//! A scenario owns a cache and whatever shared fixtures its operations need.
//! The driver calls [`Scenario::setup`] once, then runs every
//! [`GroupSpec`]'s threads concurrently, each looping on [`Scenario::op`]
//! with its own [`Scenario::ThreadState`].
//!
//! | Scenario | Groups | Cache |
//! |---|---|---|
//! | [`PutRemoveScenario`] | `put` ×4, `remove` ×4 | bounded `2 * SIZE`, weak keys + values |
//! | [`EvictionScenario`] | `evict` ×1 | bounded `size`, weak keys + values |
//! | [`ComputeScenario`] | `compute_same_key` or `compute_spread` ×32 | unbounded, weak keys + values |
//! | [`ExtremeWeakKeysScenario`] | `put` ×11, `drop_strong_references` ×1 | bounded `cache_size`, weak keys, weak or strong values |
//!
//! Values that must outlive a weak-valued entry (the shared `true`) and keys
//! that must stay reachable (the precomputed key tables) are held strongly by
//! the scenario itself.

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::builder::WeakCacheBuilder;
use crate::cache::WeakCache;
use crate::error::ConfigError;
use crate::harness::config::ScenarioConfig;
use crate::harness::key::Key;
use crate::harness::tracker::StrongRefTracker;
use crate::harness::zipfian::ScrambledZipfianGenerator;

/// Key-table size of the put/remove and compute scenarios.
pub const SIZE: usize = 2 << 14;
/// Index mask into the key table.
pub const MASK: usize = SIZE - 1;
/// Number of distinct Zipfian keys in the key table.
pub const ITEMS: usize = SIZE / 3;
/// Key hit by every `compute_same_key` call.
pub const COMPUTE_KEY: i32 = (SIZE / 2) as i32;

/// A named group of threads running the same operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSpec {
    pub name: &'static str,
    pub threads: usize,
}

impl GroupSpec {
    pub const fn new(name: &'static str, threads: usize) -> Self {
        Self { name, threads }
    }
}

/// A multi-threaded benchmark workload.
pub trait Scenario: Sync {
    /// Per-thread mutable state.
    type ThreadState: Send;

    /// Display name, including parameters.
    fn name(&self) -> String;

    /// Thread groups; `op` receives an index into this list.
    fn groups(&self) -> Vec<GroupSpec>;

    /// Builds fixtures before the first iteration.
    fn setup(&mut self);

    /// Creates the state of one worker. `thread_index` is unique across all
    /// groups of a run.
    fn thread_state(&self, group: usize, thread_index: usize) -> Self::ThreadState;

    /// Runs one operation of `group`.
    fn op(&self, group: usize, state: &mut Self::ThreadState);

    /// Runs after each iteration, with all workers stopped.
    fn iteration_teardown(&self) {}

    /// Releases fixtures after the last iteration.
    fn teardown(&mut self) {}

    /// Auxiliary counters reported next to throughput.
    fn aux_counters(&self) -> Vec<(&'static str, u64)> {
        Vec::new()
    }
}

fn thread_seed(base: u64, thread_index: usize) -> u64 {
    base ^ (thread_index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Fills a key table with `SIZE` scrambled-Zipfian keys over `ITEMS`.
fn zipfian_table(seed: u64) -> Box<[Arc<i32>]> {
    let mut generator = ScrambledZipfianGenerator::with_seed(ITEMS as u64, seed);
    (0..SIZE)
        .map(|_| Arc::new(generator.next_value() as i32))
        .collect()
}

fn weak_cache<K, V>(maximum_size: Option<usize>) -> WeakCache<K, V>
where
    K: Eq + std::hash::Hash,
{
    match maximum_size {
        Some(max) => WeakCache::new(max),
        None => WeakCacheBuilder::new().weak_keys().weak_values().build(),
    }
}

/// Cursor into a key table, starting at a random offset.
#[derive(Debug, Clone)]
pub struct CursorState {
    index: usize,
}

impl CursorState {
    fn seeded(seed: u64) -> Self {
        Self {
            index: SmallRng::seed_from_u64(seed).random::<u64>() as usize,
        }
    }

    #[inline]
    fn advance(&mut self) -> usize {
        let current = self.index & MASK;
        self.index = self.index.wrapping_add(1);
        current
    }
}

// ---------------------------------------------------------------------------
// Put / remove
// ---------------------------------------------------------------------------

/// Concurrent puts and removes over a Zipfian key table.
#[derive(Debug)]
pub struct PutRemoveScenario {
    cache: WeakCache<i32, bool>,
    ints: Box<[Arc<i32>]>,
    present: Arc<bool>,
    config: ScenarioConfig,
}

impl PutRemoveScenario {
    pub const PUT: usize = 0;
    pub const REMOVE: usize = 1;

    pub fn new(config: &ScenarioConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            cache: weak_cache(Some(2 * SIZE)),
            ints: Vec::new().into_boxed_slice(),
            present: Arc::new(true),
            config: config.clone(),
        })
    }

    pub fn cache(&self) -> &WeakCache<i32, bool> {
        &self.cache
    }
}

impl Scenario for PutRemoveScenario {
    type ThreadState = CursorState;

    fn name(&self) -> String {
        "put_remove".to_string()
    }

    fn groups(&self) -> Vec<GroupSpec> {
        vec![
            GroupSpec::new("put", self.config.threads_for(4)),
            GroupSpec::new("remove", self.config.threads_for(4)),
        ]
    }

    fn setup(&mut self) {
        // Touch every internal structure once before measuring
        for i in 0..2 * SIZE {
            self.cache.put(Arc::new(i as i32), Arc::clone(&self.present));
        }
        self.cache.clear();

        self.ints = zipfian_table(self.config.seed);
        for key in self.ints.iter() {
            self.cache.put(Arc::clone(key), Arc::clone(&self.present));
        }
        info!(
            "put_remove: populated {} keys ({} live entries)",
            self.ints.len(),
            self.cache.live_len()
        );
    }

    fn thread_state(&self, _group: usize, thread_index: usize) -> CursorState {
        CursorState::seeded(thread_seed(self.config.seed, thread_index))
    }

    fn op(&self, group: usize, state: &mut CursorState) {
        let key = &self.ints[state.advance()];
        if group == Self::PUT {
            self.cache.put(Arc::clone(key), Arc::clone(&self.present));
        } else {
            black_box(self.cache.remove(key));
        }
    }

    fn iteration_teardown(&self) {
        self.cache.clean_up();
    }
}

// ---------------------------------------------------------------------------
// Eviction
// ---------------------------------------------------------------------------

/// Every put lands a new key in a full cache.
#[derive(Debug)]
pub struct EvictionScenario {
    cache: WeakCache<i32, bool>,
    size: usize,
    present: Arc<bool>,
    config: ScenarioConfig,
}

/// Next key of an eviction thread.
#[derive(Debug, Clone, Default)]
pub struct EvictState {
    key: i32,
}

impl EvictionScenario {
    pub fn new(config: &ScenarioConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            cache: weak_cache(Some(config.eviction_size)),
            size: config.eviction_size,
            present: Arc::new(true),
            config: config.clone(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cache(&self) -> &WeakCache<i32, bool> {
        &self.cache
    }
}

impl Scenario for EvictionScenario {
    type ThreadState = EvictState;

    fn name(&self) -> String {
        format!("eviction/{}", self.size)
    }

    fn groups(&self) -> Vec<GroupSpec> {
        vec![GroupSpec::new("evict", self.config.threads_for(1))]
    }

    fn setup(&mut self) {
        for i in 0..self.size {
            let key = i32::MIN.wrapping_add(i as i32);
            self.cache.put(Arc::new(key), Arc::clone(&self.present));
        }
        info!("eviction: prepopulated {} keys", self.size);
    }

    fn thread_state(&self, _group: usize, _thread_index: usize) -> EvictState {
        EvictState::default()
    }

    fn op(&self, _group: usize, state: &mut EvictState) {
        let key = state.key;
        state.key = key.wrapping_add(1);
        self.cache.put(Arc::new(key), Arc::clone(&self.present));
    }

    fn iteration_teardown(&self) {
        self.cache.clean_up();
    }
}

// ---------------------------------------------------------------------------
// Compute
// ---------------------------------------------------------------------------

/// Key selection of [`ComputeScenario`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeMode {
    /// Every call targets [`COMPUTE_KEY`].
    SameKey,
    /// Calls walk the Zipfian key table.
    Spread,
}

impl ComputeMode {
    pub fn group_name(self) -> &'static str {
        match self {
            ComputeMode::SameKey => "compute_same_key",
            ComputeMode::Spread => "compute_spread",
        }
    }
}

/// Compute-if-absent throughput on an unbounded weak cache.
#[derive(Debug)]
pub struct ComputeScenario {
    cache: WeakCache<i32, bool>,
    mode: ComputeMode,
    ints: Box<[Arc<i32>]>,
    compute_key: Arc<i32>,
    present: Arc<bool>,
    config: ScenarioConfig,
}

impl ComputeScenario {
    pub fn new(mode: ComputeMode, config: &ScenarioConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            cache: weak_cache(None),
            mode,
            ints: zipfian_table(config.seed),
            compute_key: Arc::new(COMPUTE_KEY),
            present: Arc::new(true),
            config: config.clone(),
        })
    }

    pub fn mode(&self) -> ComputeMode {
        self.mode
    }

    pub fn cache(&self) -> &WeakCache<i32, bool> {
        &self.cache
    }

    #[inline]
    fn compute(&self, key: &Arc<i32>) -> Arc<bool> {
        self.cache
            .get_with(Arc::clone(key), |_| Arc::clone(&self.present))
    }
}

impl Scenario for ComputeScenario {
    type ThreadState = CursorState;

    fn name(&self) -> String {
        self.mode.group_name().to_string()
    }

    fn groups(&self) -> Vec<GroupSpec> {
        vec![GroupSpec::new(self.mode.group_name(), self.config.threads_for(32))]
    }

    fn setup(&mut self) {
        self.cache = weak_cache(None);
        for key in self.ints.iter() {
            self.compute(key);
        }
        self.compute(&self.compute_key);
        info!("{}: precomputed {} keys", self.name(), self.cache.len());
    }

    fn thread_state(&self, _group: usize, thread_index: usize) -> CursorState {
        CursorState::seeded(thread_seed(self.config.seed, thread_index))
    }

    fn op(&self, _group: usize, state: &mut CursorState) {
        let value = match self.mode {
            ComputeMode::SameKey => self.compute(&self.compute_key),
            ComputeMode::Spread => self.compute(&self.ints[state.advance()]),
        };
        black_box(value);
    }
}

// ---------------------------------------------------------------------------
// Extreme weak keys
// ---------------------------------------------------------------------------

/// A huge weak-keyed cache whose keys lose their last strong reference at a
/// steady rate.
///
/// `put` threads create fresh [`Key`]s, hand them to the strong reference
/// pool and insert them; a single `drop_strong_references` thread releases
/// the oldest pooled keys, which turns their cache entries into garbage for
/// the cache's reaping path.
///
/// Values are held weakly by default, as in the reference suite; since each
/// value is created for its `put` and dropped right after, entries are
/// collectable on arrival. [`ScenarioConfig::strong_values`] keeps values
/// alive so that only releasing a key makes its entry collectable.
#[derive(Debug)]
pub struct ExtremeWeakKeysScenario {
    cache: WeakCache<Key, i32>,
    tracker: StrongRefTracker<Key>,
    operations: AtomicU64,
    config: ScenarioConfig,
}

/// Per-thread state of [`ExtremeWeakKeysScenario`].
#[derive(Debug, Clone)]
pub struct ExtremeThreadState {
    keys: ScrambledZipfianGenerator,
    rng: SmallRng,
}

impl ExtremeWeakKeysScenario {
    pub const PUT: usize = 0;
    pub const DROP_STRONG_REFERENCES: usize = 1;

    pub fn new(config: &ScenarioConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            cache: Self::build_cache(config),
            tracker: StrongRefTracker::with_admission(config.active_strong_refs, config.admission),
            operations: AtomicU64::new(0),
            config: config.clone(),
        })
    }

    fn build_cache(config: &ScenarioConfig) -> WeakCache<Key, i32> {
        let builder = WeakCacheBuilder::new()
            .initial_capacity(config.cache_size)
            .maximum_size(config.cache_size)
            .weak_keys();
        if config.strong_values {
            builder.build()
        } else {
            builder.weak_values().build()
        }
    }

    pub fn cache(&self) -> &WeakCache<Key, i32> {
        &self.cache
    }

    pub fn tracker(&self) -> &StrongRefTracker<Key> {
        &self.tracker
    }

    pub fn operations(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }

    fn put_key(&self, id: i32, value: i32) {
        let key = Arc::new(Key::new(id));
        self.tracker.track_key(Arc::clone(&key));
        self.cache.put(key, Arc::new(value));
    }
}

impl Scenario for ExtremeWeakKeysScenario {
    type ThreadState = ExtremeThreadState;

    fn name(&self) -> String {
        format!(
            "extreme_weak_keys/{}/{}",
            self.config.cache_size, self.config.active_strong_refs
        )
    }

    fn groups(&self) -> Vec<GroupSpec> {
        vec![
            GroupSpec::new("put", self.config.threads_for(11)),
            GroupSpec::new("drop_strong_references", self.config.threads_for(1)),
        ]
    }

    fn setup(&mut self) {
        self.tracker =
            StrongRefTracker::with_admission(self.config.active_strong_refs, self.config.admission);
        self.operations.store(0, Ordering::Relaxed);

        let mut generator =
            ScrambledZipfianGenerator::with_seed(self.config.cache_size as u64, self.config.seed);
        for _ in 0..self.config.cache_size {
            let id = generator.next_value() as i32;
            self.put_key(id, id);
        }
        info!(
            "extreme_weak_keys: populated {} entries, {} strong references held",
            self.cache.len(),
            self.tracker.len()
        );
    }

    fn thread_state(&self, _group: usize, thread_index: usize) -> ExtremeThreadState {
        let seed = thread_seed(self.config.seed, thread_index);
        ExtremeThreadState {
            keys: ScrambledZipfianGenerator::with_seed(self.config.cache_size as u64, seed),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn op(&self, group: usize, state: &mut ExtremeThreadState) {
        if group == Self::PUT {
            let id = state.keys.next_value() as i32;
            self.put_key(id, state.rng.random_range(0..i32::MAX));
            self.operations.fetch_add(1, Ordering::Relaxed);
        } else {
            self.tracker.release_oldest();
        }
    }

    fn teardown(&mut self) {
        self.cache.clear();
        let released = self.tracker.release_all();
        info!("extreme_weak_keys: teardown released {} strong references", released);
    }

    fn aux_counters(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("operations", self.operations()),
            ("collections", self.tracker.collections()),
        ]
    }
}
