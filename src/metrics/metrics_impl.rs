use crate::metrics::snapshot::WeakCacheMetricsSnapshot;
use crate::metrics::traits::WeakCacheMetricsRecorder;

/// Per-shard counters.
///
/// Plain integers: every write happens while the owning shard's lock is held.
#[derive(Debug, Default, Clone)]
pub struct WeakCacheMetrics {
    pub get_hits: u64,
    pub get_misses: u64,
    pub collected_skips: u64,
    pub put_calls: u64,
    pub insert_new: u64,
    pub insert_updates: u64,
    pub compute_calls: u64,
    pub compute_misses: u64,
    pub remove_calls: u64,
    pub remove_found: u64,
    pub evicted_entries: u64,
    pub collected_entries: u64,
    pub stale_skips: u64,
    pub maintenance_runs: u64,
    pub order_compactions: u64,
    pub clears: u64,
}

impl WeakCacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds this shard's counters into `snapshot`.
    pub fn accumulate(&self, snapshot: &mut WeakCacheMetricsSnapshot) {
        snapshot.get_calls += self.get_hits + self.get_misses;
        snapshot.get_hits += self.get_hits;
        snapshot.get_misses += self.get_misses;
        snapshot.collected_skips += self.collected_skips;
        snapshot.put_calls += self.put_calls;
        snapshot.insert_new += self.insert_new;
        snapshot.insert_updates += self.insert_updates;
        snapshot.compute_calls += self.compute_calls;
        snapshot.compute_misses += self.compute_misses;
        snapshot.remove_calls += self.remove_calls;
        snapshot.remove_found += self.remove_found;
        snapshot.evicted_entries += self.evicted_entries;
        snapshot.collected_entries += self.collected_entries;
        snapshot.stale_skips += self.stale_skips;
        snapshot.maintenance_runs += self.maintenance_runs;
        snapshot.order_compactions += self.order_compactions;
        // Every shard records each clear, so report the maximum.
        snapshot.clears = snapshot.clears.max(self.clears);
    }
}

impl WeakCacheMetricsRecorder for WeakCacheMetrics {
    #[inline]
    fn record_get_hit(&mut self) {
        self.get_hits += 1;
    }

    #[inline]
    fn record_get_miss(&mut self) {
        self.get_misses += 1;
    }

    #[inline]
    fn record_collected_skip(&mut self) {
        self.collected_skips += 1;
    }

    #[inline]
    fn record_put_call(&mut self) {
        self.put_calls += 1;
    }

    #[inline]
    fn record_insert_new(&mut self) {
        self.insert_new += 1;
    }

    #[inline]
    fn record_insert_update(&mut self) {
        self.insert_updates += 1;
    }

    #[inline]
    fn record_compute_call(&mut self) {
        self.compute_calls += 1;
    }

    #[inline]
    fn record_compute_miss(&mut self) {
        self.compute_misses += 1;
    }

    #[inline]
    fn record_remove_call(&mut self) {
        self.remove_calls += 1;
    }

    #[inline]
    fn record_remove_found(&mut self) {
        self.remove_found += 1;
    }

    #[inline]
    fn record_evicted_entry(&mut self) {
        self.evicted_entries += 1;
    }

    #[inline]
    fn record_collected_entry(&mut self) {
        self.collected_entries += 1;
    }

    #[inline]
    fn record_stale_skip(&mut self) {
        self.stale_skips += 1;
    }

    #[inline]
    fn record_maintenance_run(&mut self) {
        self.maintenance_runs += 1;
    }

    #[inline]
    fn record_order_compaction(&mut self) {
        self.order_compactions += 1;
    }

    #[inline]
    fn record_clear(&mut self) {
        self.clears += 1;
    }
}
