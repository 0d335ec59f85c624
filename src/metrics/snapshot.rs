/// Point-in-time view of a [`WeakCache`](crate::cache::WeakCache)'s counters,
/// summed across shards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WeakCacheMetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    pub collected_skips: u64, // slots read as absent because a referent was dropped

    pub put_calls: u64,
    pub insert_new: u64,
    pub insert_updates: u64,

    pub compute_calls: u64,
    pub compute_misses: u64,

    pub remove_calls: u64,
    pub remove_found: u64,

    pub evicted_entries: u64,
    pub collected_entries: u64, // slots reaped after their key or value was dropped
    pub stale_skips: u64,       // order records popped whose slot was already gone
    pub maintenance_runs: u64,
    pub order_compactions: u64,
    pub clears: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub order_len: usize,
    pub capacity: usize,
}

impl WeakCacheMetricsSnapshot {
    /// Fraction of `get` calls that found a live entry.
    pub fn hit_rate(&self) -> f64 {
        if self.get_calls == 0 {
            0.0
        } else {
            self.get_hits as f64 / self.get_calls as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_handles_no_gets() {
        assert_eq!(WeakCacheMetricsSnapshot::default().hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_is_fraction_of_gets() {
        let snapshot = WeakCacheMetricsSnapshot {
            get_calls: 4,
            get_hits: 3,
            get_misses: 1,
            ..Default::default()
        };
        assert!((snapshot.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
