//! # Metrics Trait Hierarchy
//!
//! Recording, snapshotting and export are separate traits so the cache only
//! ever writes counters, benches read snapshots, and monitoring publishes them.
//!
//! ```text
//!   ┌──────────────────────────────┐
//!   │   WeakCacheMetricsRecorder   │   written under the shard lock
//!   │  put/get/remove/evict/reap   │
//!   └──────────────┬───────────────┘
//!                  │
//!   Consumption (decoupled from recording):
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (bench/test)                 │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```

/// Counters written by [`WeakCache`](crate::cache::WeakCache) shards.
pub trait WeakCacheMetricsRecorder {
    fn record_get_hit(&mut self);
    fn record_get_miss(&mut self);
    /// A `get` or `put` passed over a slot with the same hash whose key or
    /// value was already dropped.
    fn record_collected_skip(&mut self);
    /// A direct `put`; inserts made by `get_with` are not counted.
    fn record_put_call(&mut self);
    fn record_insert_new(&mut self);
    fn record_insert_update(&mut self);
    fn record_compute_call(&mut self);
    fn record_compute_miss(&mut self);
    fn record_remove_call(&mut self);
    fn record_remove_found(&mut self);
    fn record_evicted_entry(&mut self);
    fn record_collected_entry(&mut self);
    fn record_stale_skip(&mut self);
    fn record_maintenance_run(&mut self);
    fn record_order_compaction(&mut self);
    fn record_clear(&mut self);
}

/// Produces a point-in-time snapshot for benches and tests.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Publishes a snapshot to a monitoring sink.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
