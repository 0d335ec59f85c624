//! Observability for [`WeakCache`](crate::cache::WeakCache).
//!
//! Enabled by the `metrics` feature. Shards record into
//! [`WeakCacheMetrics`](metrics_impl::WeakCacheMetrics) while holding their
//! lock; [`WeakCache::metrics_snapshot`](crate::cache::WeakCache::metrics_snapshot)
//! sums them into a [`WeakCacheMetricsSnapshot`](snapshot::WeakCacheMetricsSnapshot).

pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
