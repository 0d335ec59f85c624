use std::io::Write;

use parking_lot::Mutex;

use crate::metrics::snapshot::WeakCacheMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for weak cache snapshots.
///
/// Writes the Prometheus text exposition format so the output can be scraped
/// or forwarded to an OpenTelemetry collector. Write errors are ignored.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the exporter and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_metric(&self, kind: &str, suffix: &str, value: u64) {
        let name = self.metric_name(suffix);
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send> MetricsExporter<WeakCacheMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &WeakCacheMetricsSnapshot) {
        let counters = [
            ("get_calls_total", snapshot.get_calls),
            ("get_hits_total", snapshot.get_hits),
            ("get_misses_total", snapshot.get_misses),
            ("collected_skips_total", snapshot.collected_skips),
            ("put_calls_total", snapshot.put_calls),
            ("insert_new_total", snapshot.insert_new),
            ("insert_updates_total", snapshot.insert_updates),
            ("compute_calls_total", snapshot.compute_calls),
            ("compute_misses_total", snapshot.compute_misses),
            ("remove_calls_total", snapshot.remove_calls),
            ("remove_found_total", snapshot.remove_found),
            ("evicted_entries_total", snapshot.evicted_entries),
            ("collected_entries_total", snapshot.collected_entries),
            ("stale_skips_total", snapshot.stale_skips),
            ("maintenance_runs_total", snapshot.maintenance_runs),
            ("order_compactions_total", snapshot.order_compactions),
            ("clears_total", snapshot.clears),
        ];
        for (suffix, value) in counters {
            self.write_metric("counter", suffix, value);
        }

        self.write_metric("gauge", "cache_len", snapshot.cache_len as u64);
        self.write_metric("gauge", "order_len", snapshot.order_len as u64);
        self.write_metric("gauge", "capacity", snapshot.capacity as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_prefixed_counters_and_gauges() {
        let exporter = PrometheusTextExporter::new("weakkit", Vec::new());
        let snapshot = WeakCacheMetricsSnapshot {
            get_hits: 7,
            collected_entries: 3,
            cache_len: 42,
            ..Default::default()
        };
        exporter.export(&snapshot);

        let text = String::from_utf8(exporter.into_inner()).unwrap();
        assert!(text.contains("# TYPE weakkit_get_hits_total counter"));
        assert!(text.contains("weakkit_get_hits_total 7"));
        assert!(text.contains("weakkit_collected_entries_total 3"));
        assert!(text.contains("# TYPE weakkit_cache_len gauge"));
        assert!(text.contains("weakkit_cache_len 42"));
    }

    #[test]
    fn empty_prefix_uses_bare_names() {
        let exporter = PrometheusTextExporter::new("", Vec::new());
        exporter.export(&WeakCacheMetricsSnapshot::default());
        let text = String::from_utf8(exporter.into_inner()).unwrap();
        assert!(text.contains("\nget_calls_total 0\n") || text.starts_with("# TYPE get_calls_total"));
    }
}
