//! Prometheus metrics for minion observability.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::Arc;

#[derive(Clone)]
pub struct MinionMetrics {
    pub work_queue_depth: Gauge,
    pub active_batches: Gauge,
    pub batches_completed: Counter,
    pub registry: Arc<Registry>,
}

impl MinionMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let work_queue_depth = Gauge::default();
        registry.register(
            "hashcrack_minion_work_queue_depth",
            "Number of pending work units",
            work_queue_depth.clone(),
        );

        let active_batches = Gauge::default();
        registry.register(
            "hashcrack_minion_active_batches",
            "Number of batches currently being resolved",
            active_batches.clone(),
        );

        let batches_completed = Counter::default();
        registry.register(
            "hashcrack_minion_batches_completed_total",
            "Total batches resolved and acknowledged",
            batches_completed.clone(),
        );

        Self {
            work_queue_depth,
            active_batches,
            batches_completed,
            registry: Arc::new(registry),
        }
    }

    /// Encode all metrics as Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        encode(&mut buf, &self.registry).unwrap();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_all_metrics() {
        let metrics = MinionMetrics::new();
        let output = metrics.encode();

        assert!(output.contains("hashcrack_minion_work_queue_depth"));
        assert!(output.contains("hashcrack_minion_active_batches"));
        assert!(output.contains("hashcrack_minion_batches_completed_total"));
    }

    #[test]
    fn encode_produces_valid_prometheus_text() {
        let metrics = MinionMetrics::new();
        let output = metrics.encode();

        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
        assert!(output.contains("# TYPE hashcrack_minion_work_queue_depth gauge"));
        assert!(output.contains("# TYPE hashcrack_minion_batches_completed_total counter"));
    }

    #[test]
    fn gauge_set_reflected_in_encode() {
        let metrics = MinionMetrics::new();
        metrics.work_queue_depth.set(5);

        let output = metrics.encode();
        assert!(
            output.contains("hashcrack_minion_work_queue_depth 5"),
            "Expected gauge value 5 in output: {output}"
        );
    }

    #[test]
    fn counter_inc_reflected_in_encode() {
        let metrics = MinionMetrics::new();
        metrics.batches_completed.inc();
        metrics.batches_completed.inc();

        let output = metrics.encode();
        assert!(
            output.contains("hashcrack_minion_batches_completed_total_total 2"),
            "Expected counter value 2 in output: {output}"
        );
    }
}
