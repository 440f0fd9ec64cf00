/*!
# Telemetry

Counters and gauges for the optimization pipeline: cache hit rates, vectors
pruned, batches compressed.
*/

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct TelemetrySystem {
    counters: HashMap<String, f64>,
    gauges: HashMap<String, f64>,
}

impl TelemetrySystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_counter(&mut self, name: &str, value: f64) {
        *self.counters.entry(name.to_string()).or_insert(0.0) += value;
    }

    pub fn record_gauge(&mut self, name: &str, value: f64) {
        self.gauges.insert(name.to_string(), value);
    }

    pub fn counter(&self, name: &str) -> f64 {
        self.counters.get(name).copied().unwrap_or(0.0)
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges.get(name).copied()
    }

    /// All metrics as JSON, keys sorted.
    pub fn snapshot(&self) -> serde_json::Value {
        let to_map = |metrics: &HashMap<String, f64>| {
            metrics
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::json!(v)))
                .collect::<serde_json::Map<_, _>>()
        };
        serde_json::json!({
            "counters": to_map(&self.counters),
            "gauges": to_map(&self.gauges),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate_gauges_overwrite() {
        let mut telemetry = TelemetrySystem::new();
        telemetry.record_counter("prune.dropped", 3.0);
        telemetry.record_counter("prune.dropped", 2.0);
        telemetry.record_gauge("cache.hit_rate", 0.5);
        telemetry.record_gauge("cache.hit_rate", 0.75);

        assert_eq!(telemetry.counter("prune.dropped"), 5.0);
        assert_eq!(telemetry.counter("never.recorded"), 0.0);
        assert_eq!(telemetry.gauge("cache.hit_rate"), Some(0.75));
    }

    #[test]
    fn test_snapshot_lists_both_kinds() {
        let mut telemetry = TelemetrySystem::new();
        telemetry.record_counter("compress.batches", 1.0);
        telemetry.record_gauge("compress.ratio", 4.0);

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot["counters"]["compress.batches"], 1.0);
        assert_eq!(snapshot["gauges"]["compress.ratio"], 4.0);
    }
}
