use super::MetricsCollector;

pub struct PipelineMonitor {
    collector: MetricsCollector,
}

impl PipelineMonitor {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }

    pub fn generate_report(&self) -> String {
        let snapshot = self.collector.snapshot();

        if snapshot.is_empty() {
            return "No pipelines registered".to_string();
        }

        let mut ids: Vec<_> = snapshot.keys().cloned().collect();
        ids.sort();

        let mut report = String::from("=== Capture Metrics ===\n");
        for id in ids {
            let m = &snapshot[&id];
            report.push_str(&format!(
                "\n[{}]\n  Frames: {} received ({} without hand)\n  Sequences: {}\n  Dispatches: {} sent, {} throttled, {} stale\n  Errors: {}\n  Avg Latency: {}μs\n",
                id,
                m.frames_received,
                m.placeholder_frames,
                m.sequences_emitted,
                m.dispatches_sent,
                m.dispatches_throttled,
                m.stale_responses,
                if m.errors_count > 0 {
                    format!("{} error{}", m.errors_count, if m.errors_count == 1 { "" } else { "s" })
                } else {
                    "0 errors".to_string()
                },
                m.avg_latency_us
            ));
        }

        report
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }
}
