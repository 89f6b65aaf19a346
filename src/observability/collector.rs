use std::collections::HashMap;
use std::sync::Arc;
use serde::Serialize;
use super::PipelineMetrics;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub pipeline_id: String,
    pub frames_received: u64,
    pub placeholder_frames: u64,
    pub sequences_emitted: u64,
    pub dispatches_sent: u64,
    pub dispatches_throttled: u64,
    pub stale_responses: u64,
    pub errors_count: u64,
    pub avg_latency_us: u64,
}

impl MetricsSnapshot {
    fn of(metrics: &PipelineMetrics) -> Self {
        Self {
            pipeline_id: metrics.pipeline_id().to_string(),
            frames_received: metrics.frames_received(),
            placeholder_frames: metrics.placeholder_frames(),
            sequences_emitted: metrics.sequences_emitted(),
            dispatches_sent: metrics.dispatches_sent(),
            dispatches_throttled: metrics.dispatches_throttled(),
            stale_responses: metrics.stale_responses(),
            errors_count: metrics.errors_count(),
            avg_latency_us: metrics.avg_latency_us(),
        }
    }
}

#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: HashMap<String, Arc<PipelineMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: HashMap::new(),
        }
    }

    /// Register under the metrics' own pipeline id, replacing any previous entry.
    pub fn register(&mut self, metrics: Arc<PipelineMetrics>) {
        self.metrics.insert(metrics.pipeline_id().to_string(), metrics);
    }

    pub fn snapshot(&self) -> HashMap<String, MetricsSnapshot> {
        self.metrics
            .iter()
            .map(|(id, metrics)| (id.clone(), MetricsSnapshot::of(metrics)))
            .collect()
    }

    pub fn get(&self, pipeline_id: &str) -> Option<Arc<PipelineMetrics>> {
        self.metrics.get(pipeline_id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
