use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters for one capture pipeline (teach or predict).
///
/// Shared between the orchestrator and its dispatch tasks, so every field
/// is atomic.
pub struct PipelineMetrics {
    pipeline_id: String,
    frames_received: AtomicU64,
    placeholder_frames: AtomicU64,
    sequences_emitted: AtomicU64,
    dispatches_sent: AtomicU64,
    dispatches_throttled: AtomicU64,
    stale_responses: AtomicU64,
    errors_count: AtomicU64,
    total_latency_us: AtomicU64,
    latency_samples: AtomicU64,
}

impl PipelineMetrics {
    pub fn new(pipeline_id: impl Into<String>) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            frames_received: AtomicU64::new(0),
            placeholder_frames: AtomicU64::new(0),
            sequences_emitted: AtomicU64::new(0),
            dispatches_sent: AtomicU64::new(0),
            dispatches_throttled: AtomicU64::new(0),
            stale_responses: AtomicU64::new(0),
            errors_count: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            latency_samples: AtomicU64::new(0),
        }
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    pub fn placeholder_frames(&self) -> u64 {
        self.placeholder_frames.load(Ordering::Relaxed)
    }

    pub fn sequences_emitted(&self) -> u64 {
        self.sequences_emitted.load(Ordering::Relaxed)
    }

    pub fn dispatches_sent(&self) -> u64 {
        self.dispatches_sent.load(Ordering::Relaxed)
    }

    pub fn dispatches_throttled(&self) -> u64 {
        self.dispatches_throttled.load(Ordering::Relaxed)
    }

    pub fn stale_responses(&self) -> u64 {
        self.stale_responses.load(Ordering::Relaxed)
    }

    pub fn errors_count(&self) -> u64 {
        self.errors_count.load(Ordering::Relaxed)
    }

    pub fn record_frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_placeholder_frame(&self) {
        self.placeholder_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sequence_emitted(&self) {
        self.sequences_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch(&self) {
        self.dispatches_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_throttled(&self) {
        self.dispatches_throttled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_response(&self) {
        self.stale_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_latency(&self, latency: Duration) {
        let latency_us = latency.as_micros() as u64;
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_us(&self) -> u64 {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_latency_us.load(Ordering::Relaxed) / samples
    }
}
