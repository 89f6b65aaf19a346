use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::core::DetectionResult;
use crate::hal::{DetectionSource, Tick};
use crate::observability::{MetricsCollector, PipelineMonitor};
use super::{Predictor, Recorder};

/// Runtime status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeStatus {
    Stopped,
    Running,
    Error,
}

/// The pipeline currently consuming frames.
pub enum ActiveView {
    Teach(Recorder),
    Predict(Predictor),
}

impl ActiveView {
    pub fn name(&self) -> &'static str {
        match self {
            ActiveView::Teach(_) => "teach",
            ActiveView::Predict(_) => "predict",
        }
    }

    fn on_frame(&mut self, detection: &DetectionResult, now: Instant) {
        match self {
            ActiveView::Teach(recorder) => {
                recorder.on_frame(detection, now);
            }
            ActiveView::Predict(predictor) => {
                predictor.on_frame(detection, now);
            }
        }
    }

    fn poll(&mut self, now: Instant) {
        match self {
            ActiveView::Teach(recorder) => recorder.poll(now),
            ActiveView::Predict(predictor) => predictor.poll(),
        }
    }

    fn teardown(&mut self) {
        match self {
            ActiveView::Teach(recorder) => recorder.cancel(),
            ActiveView::Predict(predictor) => predictor.stop(),
        }
    }

    fn register_metrics(&self, collector: &mut MetricsCollector) {
        let metrics = match self {
            ActiveView::Teach(recorder) => recorder.metrics(),
            ActiveView::Predict(predictor) => predictor.metrics(),
        };
        collector.register(metrics);
    }
}

/// Drives one detection source into the active view.
///
/// Every tick is handled to completion before the next one is awaited, so
/// the view is only ever touched from this loop.
pub struct CaptureRuntime {
    source: Box<dyn DetectionSource>,
    view: ActiveView,
    status: RuntimeStatus,
    collector: MetricsCollector,
    ticks: u64,
}

impl CaptureRuntime {
    pub fn new(source: Box<dyn DetectionSource>, view: ActiveView) -> Self {
        let mut collector = MetricsCollector::new();
        view.register_metrics(&mut collector);

        Self {
            source,
            view,
            status: RuntimeStatus::Stopped,
            collector,
            ticks: 0,
        }
    }

    pub fn status(&self) -> RuntimeStatus {
        self.status
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn view(&self) -> &ActiveView {
        &self.view
    }

    pub fn recorder_mut(&mut self) -> Option<&mut Recorder> {
        match &mut self.view {
            ActiveView::Teach(recorder) => Some(recorder),
            _ => None,
        }
    }

    pub fn predictor(&self) -> Option<&Predictor> {
        match &self.view {
            ActiveView::Predict(predictor) => Some(predictor),
            _ => None,
        }
    }

    pub fn predictor_mut(&mut self) -> Option<&mut Predictor> {
        match &mut self.view {
            ActiveView::Predict(predictor) => Some(predictor),
            _ => None,
        }
    }

    /// Replace the active view. The old one is torn down first, so its
    /// pending requests can no longer change any state.
    pub fn switch_view(&mut self, view: ActiveView) -> ActiveView {
        log::info!("Switching view: {} -> {}", self.view.name(), view.name());
        view.register_metrics(&mut self.collector);
        let mut previous = std::mem::replace(&mut self.view, view);
        previous.teardown();
        previous
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.status == RuntimeStatus::Running {
            return Err(anyhow!("Runtime is already running"));
        }

        if let Err(e) = self.source.start().await {
            self.status = RuntimeStatus::Error;
            return Err(e);
        }

        self.status = RuntimeStatus::Running;
        Ok(())
    }

    /// Process a single tick. Returns `false` once the source has ended.
    pub async fn step(&mut self) -> Result<bool> {
        if self.status != RuntimeStatus::Running {
            return Err(anyhow!("Runtime not running"));
        }

        let tick = match self.source.next_tick().await {
            Ok(tick) => tick,
            Err(e) => {
                self.status = RuntimeStatus::Error;
                return Err(e);
            }
        };

        let now = Instant::now();
        match tick {
            Tick::Detection(detection) => self.view.on_frame(&detection, now),
            Tick::NotReady => self.view.poll(now),
            Tick::Ended => return Ok(false),
        }

        self.ticks += 1;
        Ok(true)
    }

    /// Run until the source ends or `shutdown` fires. Returns ticks processed.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) -> Result<u64> {
        let start_ticks = self.ticks;

        loop {
            let more = tokio::select! {
                _ = shutdown.recv() => None,
                more = self.step() => Some(more?),
            };

            match more {
                Some(true) => {}
                Some(false) => {
                    log::info!("Detection source ended");
                    break;
                }
                None => {
                    log::info!("Shutdown requested after {} ticks", self.ticks - start_ticks);
                    break;
                }
            }
        }

        Ok(self.ticks - start_ticks)
    }

    /// Stop the source and tear down the active view.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.status == RuntimeStatus::Stopped {
            return Ok(());
        }

        // a source that closed itself needs no stop
        if self.source.is_streaming() {
            if let Err(e) = self.source.stop().await {
                log::warn!("Failed to stop detection source: {}", e);
            }
        }

        self.view.teardown();
        self.status = RuntimeStatus::Stopped;
        Ok(())
    }

    pub fn monitor(&self) -> PipelineMonitor {
        PipelineMonitor::new(self.collector.clone())
    }
}
