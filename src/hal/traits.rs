use anyhow::Result;
use async_trait::async_trait;
use crate::core::DetectionResult;

/// Lifecycle of a detection source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceState {
    Unopened,
    Running,
    Stopped,
    Error(String),
}

/// What the frame source produced on one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// Detector ran; zero or more hands
    Detection(DetectionResult),
    /// Tick elapsed but no image was ready for the detector
    NotReady,
    /// Source is exhausted or was closed
    Ended,
}

/// Camera plus hand detector, seen from the pipeline.
///
/// One call to `next_tick` corresponds to one rendering tick.
#[async_trait]
pub trait DetectionSource: Send {
    async fn start(&mut self) -> Result<()>;

    /// Wait for the next tick
    async fn next_tick(&mut self) -> Result<Tick>;

    async fn stop(&mut self) -> Result<()>;

    fn state(&self) -> &SourceState;

    fn is_streaming(&self) -> bool {
        *self.state() == SourceState::Running
    }
}
