use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::buffers::SequenceBuffer;
use crate::config::{CaptureConfig, EmptyHandPolicy};
use crate::core::{CaptureError, DetectionResult, Frame, LandmarkNormalizer, Sequence};
use crate::observability::PipelineMetrics;
use crate::remote::{GestureService, UploadRequest};
use crate::resilience::{ErrorPolicy, ResilientService};
use super::state::CaptureState;

struct UploadCompletion {
    generation: u64,
    label: String,
    result: Result<Option<()>, CaptureError>,
}

/// Teach-flow orchestrator: label, countdown, record N frames, upload once.
///
/// All methods run synchronously on the frame loop. The upload itself is a
/// spawned task whose outcome is picked up by the next call to
/// [`Recorder::poll`] (which `on_frame` and `start` also do first).
pub struct Recorder {
    normalizer: LandmarkNormalizer,
    buffer: SequenceBuffer,
    state: CaptureState,
    label: String,
    last_error: Option<CaptureError>,
    last_frame_had_hand: bool,

    countdown_ticks: u32,
    countdown_tick: Duration,
    success_display: Duration,
    empty_hand_policy: EmptyHandPolicy,
    next_countdown_at: Option<Instant>,
    success_until: Option<Instant>,

    /// Bumped on cancel; completions from older generations are discarded
    generation: u64,
    service: ResilientService,
    completion_tx: mpsc::Sender<UploadCompletion>,
    completion_rx: mpsc::Receiver<UploadCompletion>,
    upload_task: Option<JoinHandle<()>>,
    metrics: Arc<PipelineMetrics>,
}

impl Recorder {
    pub fn new(config: &CaptureConfig, service: Arc<dyn GestureService>) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("Teach flow built from an invalid config: {:#}", e);
        }

        let metrics = Arc::new(PipelineMetrics::new("teach"));
        let (completion_tx, completion_rx) = mpsc::channel(4);

        Self {
            normalizer: LandmarkNormalizer::new(config.landmarks_per_hand, config.max_hands)
                .with_metrics(metrics.clone()),
            buffer: SequenceBuffer::new(config.sequence_length),
            state: CaptureState::Idle,
            label: String::new(),
            last_error: None,
            last_frame_had_hand: false,
            countdown_ticks: config.countdown_ticks,
            countdown_tick: config.countdown_tick(),
            success_display: config.success_display(),
            empty_hand_policy: config.empty_hand_policy,
            next_countdown_at: None,
            success_until: None,
            generation: 0,
            service: ResilientService::new(
                service,
                metrics.clone(),
                ErrorPolicy::Propagate,
                config.request_timeout(),
            ),
            completion_tx,
            completion_rx,
            upload_task: None,
            metrics,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Label of the current session; empty after a successful upload.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Error from the last failed attempt, cleared by the next successful start.
    pub fn last_error(&self) -> Option<&CaptureError> {
        self.last_error.as_ref()
    }

    /// `(captured, target)` for the recording progress bar.
    pub fn progress(&self) -> (usize, usize) {
        (self.buffer.len(), self.buffer.target_len())
    }

    /// True while an upload task is still running, including one left over
    /// from a cancelled session.
    pub fn is_upload_pending(&self) -> bool {
        self.upload_task
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.metrics.clone()
    }

    pub fn frame_width(&self) -> usize {
        self.normalizer.frame_width()
    }

    /// Begin a session for `label`.
    ///
    /// Rejected without side effects unless the recorder is idle and the
    /// label is non-empty.
    pub fn start(&mut self, label: &str, now: Instant) -> Result<(), CaptureError> {
        self.poll(now);

        if !self.state.is_idle() {
            return Err(CaptureError::Busy(self.state.name()));
        }

        // a cancelled upload still occupies the collaborator until it resolves
        if self.is_upload_pending() {
            return Err(CaptureError::Busy("uploading"));
        }

        let label = label.trim();
        if label.is_empty() {
            return Err(CaptureError::MissingLabel);
        }

        if self.empty_hand_policy == EmptyHandPolicy::RequireHandAtStart && !self.last_frame_had_hand {
            return Err(CaptureError::NoHandDetected);
        }

        self.buffer.reset();
        self.label = label.to_string();
        self.last_error = None;

        if self.countdown_ticks == 0 {
            self.begin_recording();
        } else {
            self.next_countdown_at = Some(now + self.countdown_tick);
            self.transition_to(CaptureState::Countdown {
                remaining: self.countdown_ticks,
            });
        }
        Ok(())
    }

    /// Feed one detector result. Always returns the normalized frame.
    pub fn on_frame(&mut self, detection: &DetectionResult, now: Instant) -> Frame {
        self.poll(now);

        let frame = self.normalizer.normalize(detection);
        self.last_frame_had_hand = !frame.is_placeholder();

        if let CaptureState::Recording { target, .. } = self.state {
            match self.buffer.push(frame.clone()) {
                Some(sequence) => self.finish_recording(sequence),
                None => {
                    self.state = CaptureState::Recording {
                        captured: self.buffer.len(),
                        target,
                    };
                }
            }
        }

        frame
    }

    /// Apply finished uploads, then elapsed-time transitions.
    pub fn poll(&mut self, now: Instant) {
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.apply_completion(completion, now);
        }
        self.advance_timers(now);
    }

    /// Wait until the pending upload resolves and apply it.
    ///
    /// Returns immediately when nothing is uploading.
    pub async fn wait_for_upload(&mut self) -> &CaptureState {
        while matches!(self.state, CaptureState::Uploading { .. }) {
            match self.completion_rx.recv().await {
                Some(completion) => self.apply_completion(completion, Instant::now()),
                None => break,
            }
        }
        &self.state
    }

    /// Abandon the current session. An in-flight upload may still reach the
    /// server, but its outcome is ignored here. The next [`Recorder::start`]
    /// is refused until that upload has resolved.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.buffer.reset();
        self.next_countdown_at = None;
        self.success_until = None;

        if !self.state.is_idle() {
            log::info!("Teach session cancelled in state {}", self.state.name());
            self.transition_to(CaptureState::Idle);
        }
    }

    fn begin_recording(&mut self) {
        self.next_countdown_at = None;
        self.transition_to(CaptureState::Recording {
            captured: 0,
            target: self.buffer.target_len(),
        });
    }

    fn finish_recording(&mut self, sequence: Sequence) {
        self.metrics.record_sequence_emitted();

        if self.empty_hand_policy == EmptyHandPolicy::RejectEmptySequence && sequence.is_all_placeholder() {
            log::warn!("Recorded sequence for '{}' has no detected hand, not uploading", self.label);
            self.buffer.reset();
            self.last_error = Some(CaptureError::EmptySequence);
            self.transition_to(CaptureState::Idle);
            return;
        }

        let label = self.label.clone();
        let request = UploadRequest::new(label.clone(), &sequence);
        let service = self.service.clone();
        let tx = self.completion_tx.clone();
        let generation = self.generation;

        log::info!("Uploading {} frames for '{}'", sequence.len(), label);
        self.transition_to(CaptureState::Uploading { label: label.clone() });

        self.upload_task = Some(tokio::spawn(async move {
            let result = service.upload(request).await;
            let _ = tx
                .send(UploadCompletion {
                    generation,
                    label,
                    result,
                })
                .await;
        }));
    }

    fn apply_completion(&mut self, completion: UploadCompletion, now: Instant) {
        if completion.generation != self.generation || !matches!(self.state, CaptureState::Uploading { .. }) {
            log::debug!("Discarding upload result for '{}' from a cancelled session", completion.label);
            return;
        }

        self.upload_task = None;
        self.buffer.reset();

        match completion.result {
            Ok(_) => {
                log::info!("Upload for '{}' stored", completion.label);
                self.label.clear();
                self.success_until = Some(now + self.success_display);
                self.transition_to(CaptureState::Success {
                    label: completion.label,
                });
            }
            Err(e) => {
                self.last_error = Some(e);
                self.transition_to(CaptureState::Idle);
            }
        }
    }

    fn advance_timers(&mut self, now: Instant) {
        loop {
            let (remaining, due) = match (&self.state, self.next_countdown_at) {
                (CaptureState::Countdown { remaining }, Some(due)) if now >= due => (*remaining, due),
                _ => break,
            };

            let remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                self.begin_recording();
            } else {
                self.next_countdown_at = Some(due + self.countdown_tick);
                self.transition_to(CaptureState::Countdown { remaining });
            }
        }

        let success_elapsed = matches!(self.state, CaptureState::Success { .. })
            && self.success_until.map_or(false, |until| now >= until);
        if success_elapsed {
            self.success_until = None;
            self.transition_to(CaptureState::Idle);
        }
    }

    fn transition_to(&mut self, next: CaptureState) {
        if !self.state.can_transition_to(&next) {
            log::error!("Invalid teach transition: {} -> {}", self.state.name(), next.name());
            return;
        }
        if self.state.name() != next.name() {
            log::info!("Teach: {} -> {}", self.state.name(), next.name());
        }
        self.state = next;
    }
}
