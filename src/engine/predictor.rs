use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::buffers::SequenceWindow;
use crate::config::{CaptureConfig, PredictInput};
use crate::core::{CaptureError, DetectionResult, LandmarkNormalizer, Sequence};
use crate::observability::PipelineMetrics;
use crate::remote::{ClassificationResult, GestureService, PredictRequest};
use crate::resilience::{ErrorPolicy, ResilientService};
use super::state::PredictState;
use super::throttle::{DispatchTicket, InferenceThrottle, Throttled};

struct PredictCompletion {
    generation: u64,
    seq: u64,
    result: Result<Option<ClassificationResult>, CaptureError>,
}

/// Predict-flow orchestrator: sliding window, throttled dispatch, latest result.
///
/// Responses are applied in dispatch order, not arrival order: a response
/// whose sequence number is older than the one on display is ignored.
pub struct Predictor {
    normalizer: LandmarkNormalizer,
    window: SequenceWindow,
    throttle: InferenceThrottle,
    state: PredictState,
    single_frame: bool,

    /// Sequence number and value of the result on display
    latest: Option<(u64, ClassificationResult)>,

    generation: u64,
    service: ResilientService,
    completion_tx: mpsc::Sender<PredictCompletion>,
    completion_rx: mpsc::Receiver<PredictCompletion>,
    metrics: Arc<PipelineMetrics>,
}

impl Predictor {
    pub fn new(config: &CaptureConfig, service: Arc<dyn GestureService>) -> Self {
        let metrics = Arc::new(PipelineMetrics::new("predict"));
        let (completion_tx, completion_rx) = mpsc::channel(32);
        let window = SequenceWindow::new(config.window_length());

        Self {
            normalizer: LandmarkNormalizer::new(config.landmarks_per_hand, config.max_hands)
                .with_metrics(metrics.clone()),
            state: PredictState::Filling {
                current: 0,
                target: window.capacity(),
            },
            window,
            throttle: InferenceThrottle::new(
                config.min_dispatch_interval(),
                config.throttle.guard_in_flight,
            ),
            single_frame: config.predict_input == PredictInput::SingleFrame,
            latest: None,
            generation: 0,
            service: ResilientService::new(
                service,
                metrics.clone(),
                ErrorPolicy::Drop,
                config.request_timeout(),
            ),
            completion_tx,
            completion_rx,
            metrics,
        }
    }

    pub fn state(&self) -> &PredictState {
        &self.state
    }

    /// Result currently on display.
    pub fn result(&self) -> Option<&ClassificationResult> {
        self.latest.as_ref().map(|(_, result)| result)
    }

    /// Sequence number of the dispatch that produced [`Predictor::result`].
    pub fn result_seq(&self) -> Option<u64> {
        self.latest.as_ref().map(|(seq, _)| *seq)
    }

    /// `(current, N)` for the "filling buffer" indicator.
    pub fn fill_progress(&self) -> (usize, usize) {
        self.window.fill_progress()
    }

    pub fn window(&self) -> &SequenceWindow {
        &self.window
    }

    pub fn in_flight(&self) -> usize {
        self.throttle.in_flight()
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.metrics.clone()
    }

    /// Feed one detector result.
    ///
    /// Returns the ticket of the classification request this frame started,
    /// if any. Frames always enter the window, throttled or not.
    pub fn on_frame(&mut self, detection: &DetectionResult, now: Instant) -> Option<DispatchTicket> {
        self.poll();

        if self.state == PredictState::Stopped {
            return None;
        }

        let frame = self.normalizer.normalize(detection);
        match self.window.push(frame) {
            None => {
                let (current, target) = self.window.fill_progress();
                self.transition_to(PredictState::Filling { current, target });
                None
            }
            Some(sequence) => {
                self.transition_to(PredictState::Streaming);
                self.dispatch(sequence, now)
            }
        }
    }

    /// Apply every response that has arrived since the last call.
    pub fn poll(&mut self) {
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.apply_completion(completion);
        }
    }

    /// Wait for the next response of the current session and apply it.
    ///
    /// Returns `false` when nothing is in flight.
    pub async fn wait_for_response(&mut self) -> bool {
        while self.throttle.in_flight() > 0 {
            match self.completion_rx.recv().await {
                Some(completion) => {
                    let current = completion.generation == self.generation;
                    self.apply_completion(completion);
                    if current {
                        return true;
                    }
                }
                None => break,
            }
        }
        false
    }

    /// Leave the predict view: stop consuming frames and ignore any response
    /// still on its way.
    pub fn stop(&mut self) {
        self.generation += 1;
        self.throttle.reset();
        self.window.clear();
        self.latest = None;
        if self.state != PredictState::Stopped {
            log::info!("Predict stream stopped");
            self.transition_to(PredictState::Stopped);
        }
    }

    /// Start filling a fresh window after [`Predictor::stop`].
    pub fn resume(&mut self) {
        if self.state == PredictState::Stopped {
            self.transition_to(PredictState::Filling {
                current: 0,
                target: self.window.capacity(),
            });
        }
    }

    fn dispatch(&mut self, sequence: Sequence, now: Instant) -> Option<DispatchTicket> {
        let ticket = match self.throttle.try_acquire(now) {
            Ok(ticket) => ticket,
            Err(reason) => {
                self.metrics.record_throttled();
                match reason {
                    Throttled::TooSoon { remaining } => {
                        log::trace!("Dispatch skipped, {}ms until next slot", remaining.as_millis())
                    }
                    Throttled::InFlight { seq } => {
                        log::trace!("Dispatch skipped, request #{} still in flight", seq)
                    }
                }
                return None;
            }
        };

        let request = PredictRequest::from_sequence(&sequence, self.single_frame);
        let service = self.service.clone();
        let tx = self.completion_tx.clone();
        let generation = self.generation;
        let seq = ticket.seq;

        log::debug!("Dispatching prediction #{}", seq);
        tokio::spawn(async move {
            let result = service.predict(request).await;
            let _ = tx
                .send(PredictCompletion {
                    generation,
                    seq,
                    result,
                })
                .await;
        });

        Some(ticket)
    }

    fn apply_completion(&mut self, completion: PredictCompletion) {
        if completion.generation != self.generation {
            log::debug!("Discarding response #{} from a stopped stream", completion.seq);
            return;
        }

        self.throttle.release(completion.seq);

        match completion.result {
            Ok(Some(result)) => {
                let newer = self
                    .latest
                    .as_ref()
                    .map_or(true, |(shown, _)| completion.seq > *shown);
                if newer {
                    log::debug!(
                        "Prediction #{}: {} ({}%)",
                        completion.seq,
                        result.label,
                        result.confidence_percent()
                    );
                    self.latest = Some((completion.seq, result));
                } else {
                    self.metrics.record_stale_response();
                    log::debug!("Ignoring stale response #{}", completion.seq);
                }
            }
            // failures keep the last good result on screen
            Ok(None) => {}
            Err(e) => log::debug!("Prediction #{} failed: {}", completion.seq, e),
        }
    }

    fn transition_to(&mut self, next: PredictState) {
        if !self.state.can_transition_to(&next) {
            log::error!("Invalid predict transition: {} -> {}", self.state.name(), next.name());
            return;
        }
        if self.state.name() != next.name() {
            log::info!("Predict: {} -> {}", self.state.name(), next.name());
        }
        self.state = next;
    }
}
