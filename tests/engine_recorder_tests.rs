use anyhow::Result;
use async_trait::async_trait;
use gesturelab::config::CaptureConfig;
use gesturelab::core::{CaptureError, DetectionResult};
use gesturelab::engine::{CaptureState, Recorder};
use gesturelab::hal::mock::open_hand;
use gesturelab::remote::{
    ClassificationResult, DatasetRecord, GestureService, MockGestureService, PredictRequest,
    SequenceField, UploadRequest,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

fn config(overrides: Value) -> CaptureConfig {
    let mut base = json!({
        "max_hands": 1,
        "countdown_ticks": 0
    });
    if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
        for (k, v) in overrides {
            base.insert(k.clone(), v.clone());
        }
    }
    CaptureConfig::from_json(base).unwrap()
}

/// Storage that tracks how many uploads are running at once.
#[derive(Default)]
struct ConcurrencyTracker {
    live: AtomicUsize,
    peak: AtomicUsize,
    started: AtomicUsize,
}

#[async_trait]
impl GestureService for ConcurrencyTracker {
    async fn upload(&self, _request: UploadRequest) -> Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(live, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(1)).await;
        self.live.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn predict(&self, _request: PredictRequest) -> Result<ClassificationResult> {
        Ok(ClassificationResult::new("unknown", 0.0))
    }

    async fn dataset(&self) -> Result<Vec<DatasetRecord>> {
        Ok(Vec::new())
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

fn with_hand() -> DetectionResult {
    DetectionResult::with_hands(vec![open_hand(21, 0.5, 0.7)])
}

fn recorder(config: &CaptureConfig, mock: &MockGestureService) -> Recorder {
    Recorder::new(config, Arc::new(mock.clone()))
}

/// Feed `count` frames spaced one display tick apart.
fn feed(recorder: &mut Recorder, detection: &DetectionResult, count: usize) {
    let base = Instant::now();
    for i in 0..count {
        recorder.on_frame(detection, base + Duration::from_millis(16 * i as u64));
    }
}

#[tokio::test(start_paused = true)]
async fn test_teach_uploads_sixty_frames_once() {
    let mock = MockGestureService::new();
    let config = config(json!({}));
    let mut recorder = recorder(&config, &mock);

    assert_ok!(recorder.start("ปวดหัว", Instant::now()));
    assert_eq!(
        *recorder.state(),
        CaptureState::Recording {
            captured: 0,
            target: 60
        }
    );

    feed(&mut recorder, &with_hand(), 60);
    assert_eq!(
        *recorder.state(),
        CaptureState::Uploading {
            label: "ปวดหัว".to_string()
        }
    );

    let state = recorder.wait_for_upload().await.clone();
    assert_eq!(
        state,
        CaptureState::Success {
            label: "ปวดหัว".to_string()
        }
    );

    let uploads = mock.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].label, "ปวดหัว");
    assert_eq!(uploads[0].sequence.len(), 60);
    assert!(uploads[0].sequence.iter().all(|row| row.len() == 63));

    let body = uploads[0].to_json(SequenceField::Sequence);
    assert_eq!(body["label"], "ปวดหัว");
    assert_eq!(body["sequence"].as_array().map(|rows| rows.len()), Some(60));

    // label is cleared for the next take
    assert_eq!(recorder.label(), "");
}

#[tokio::test(start_paused = true)]
async fn test_extra_frames_do_not_duplicate_upload() {
    let mock = MockGestureService::new();
    let config = config(json!({}));
    let mut recorder = recorder(&config, &mock);

    assert_ok!(recorder.start("wave", Instant::now()));
    feed(&mut recorder, &with_hand(), 75);
    recorder.wait_for_upload().await;

    feed(&mut recorder, &with_hand(), 30);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(mock.upload_count(), 1);
    assert_eq!(recorder.metrics().sequences_emitted(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_requires_label() {
    let mock = MockGestureService::new();
    let config = config(json!({}));
    let mut recorder = recorder(&config, &mock);

    let err = recorder.start("", Instant::now()).unwrap_err();
    assert_eq!(err, CaptureError::MissingLabel);
    assert!(err.is_validation());
    assert!(!err.is_transient());
    assert_eq!(recorder.start("   ", Instant::now()), Err(CaptureError::MissingLabel));
    assert!(recorder.state().is_idle());
    assert_eq!(recorder.progress(), (0, 60));
}

#[tokio::test(start_paused = true)]
async fn test_label_is_trimmed() {
    let mock = MockGestureService::new();
    let config = config(json!({}));
    let mut recorder = recorder(&config, &mock);

    assert_ok!(recorder.start("  hello ", Instant::now()));
    assert_eq!(recorder.label(), "hello");
}

#[tokio::test(start_paused = true)]
async fn test_countdown_ticks_before_recording() {
    let mock = MockGestureService::new();
    let config = config(json!({"countdown_ticks": 3}));
    let mut recorder = recorder(&config, &mock);
    let t0 = Instant::now();

    assert_ok!(recorder.start("wave", t0));
    assert_eq!(*recorder.state(), CaptureState::Countdown { remaining: 3 });

    // frames during the countdown are not captured
    recorder.on_frame(&with_hand(), t0 + Duration::from_millis(500));
    assert_eq!(recorder.progress(), (0, 60));

    recorder.poll(t0 + Duration::from_millis(999));
    assert_eq!(*recorder.state(), CaptureState::Countdown { remaining: 3 });

    recorder.poll(t0 + Duration::from_millis(1000));
    assert_eq!(*recorder.state(), CaptureState::Countdown { remaining: 2 });

    // a late poll catches up on every elapsed tick
    recorder.poll(t0 + Duration::from_millis(3100));
    assert_eq!(
        *recorder.state(),
        CaptureState::Recording {
            captured: 0,
            target: 60
        }
    );

    recorder.on_frame(&with_hand(), t0 + Duration::from_millis(3116));
    assert_eq!(recorder.progress(), (1, 60));
}

#[tokio::test(start_paused = true)]
async fn test_start_is_rejected_while_busy() {
    let mock = MockGestureService::new().with_upload_reply(Duration::from_millis(500), Ok(()));
    let config = config(json!({"countdown_ticks": 3}));
    let mut recorder = recorder(&config, &mock);
    let t0 = Instant::now();

    assert_ok!(recorder.start("one", t0));
    assert_eq!(recorder.start("two", t0), Err(CaptureError::Busy("countdown")));

    recorder.poll(t0 + Duration::from_secs(3));
    assert_eq!(recorder.start("two", t0), Err(CaptureError::Busy("recording")));

    feed(&mut recorder, &with_hand(), 60);
    assert_eq!(
        recorder.start("two", Instant::now()),
        Err(CaptureError::Busy("uploading"))
    );
    assert_eq!(recorder.label(), "one");

    recorder.wait_for_upload().await;
    assert_eq!(mock.upload_count(), 1);
    assert_eq!(mock.uploads()[0].label, "one");
}

#[tokio::test(start_paused = true)]
async fn test_success_returns_to_idle_after_display() {
    let mock = MockGestureService::new();
    let config = config(json!({}));
    let mut recorder = recorder(&config, &mock);

    assert_ok!(recorder.start("wave", Instant::now()));
    feed(&mut recorder, &with_hand(), 60);
    recorder.wait_for_upload().await;
    let done = Instant::now();

    recorder.poll(done + Duration::from_millis(1999));
    assert!(matches!(recorder.state(), CaptureState::Success { .. }));

    recorder.poll(done + Duration::from_millis(2000));
    assert!(recorder.state().is_idle());
    assert!(recorder.last_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_upload_failure_keeps_label_and_returns_to_idle() {
    let mock = MockGestureService::new()
        .with_upload_reply(Duration::from_millis(20), Err("storage full".to_string()));
    let config = config(json!({}));
    let mut recorder = recorder(&config, &mock);

    assert_ok!(recorder.start("wave", Instant::now()));
    feed(&mut recorder, &with_hand(), 60);

    let state = recorder.wait_for_upload().await.clone();
    assert!(state.is_idle());

    let error = recorder.last_error().cloned().unwrap();
    assert!(error.is_transient());
    assert!(error.to_string().contains("storage full"));
    assert_eq!(recorder.label(), "wave");
    assert_eq!(recorder.progress(), (0, 60));
    assert_eq!(recorder.metrics().errors_count(), 1);

    // retry goes through with the same label
    let label = recorder.label().to_string();
    assert_ok!(recorder.start(&label, Instant::now()));
    assert!(recorder.last_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_upload_timeout_surfaces_as_timeout() {
    let mock = MockGestureService::new().with_upload_reply(Duration::from_secs(30), Ok(()));
    let config = config(json!({"request_timeout_ms": 1000}));
    let mut recorder = recorder(&config, &mock);

    assert_ok!(recorder.start("wave", Instant::now()));
    feed(&mut recorder, &with_hand(), 60);
    recorder.wait_for_upload().await;

    assert!(recorder.state().is_idle());
    assert_eq!(
        recorder.last_error(),
        Some(&CaptureError::Timeout(Duration::from_secs(1)))
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_sequence_is_uploaded_by_default() {
    let mock = MockGestureService::new();
    let config = config(json!({}));
    let mut recorder = recorder(&config, &mock);

    assert_ok!(recorder.start("nothing", Instant::now()));
    feed(&mut recorder, &DetectionResult::empty(), 60);
    recorder.wait_for_upload().await;

    let uploads = mock.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].sequence.len(), 60);
    assert!(uploads[0]
        .sequence
        .iter()
        .all(|row| row.len() == 63 && row.iter().all(|v| *v == 0.0)));
    assert_eq!(recorder.metrics().placeholder_frames(), 60);
}

#[tokio::test(start_paused = true)]
async fn test_require_hand_at_start() {
    let mock = MockGestureService::new();
    let config = config(json!({"empty_hand_policy": "require_hand_at_start"}));
    let mut recorder = recorder(&config, &mock);

    assert_eq!(recorder.start("wave", Instant::now()), Err(CaptureError::NoHandDetected));

    recorder.on_frame(&DetectionResult::empty(), Instant::now());
    assert_err!(recorder.start("wave", Instant::now()));

    recorder.on_frame(&with_hand(), Instant::now());
    assert_ok!(recorder.start("wave", Instant::now()));
}

#[tokio::test(start_paused = true)]
async fn test_reject_empty_sequence_skips_upload() {
    let mock = MockGestureService::new();
    let config = config(json!({"empty_hand_policy": "reject_empty_sequence"}));
    let mut recorder = recorder(&config, &mock);

    assert_ok!(recorder.start("nothing", Instant::now()));
    feed(&mut recorder, &DetectionResult::empty(), 60);

    assert!(recorder.state().is_idle());
    assert_eq!(recorder.last_error(), Some(&CaptureError::EmptySequence));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(mock.upload_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_discards_pending_upload() {
    let mock = MockGestureService::new().with_upload_reply(Duration::from_millis(100), Ok(()));
    let config = config(json!({}));
    let mut recorder = recorder(&config, &mock);

    assert_ok!(recorder.start("wave", Instant::now()));
    feed(&mut recorder, &with_hand(), 60);
    assert!(matches!(recorder.state(), CaptureState::Uploading { .. }));

    recorder.cancel();
    assert!(recorder.state().is_idle());

    tokio::time::sleep(Duration::from_millis(200)).await;
    recorder.poll(Instant::now());

    // the request still reached the server, but the result changed nothing
    assert_eq!(mock.upload_count(), 1);
    assert!(recorder.state().is_idle());
    assert!(recorder.last_error().is_none());
    assert_ok!(recorder.start("again", Instant::now()));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_countdown() {
    let mock = MockGestureService::new();
    let config = config(json!({"countdown_ticks": 3}));
    let mut recorder = recorder(&config, &mock);
    let t0 = Instant::now();

    assert_ok!(recorder.start("wave", t0));
    recorder.cancel();
    recorder.poll(t0 + Duration::from_secs(10));

    assert!(recorder.state().is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_upload_blocks_next_start_until_resolved() {
    let tracker = Arc::new(ConcurrencyTracker::default());
    let config = config(json!({}));
    let mut recorder = Recorder::new(&config, tracker.clone());

    assert_ok!(recorder.start("a", Instant::now()));
    feed(&mut recorder, &with_hand(), 60);
    recorder.cancel();
    assert!(recorder.state().is_idle());

    // let the abandoned upload reach the server
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(recorder.is_upload_pending());
    assert_eq!(
        recorder.start("b", Instant::now()),
        Err(CaptureError::Busy("uploading"))
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!recorder.is_upload_pending());
    assert_ok!(recorder.start("b", Instant::now()));
    feed(&mut recorder, &with_hand(), 60);
    recorder.wait_for_upload().await;

    assert_eq!(tracker.started.load(Ordering::SeqCst), 2);
    assert_eq!(tracker.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_sequence_length_does_not_hang_recording() {
    let mock = MockGestureService::new();
    let config = CaptureConfig {
        sequence_length: 0,
        max_hands: 1,
        countdown_ticks: 0,
        ..CaptureConfig::default()
    };
    let mut recorder = recorder(&config, &mock);

    assert_ok!(recorder.start("wave", Instant::now()));
    recorder.on_frame(&with_hand(), Instant::now());
    assert!(matches!(recorder.state(), CaptureState::Uploading { .. }));

    let state = recorder.wait_for_upload().await.clone();
    assert!(matches!(state, CaptureState::Success { .. }));
    assert_eq!(mock.uploads()[0].sequence.len(), 1);
}
