use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use gesturelab::config::CaptureConfig;
use gesturelab::engine::{ActiveView, CaptureRuntime, CaptureState, Predictor, Recorder};
use gesturelab::hal::mock::{wave_script, ScriptedSource};
use gesturelab::remote::{ClassificationResult, DatasetSummary, GestureService, MockGestureService};
use tokio::sync::broadcast;

/// Teach one gesture and then stream predictions, all against the in-memory
/// classifier.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = CaptureConfig {
        countdown_ticks: 1,
        countdown_tick_ms: 200,
        success_display_ms: 300,
        ..CaptureConfig::default()
    };

    let mock = MockGestureService::new()
        .with_upload_reply(Duration::from_millis(150), Ok(()))
        .with_default_prediction(ClassificationResult::new("wave", 0.92));
    let service: Arc<dyn GestureService> = Arc::new(mock.clone());

    // Teach
    let script = wave_script(config.sequence_length * 3, config.landmarks_per_hand, 7);
    let source = ScriptedSource::periodic(script, Duration::from_millis(16));
    let mut runtime = CaptureRuntime::new(
        Box::new(source),
        ActiveView::Teach(Recorder::new(&config, service.clone())),
    );
    runtime.start().await?;

    if let Some(recorder) = runtime.recorder_mut() {
        recorder.start("wave", tokio::time::Instant::now())?;
    }

    while runtime.step().await? {
        let done = runtime
            .recorder_mut()
            .map(|r| matches!(r.state(), CaptureState::Success { .. }))
            .unwrap_or(true);
        if done {
            break;
        }
    }
    log::info!("Uploaded {} sequence(s)", mock.upload_count());

    // Predict
    let predictor = Predictor::new(&config, service.clone());
    runtime.switch_view(ActiveView::Predict(predictor));

    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    runtime.run(shutdown_rx).await?;

    if let Some(predictor) = runtime.predictor_mut() {
        predictor.wait_for_response().await;
        if let Some(result) = predictor.result() {
            log::info!("Prediction: {} ({}%)", result.label, result.confidence_percent());
        }
    }
    runtime.shutdown().await?;

    let summary = DatasetSummary::fetch(service.as_ref()).await?;
    log::info!("Stored examples for 'wave': {}", summary.count("wave"));
    println!("{}", runtime.monitor().generate_report());
    Ok(())
}
