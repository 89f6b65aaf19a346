use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use gesturelab::config::CaptureConfig;
use gesturelab::engine::{ActiveView, CaptureRuntime, Predictor};
use gesturelab::hal::mock::{wave_script, ScriptedSource};
use gesturelab::remote::{check_backend, BackendStatus, DatasetSummary, GestureService, HttpGestureService};
use tokio::sync::broadcast;

const DEFAULT_CONFIG_PATH: &str = "gesturelab.json";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = CaptureConfig::load(&config_path).await?;
    log::info!("Using backend {}", config.api_url);

    let service: Arc<dyn GestureService> = Arc::new(HttpGestureService::new(&config));

    if check_backend(service.as_ref()).await == BackendStatus::Offline {
        log::error!("Backend at {} is offline", config.api_url);
        return Ok(());
    }

    match DatasetSummary::fetch(service.as_ref()).await {
        Ok(summary) => {
            log::info!("Dataset holds {} examples", summary.total());
            for (label, count) in summary.labels() {
                log::info!("  {}: {}", label, count);
            }
        }
        Err(e) => log::warn!("Could not list dataset: {:#}", e),
    }

    // No camera here: stream a synthetic wave at ~60 Hz into the predictor.
    let script = wave_script(config.sequence_length * 4, config.landmarks_per_hand, 0);
    let source = ScriptedSource::periodic(script, Duration::from_millis(16));
    let predictor = Predictor::new(&config, service.clone());
    let mut runtime = CaptureRuntime::new(Box::new(source), ActiveView::Predict(predictor));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    runtime.start().await?;
    let ticks = runtime.run(shutdown_rx).await?;

    if let Some(predictor) = runtime.predictor_mut() {
        predictor.wait_for_response().await;
        match predictor.result() {
            Some(result) => log::info!(
                "Last prediction: {} ({}%)",
                result.label,
                result.confidence_percent()
            ),
            None => log::info!("No prediction received"),
        }
    }

    runtime.shutdown().await?;
    log::info!("Processed {} ticks\n{}", ticks, runtime.monitor().generate_report());
    Ok(())
}
