use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::core::DetectionResult;
use crate::hal::{DetectionSource, SourceState, Tick};

#[derive(Debug, Clone)]
enum TickMode {
    Periodic { period: Duration },
    Manual,
}

/// Pending manual ticks a source will hold before triggers are refused
pub const MANUAL_QUEUE_DEPTH: usize = 64;

/// Handle that advances a manual [`ScriptedSource`] by one tick.
#[derive(Clone)]
pub struct ManualTrigger {
    tx: mpsc::Sender<()>,
}

impl ManualTrigger {
    /// Queue one tick. Returns `false` when [`MANUAL_QUEUE_DEPTH`] ticks are
    /// already pending or the source is gone; the tick is then dropped.
    pub fn trigger(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

/// Detection source replaying a fixed script.
///
/// Periodic mode ticks at a fixed rate like a display refresh; manual mode
/// ticks only when a [`ManualTrigger`] fires. Without looping the source
/// reports [`Tick::Ended`] once the script is used up.
pub struct ScriptedSource {
    state: SourceState,
    mode: TickMode,
    script: Vec<DetectionResult>,
    cursor: usize,
    looping: bool,
    ticker: Option<Interval>,
    manual_tx: mpsc::Sender<()>,
    manual_rx: mpsc::Receiver<()>,
}

impl ScriptedSource {
    fn with_mode(script: Vec<DetectionResult>, mode: TickMode) -> Self {
        let (manual_tx, manual_rx) = mpsc::channel(MANUAL_QUEUE_DEPTH);
        Self {
            state: SourceState::Unopened,
            mode,
            script,
            cursor: 0,
            looping: false,
            ticker: None,
            manual_tx,
            manual_rx,
        }
    }

    pub fn periodic(script: Vec<DetectionResult>, period: Duration) -> Self {
        Self::with_mode(script, TickMode::Periodic { period })
    }

    pub fn manual(script: Vec<DetectionResult>) -> Self {
        Self::with_mode(script, TickMode::Manual)
    }

    /// Restart from the top instead of ending.
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    pub fn trigger_handle(&self) -> ManualTrigger {
        ManualTrigger {
            tx: self.manual_tx.clone(),
        }
    }
}

#[async_trait]
impl DetectionSource for ScriptedSource {
    async fn start(&mut self) -> Result<()> {
        if self.state == SourceState::Running {
            return Err(anyhow!("Source already running"));
        }

        if let TickMode::Periodic { period } = self.mode {
            let mut ticker = interval(period);
            // a slow consumer drops ticks, like a busy render loop
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            self.ticker = Some(ticker);
        }

        self.state = SourceState::Running;
        Ok(())
    }

    async fn next_tick(&mut self) -> Result<Tick> {
        if self.state != SourceState::Running {
            return Err(anyhow!("Source not running ({:?})", self.state));
        }

        match self.mode {
            TickMode::Periodic { .. } => {
                if let Some(ticker) = &mut self.ticker {
                    ticker.tick().await;
                }
            }
            TickMode::Manual => {
                if self.manual_rx.recv().await.is_none() {
                    return Ok(Tick::Ended);
                }
            }
        }

        if self.cursor >= self.script.len() {
            if !self.looping || self.script.is_empty() {
                return Ok(Tick::Ended);
            }
            self.cursor = 0;
        }

        let detection = self.script[self.cursor].clone();
        self.cursor += 1;
        Ok(Tick::Detection(detection))
    }

    async fn stop(&mut self) -> Result<()> {
        if self.state != SourceState::Running {
            return Ok(());
        }
        self.ticker = None;
        self.state = SourceState::Stopped;
        Ok(())
    }

    fn state(&self) -> &SourceState {
        &self.state
    }
}
