use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::core::normalizer::COORDS_PER_LANDMARK;
use crate::remote::SequenceField;

/// What to do with recordings that never saw a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmptyHandPolicy {
    /// All-zero sequences are uploaded like any other
    #[default]
    Allow,
    /// Refuse to start recording unless the latest frame contained a hand
    RequireHandAtStart,
    /// Record normally but refuse to upload a sequence with no hand in it
    RejectEmptySequence,
}

/// Shape of the prediction query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PredictInput {
    /// Sliding window of `sequence_length` frames
    #[default]
    Window,
    /// Latest frame only, sent as `points`
    SingleFrame,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub upload: String,
    pub predict: String,
    pub predict_frame: String,
    pub dataset: String,
    pub health: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            upload: "/upload_sequence".to_string(),
            predict: "/predict_sequence".to_string(),
            predict_frame: "/predict".to_string(),
            dataset: "/dataset".to_string(),
            health: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum spacing between dispatch starts; `None` disables the time gate
    pub min_interval_ms: Option<u64>,
    /// Refuse to dispatch while a previous request is unresolved
    pub guard_in_flight: bool,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: Some(200),
            guard_in_flight: true,
        }
    }
}

/// Pipeline configuration, passed explicitly into every constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub api_url: String,
    pub endpoints: EndpointConfig,

    /// Frames per sequence (N)
    pub sequence_length: usize,
    /// Landmarks per hand (L)
    pub landmarks_per_hand: usize,
    /// Hands per frame (H)
    pub max_hands: usize,

    pub countdown_ticks: u32,
    pub countdown_tick_ms: u64,
    pub success_display_ms: u64,

    pub throttle: ThrottleConfig,
    pub request_timeout_ms: u64,

    pub empty_hand_policy: EmptyHandPolicy,
    pub predict_input: PredictInput,
    pub sequence_field: SequenceField,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".to_string(),
            endpoints: EndpointConfig::default(),
            sequence_length: 60,
            landmarks_per_hand: 21,
            max_hands: 2,
            countdown_ticks: 3,
            countdown_tick_ms: 1000,
            success_display_ms: 2000,
            throttle: ThrottleConfig::default(),
            request_timeout_ms: 10_000,
            empty_hand_policy: EmptyHandPolicy::default(),
            predict_input: PredictInput::default(),
            sequence_field: SequenceField::default(),
        }
    }
}

impl CaptureConfig {
    /// Build from a JSON value, filling missing fields with defaults.
    pub fn from_json(value: Value) -> Result<Self> {
        let config: CaptureConfig =
            serde_json::from_value(value).context("Failed to parse capture config")?;
        config.validate()?;
        Ok(config)
    }

    /// Read config from disk, writing the defaults first if the file is missing.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
            Self::default().save(path).await?;
            log::info!("Wrote default capture config to {:?}", path);
        }

        let content = fs::read_to_string(path)
            .await
            .context(format!("Failed to read config from {:?}", path))?;
        let value: Value =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        Self::from_json(value)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;

        // Write to temporary file first
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json)
            .await
            .context("Failed to write temporary config file")?;

        // Atomic rename
        fs::rename(&temp_path, path)
            .await
            .context("Failed to atomically update config file")?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            bail!("api_url must not be empty");
        }
        if self.sequence_length == 0 {
            bail!("sequence_length must be at least 1");
        }
        if self.landmarks_per_hand == 0 {
            bail!("landmarks_per_hand must be at least 1");
        }
        if self.max_hands == 0 {
            bail!("max_hands must be at least 1");
        }
        if self.countdown_ticks > 0 && self.countdown_tick_ms == 0 {
            bail!("countdown_tick_ms must be non-zero when a countdown is configured");
        }
        if self.request_timeout_ms == 0 {
            bail!("request_timeout_ms must be non-zero");
        }
        Ok(())
    }

    /// Width of every normalized frame: 3 x L x H.
    pub fn frame_width(&self) -> usize {
        COORDS_PER_LANDMARK * self.landmarks_per_hand * self.max_hands
    }

    /// Window capacity for the predict flow.
    pub fn window_length(&self) -> usize {
        match self.predict_input {
            PredictInput::Window => self.sequence_length,
            PredictInput::SingleFrame => 1,
        }
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    pub fn success_display(&self) -> Duration {
        Duration::from_millis(self.success_display_ms)
    }

    pub fn min_dispatch_interval(&self) -> Option<Duration> {
        self.throttle.min_interval_ms.map(Duration::from_millis)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }
}
