use serde::{Deserialize, Serialize};

/// Teach-flow states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CaptureState {
    Idle,
    Countdown { remaining: u32 },
    Recording { captured: usize, target: usize },
    Uploading { label: String },
    Success { label: String },
}

impl CaptureState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &CaptureState) -> bool {
        use CaptureState::*;

        matches!(
            (self, target),
            // From Idle
            (Idle, Countdown { .. }) |
            (Idle, Recording { .. }) |

            // From Countdown (tick, finish, cancel)
            (Countdown { .. }, Countdown { .. }) |
            (Countdown { .. }, Recording { .. }) |
            (Countdown { .. }, Idle) |

            // From Recording (frame, complete, cancel or rejected sequence)
            (Recording { .. }, Recording { .. }) |
            (Recording { .. }, Uploading { .. }) |
            (Recording { .. }, Idle) |

            // From Uploading
            (Uploading { .. }, Success { .. }) |
            (Uploading { .. }, Idle) |

            // From Success
            (Success { .. }, Idle)
        )
    }

    /// Get human-readable state name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Countdown { .. } => "countdown",
            Self::Recording { .. } => "recording",
            Self::Uploading { .. } => "uploading",
            Self::Success { .. } => "success",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl Default for CaptureState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Predict-flow states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PredictState {
    Filling { current: usize, target: usize },
    Streaming,
    Stopped,
}

impl PredictState {
    pub fn can_transition_to(&self, target: &PredictState) -> bool {
        use PredictState::*;

        matches!(
            (self, target),
            (Filling { .. }, Filling { .. }) |
            (Filling { .. }, Streaming) |
            (Streaming, Streaming) |
            (Filling { .. }, Stopped) |
            (Streaming, Stopped) |
            (Stopped, Filling { .. })
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Filling { .. } => "filling",
            Self::Streaming => "streaming",
            Self::Stopped => "stopped",
        }
    }
}
