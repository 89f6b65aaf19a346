use serde::{Deserialize, Serialize};

/// Single detected 3D keypoint.
///
/// `x` and `y` are normalized to [0,1] image space, `z` is relative depth
/// and unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Output of the external hand detector for one tick.
///
/// Hands are kept in the order the detector reported them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub hands: Vec<Vec<Landmark>>,
}

impl DetectionResult {
    pub fn empty() -> Self {
        Self { hands: Vec::new() }
    }

    pub fn with_hands(hands: Vec<Vec<Landmark>>) -> Self {
        Self { hands }
    }

    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }

    pub fn has_hands(&self) -> bool {
        !self.hands.is_empty()
    }
}
