use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Fixed-width landmark snapshot for a single tick.
///
/// Values are shared behind an `Arc` so sliding-window snapshots can be
/// taken on every tick without copying coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Capture order, monotonically increasing per normalizer
    sequence_id: u64,

    /// Number of hands that contributed coordinates (0 for placeholders)
    hands_detected: usize,

    values: Arc<[f32]>,
}

impl Frame {
    pub fn new(sequence_id: u64, values: Vec<f32>, hands_detected: usize) -> Self {
        Self {
            sequence_id,
            hands_detected,
            values: values.into(),
        }
    }

    /// Zero-filled frame standing in for a tick without a usable hand.
    pub fn placeholder(sequence_id: u64, width: usize) -> Self {
        Self::new(sequence_id, vec![0.0; width], 0)
    }

    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    pub fn hands_detected(&self) -> usize {
        self.hands_detected
    }

    pub fn is_placeholder(&self) -> bool {
        self.hands_detected == 0
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }
}

// On the wire a frame is just its coordinate row.
impl Serialize for Frame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.as_ref().serialize(serializer)
    }
}
