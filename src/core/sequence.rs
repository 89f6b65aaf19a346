use super::{CaptureError, Frame};
use serde::Serialize;

/// Ordered run of exactly `N` frames, oldest first.
///
/// Only constructible through [`Sequence::new`], which checks the length and
/// that every frame shares the same width.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Sequence {
    frames: Vec<Frame>,
}

impl Sequence {
    pub fn new(frames: Vec<Frame>, expected_len: usize) -> Result<Self, CaptureError> {
        if frames.len() != expected_len {
            return Err(CaptureError::ShapeMismatch {
                expected: expected_len,
                actual: frames.len(),
            });
        }

        if let Some(first) = frames.first() {
            let width = first.width();
            if let Some(bad) = frames.iter().find(|f| f.width() != width) {
                return Err(CaptureError::ShapeMismatch {
                    expected: width,
                    actual: bad.width(),
                });
            }
        }

        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_width(&self) -> usize {
        self.frames.first().map(|f| f.width()).unwrap_or(0)
    }

    /// True when no frame in the sequence saw a hand.
    pub fn is_all_placeholder(&self) -> bool {
        self.frames.iter().all(|f| f.is_placeholder())
    }

    pub fn first_sequence_id(&self) -> Option<u64> {
        self.frames.first().map(|f| f.sequence_id())
    }

    pub fn last_sequence_id(&self) -> Option<u64> {
        self.frames.last().map(|f| f.sequence_id())
    }

    /// Coordinate rows in capture order, as sent to the classifier.
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.frames.iter().map(|f| f.values().to_vec()).collect()
    }
}
