use super::{CaptureError, DetectionResult, Frame};
use std::sync::Arc;
use crate::observability::PipelineMetrics;

/// Coordinates per landmark (x, y, z)
pub const COORDS_PER_LANDMARK: usize = 3;

/// Turns raw detector output into fixed-width frames.
///
/// Every call yields a frame of width `3 * landmarks_per_hand * max_hands`.
/// Ticks without a usable hand become zero-filled placeholders so sequence
/// length and per-frame width never drift.
pub struct LandmarkNormalizer {
    landmarks_per_hand: usize,
    max_hands: usize,
    next_sequence_id: u64,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl LandmarkNormalizer {
    pub fn new(landmarks_per_hand: usize, max_hands: usize) -> Self {
        Self {
            landmarks_per_hand,
            max_hands,
            next_sequence_id: 0,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn frame_width(&self) -> usize {
        COORDS_PER_LANDMARK * self.landmarks_per_hand * self.max_hands
    }

    pub fn hand_width(&self) -> usize {
        COORDS_PER_LANDMARK * self.landmarks_per_hand
    }

    /// Normalize one detection, substituting a placeholder on any shape error.
    pub fn normalize(&mut self, detection: &DetectionResult) -> Frame {
        let sequence_id = self.next_sequence_id;
        self.next_sequence_id += 1;

        if let Some(metrics) = &self.metrics {
            metrics.record_frame_received();
        }

        match self.flatten(detection) {
            Ok((values, hands)) if hands > 0 => Frame::new(sequence_id, values, hands),
            Ok(_) => self.placeholder(sequence_id),
            Err(e) => {
                log::warn!("Frame {} replaced with placeholder: {}", sequence_id, e);
                self.placeholder(sequence_id)
            }
        }
    }

    /// Flatten a detection without touching the frame counter.
    ///
    /// Returns the coordinate row and the number of hands used, or the
    /// shape error that made the detection unusable.
    pub fn flatten(&self, detection: &DetectionResult) -> Result<(Vec<f32>, usize), CaptureError> {
        let mut values = vec![0.0f32; self.frame_width()];
        let hands = detection.hands.len().min(self.max_hands);

        for (slot, hand) in detection.hands.iter().take(self.max_hands).enumerate() {
            if hand.len() != self.landmarks_per_hand {
                return Err(CaptureError::ShapeMismatch {
                    expected: self.landmarks_per_hand,
                    actual: hand.len(),
                });
            }

            let offset = slot * self.hand_width();
            for (i, point) in hand.iter().enumerate() {
                if !point.is_finite() {
                    // actual = usable points before the bad one
                    return Err(CaptureError::ShapeMismatch {
                        expected: self.landmarks_per_hand,
                        actual: i,
                    });
                }
                let base = offset + i * COORDS_PER_LANDMARK;
                values[base] = point.x;
                values[base + 1] = point.y;
                values[base + 2] = point.z;
            }
        }

        if detection.hands.len() > self.max_hands {
            log::debug!(
                "Detector reported {} hands, keeping first {}",
                detection.hands.len(),
                self.max_hands
            );
        }

        Ok((values, hands))
    }

    fn placeholder(&self, sequence_id: u64) -> Frame {
        if let Some(metrics) = &self.metrics {
            metrics.record_placeholder_frame();
        }
        Frame::placeholder(sequence_id, self.frame_width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Landmark;

    fn hand(points: usize, x: f32) -> Vec<Landmark> {
        (0..points).map(|i| Landmark::new(x, i as f32, -0.5)).collect()
    }

    #[test]
    fn test_second_hand_fills_second_slot() {
        let mut normalizer = LandmarkNormalizer::new(2, 2);
        let frame = normalizer.normalize(&DetectionResult::with_hands(vec![hand(2, 0.1), hand(2, 0.9)]));

        assert_eq!(
            frame.values(),
            &[0.1, 0.0, -0.5, 0.1, 1.0, -0.5, 0.9, 0.0, -0.5, 0.9, 1.0, -0.5]
        );
        assert_eq!(frame.hands_detected(), 2);
    }

    #[test]
    fn test_sequence_ids_increase_across_placeholders() {
        let mut normalizer = LandmarkNormalizer::new(21, 1);
        let a = normalizer.normalize(&DetectionResult::empty());
        let b = normalizer.normalize(&DetectionResult::with_hands(vec![hand(21, 0.3)]));
        assert_eq!(a.sequence_id(), 0);
        assert_eq!(b.sequence_id(), 1);
    }
}
