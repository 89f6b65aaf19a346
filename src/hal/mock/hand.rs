use crate::core::{DetectionResult, Landmark};

/// Synthetic hand: a wrist at `(cx, cy)` with fingers fanned upwards.
///
/// Produces `landmarks` points in normalized image space, wrist first.
pub fn open_hand(landmarks: usize, cx: f32, cy: f32) -> Vec<Landmark> {
    (0..landmarks)
        .map(|i| {
            if i == 0 {
                return Landmark::new(cx, cy, 0.0);
            }
            // four joints per finger, five fingers
            let finger = ((i - 1) / 4) as f32;
            let joint = ((i - 1) % 4 + 1) as f32;
            let spread = (finger - 2.0) * 0.04;
            Landmark::new(
                (cx + spread * joint).clamp(0.0, 1.0),
                (cy - 0.05 * joint).clamp(0.0, 1.0),
                -0.01 * joint,
            )
        })
        .collect()
}

/// One hand waving left and right for `frames` ticks.
///
/// Every `gap_every`-th frame (if non-zero) has no hand, to exercise the
/// placeholder path.
pub fn wave_script(frames: usize, landmarks: usize, gap_every: usize) -> Vec<DetectionResult> {
    (0..frames)
        .map(|i| {
            if gap_every > 0 && i % gap_every == gap_every - 1 {
                return DetectionResult::empty();
            }
            let phase = i as f32 / 10.0;
            let cx = 0.5 + 0.2 * phase.sin();
            DetectionResult::with_hands(vec![open_hand(landmarks, cx, 0.7)])
        })
        .collect()
}
