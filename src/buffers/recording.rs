use crate::core::{Frame, Sequence};

/// Accumulates frames for a single recording until the target length.
///
/// The completed sequence is handed out exactly once. After that the buffer
/// is sealed and ignores further frames until [`SequenceBuffer::reset`].
pub struct SequenceBuffer {
    target_len: usize,
    frames: Vec<Frame>,
    sealed: bool,
}

impl SequenceBuffer {
    /// A zero target is raised to one frame; an empty recording could never
    /// form a sequence and would leave the buffer sealed for good.
    pub fn new(target_len: usize) -> Self {
        if target_len == 0 {
            log::warn!("Recording length 0 requested, using 1");
        }
        let target_len = target_len.max(1);
        Self {
            target_len,
            frames: Vec::with_capacity(target_len),
            sealed: false,
        }
    }

    /// Append a frame; returns the finished sequence when this frame completes it.
    pub fn push(&mut self, frame: Frame) -> Option<Sequence> {
        if self.sealed {
            return None;
        }

        self.frames.push(frame);
        if self.frames.len() < self.target_len {
            return None;
        }

        self.sealed = true;
        let frames = std::mem::replace(&mut self.frames, Vec::with_capacity(self.target_len));
        // Length was checked above and all frames come from one normalizer,
        // so this only fails if a caller mixed geometries.
        match Sequence::new(frames, self.target_len) {
            Ok(sequence) => Some(sequence),
            Err(e) => {
                log::warn!("Discarding recorded sequence: {}", e);
                None
            }
        }
    }

    /// Empty the buffer and accept frames again.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.sealed = false;
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn target_len(&self) -> usize {
        self.target_len
    }
}
