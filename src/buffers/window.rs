use std::collections::VecDeque;
use crate::core::{Frame, Sequence};

/// Fixed-capacity FIFO over the most recent frames.
pub struct SequenceWindow {
    capacity: usize,
    frames: VecDeque<Frame>,
}

impl SequenceWindow {
    /// Capacity is at least one frame.
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            log::warn!("Window capacity 0 requested, using 1");
        }
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Append a frame, evicting the oldest once over capacity.
    ///
    /// Returns a snapshot of the full window on every push once it is ready,
    /// `None` while still filling.
    pub fn push(&mut self, frame: Frame) -> Option<Sequence> {
        self.frames.push_back(frame);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }

        if !self.is_ready() {
            return None;
        }

        Sequence::new(self.frames.iter().cloned().collect(), self.capacity).ok()
    }

    pub fn is_ready(&self) -> bool {
        self.frames.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `(current, capacity)` for a "filling buffer" indicator.
    pub fn fill_progress(&self) -> (usize, usize) {
        (self.frames.len(), self.capacity)
    }

    pub fn oldest(&self) -> Option<&Frame> {
        self.frames.front()
    }

    pub fn newest(&self) -> Option<&Frame> {
        self.frames.back()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
