//! Tumbling probability window.
//!
//! Classifier outputs accumulate FIFO until the window fills (12 entries at
//! the default 10-second tick, i.e. two minutes); the mean vector then picks
//! the dominant emotion and the buffer clears.

use crate::engine::types::{Decision, ProbabilityVector};

#[derive(Debug)]
pub struct ProbabilityWindow {
    capacity: usize,
    buffer: Vec<ProbabilityVector>,
}

impl ProbabilityWindow {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity >= 1, "probability window needs capacity >= 1");
        Self {
            capacity,
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Appends one classifier output. Returns a decision exactly when the
    /// push fills the window; the buffer is cleared in the same call.
    pub fn push(&mut self, vector: ProbabilityVector) -> Option<Decision> {
        self.buffer.push(vector);
        if self.buffer.len() < self.capacity {
            return None;
        }

        let mean_vector = ProbabilityVector::mean(&self.buffer);
        self.buffer.clear();
        Some(Decision {
            emotion: mean_vector.dominant(),
            mean_vector,
        })
    }

    /// Discards any partial window, e.g. when the UI dismisses an
    /// intervention without a break.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
