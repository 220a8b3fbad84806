//! Bounded sliding window of training rows

use std::collections::VecDeque;

use crate::fitter::Sample;

/// Keeps the most recent `capacity` rows; pushing past capacity drops the
/// oldest row first.
#[derive(Debug, Clone)]
pub struct SampleWindow<const D: usize> {
    rows: VecDeque<Sample<D>>,
    capacity: usize,
}

impl<const D: usize> SampleWindow<D> {
    pub fn new(capacity: usize) -> Self {
        Self {
            rows: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    pub fn push(&mut self, features: [f64; D], label: f64) {
        if self.capacity == 0 {
            return;
        }
        while self.rows.len() >= self.capacity {
            self.rows.pop_front();
        }
        self.rows.push_back((features, label));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Oldest-first contiguous view for the fitter
    pub fn as_slice(&mut self) -> &[Sample<D>] {
        self.rows.make_contiguous()
    }
}
