//! Probability-simplex triple
//!
//! Strategic weights and action preferences must always sum to one. The
//! inner array is private so every mutation goes through a path that
//! renormalises.

use serde::Serialize;

use crate::core::error::{ensure_finite, Result, SimError};

const MIN_MASS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Simplex3([f64; 3]);

impl Simplex3 {
    /// Normalise non-negative raw weights; rejects negatives, non-finite
    /// values and an all-zero triple.
    pub fn new(raw: [f64; 3]) -> Result<Self> {
        for (i, w) in raw.iter().enumerate() {
            ensure_finite(&format!("weight[{i}]"), *w)?;
            if *w < 0.0 {
                return Err(SimError::invalid(format!("weight[{i}] must be non-negative, got {w}")));
            }
        }
        let total: f64 = raw.iter().sum();
        if total <= MIN_MASS {
            return Err(SimError::invalid("weights must not all be zero"));
        }
        Ok(Self(raw.map(|w| w / total)))
    }

    pub fn uniform() -> Self {
        Self([1.0 / 3.0; 3])
    }

    pub fn as_array(&self) -> [f64; 3] {
        self.0
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }

    /// Exponential blend toward the one-hot vector at `index`
    pub fn blend_toward(&mut self, index: usize, rate: f64) {
        let mut next = self.0.map(|w| (1.0 - rate) * w);
        next[index] += rate;
        self.renormalize(next);
    }

    fn renormalize(&mut self, raw: [f64; 3]) {
        let total: f64 = raw.iter().sum();
        self.0 = raw.map(|w| w / total.max(MIN_MASS));
    }
}
