//! Beta-distributed beliefs over success and reliability

use serde::{Deserialize, Serialize};

use crate::core::error::{ensure_finite, Result, SimError};

/// Beta(alpha, beta) belief; `alpha` counts successes, `beta` failures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaBelief {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaBelief {
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        ensure_finite("beta.alpha", alpha)?;
        ensure_finite("beta.beta", beta)?;
        if alpha <= 0.0 || beta <= 0.0 {
            return Err(SimError::invalid(format!(
                "Beta parameters must be positive, got ({alpha}, {beta})"
            )));
        }
        Ok(Self { alpha, beta })
    }

    pub fn mean(&self) -> f64 {
        (self.alpha / (self.alpha + self.beta)).clamp(0.0, 1.0)
    }

    pub fn add_success(&mut self, weight: f64) {
        self.alpha += weight;
    }

    pub fn add_failure(&mut self, weight: f64) {
        self.beta += weight;
    }
}
