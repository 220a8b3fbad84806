//! Run configuration with documented constants
//!
//! The tuned constants of the engine live here so a scenario file can
//! override any of them without touching the model code.

use serde::{Deserialize, Serialize};

use crate::core::error::{ensure_finite, Result, SimError};
use crate::core::types::ActionKind;

/// Top-level run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of discrete steps to simulate
    pub steps: u64,

    /// Seed for the shared generator
    ///
    /// `None` draws a seed from entropy; the drawn value is logged so the
    /// run can be replayed.
    pub seed: Option<u64>,

    /// Apply doctrine drift every N occurrences of the same action
    ///
    /// 0 disables drift entirely.
    pub doctrine_update_every: u32,

    pub recalibration: RecalibrationConfig,
    pub learning: LearningConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 50,
            seed: Some(42),
            doctrine_update_every: 0,
            recalibration: RecalibrationConfig::default(),
            learning: LearningConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(SimError::invalid("steps must be positive"));
        }
        self.recalibration.validate()?;
        self.learning.validate()
    }
}

/// Online recalibration of the shared escalation coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecalibrationConfig {
    /// Refit every N steps (0 disables refitting and sample buffering)
    pub every: u64,

    /// Sliding window size per dataset; older rows are dropped first
    pub window: usize,

    /// Both datasets need at least this many rows before a refit runs
    ///
    /// Below the minimum the refit is skipped silently. With two agents
    /// and the default of 200, the first refit happens around step 100.
    pub min_samples: usize,

    /// Gaussian prior precision (L2 strength)
    pub l2: f64,

    /// Gradient ascent step size, divided by the sample count per iteration
    pub learning_rate: f64,

    /// Fixed iteration count; there is no convergence check
    pub iterations: u32,
}

impl Default for RecalibrationConfig {
    fn default() -> Self {
        Self {
            every: 10,
            window: 2000,
            min_samples: 200,
            l2: 0.8,
            learning_rate: 0.25,
            iterations: 160,
        }
    }
}

impl RecalibrationConfig {
    /// Refitting switched off
    pub fn disabled() -> Self {
        Self {
            every: 0,
            ..Self::default()
        }
    }

    pub fn enabled(&self) -> bool {
        self.every > 0
    }

    pub fn validate(&self) -> Result<()> {
        ensure_finite("recalibration.l2", self.l2)?;
        ensure_finite("recalibration.learning_rate", self.learning_rate)?;
        if self.l2 < 0.0 {
            return Err(SimError::invalid("recalibration.l2 must be non-negative"));
        }
        if self.learning_rate <= 0.0 {
            return Err(SimError::invalid("recalibration.learning_rate must be positive"));
        }
        if self.l2 * self.learning_rate >= 2.0 {
            return Err(SimError::invalid(format!(
                "recalibration.l2 * learning_rate must be below 2, got {}",
                self.l2 * self.learning_rate
            )));
        }
        if self.enabled() && self.window == 0 {
            return Err(SimError::invalid("recalibration.window must be positive when refitting is enabled"));
        }
        if self.enabled() && self.min_samples > self.window {
            return Err(SimError::invalid(format!(
                "recalibration.min_samples ({}) exceeds window ({}), refitting could never run",
                self.min_samples, self.window
            )));
        }
        Ok(())
    }
}

/// Constants of the per-step learning update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Blend rate of the action-preference triple toward the chosen action
    pub preference_rate: f64,

    /// Reliability credit when no stressed failure occurred; a stressed
    /// failure always counts 1
    pub reliability_credit: f64,

    /// Success probability of Patrol and Signal
    pub success_routine: f64,

    /// Success probability of Reinforce
    pub success_forceful: f64,

    /// Subtracted from the Reinforce success probability when the agent
    /// was involved in a crisis the same step
    pub crisis_penalty: f64,

    pub success_floor: f64,
    pub success_ceiling: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            preference_rate: 0.05,
            reliability_credit: 0.3,
            success_routine: 0.82,
            success_forceful: 0.60,
            crisis_penalty: 0.08,
            success_floor: 0.05,
            success_ceiling: 0.95,
        }
    }
}

impl LearningConfig {
    /// Probability that `action` succeeds this step
    pub fn success_probability(&self, action: ActionKind, crisis_involved: bool) -> f64 {
        let mut p = if action.is_forceful() {
            self.success_forceful
        } else {
            self.success_routine
        };
        if crisis_involved && action.is_forceful() {
            p -= self.crisis_penalty;
        }
        p.clamp(self.success_floor, self.success_ceiling)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("learning.preference_rate", self.preference_rate),
            ("learning.reliability_credit", self.reliability_credit),
            ("learning.success_routine", self.success_routine),
            ("learning.success_forceful", self.success_forceful),
            ("learning.crisis_penalty", self.crisis_penalty),
            ("learning.success_floor", self.success_floor),
            ("learning.success_ceiling", self.success_ceiling),
        ] {
            ensure_finite(field, value)?;
        }
        if !(0.0..=1.0).contains(&self.preference_rate) {
            return Err(SimError::invalid("learning.preference_rate must be in [0, 1]"));
        }
        if self.reliability_credit < 0.0 {
            return Err(SimError::invalid("learning.reliability_credit must be non-negative"));
        }
        if !(0.0 <= self.success_floor && self.success_floor <= self.success_ceiling && self.success_ceiling <= 1.0) {
            return Err(SimError::invalid(format!(
                "learning success bounds must satisfy 0 <= floor ({}) <= ceiling ({}) <= 1",
                self.success_floor, self.success_ceiling
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_steps_rejected() {
        let config = RunConfig {
            steps: 0,
            ..RunConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_enabled_recalibration_needs_window() {
        let config = RecalibrationConfig {
            window: 0,
            ..RecalibrationConfig::default()
        };
        assert!(config.validate().is_err());
        let disabled = RecalibrationConfig {
            window: 0,
            ..RecalibrationConfig::disabled()
        };
        assert!(disabled.validate().is_ok());
    }

    #[test]
    fn test_min_samples_must_fit_in_window() {
        let config = RecalibrationConfig {
            window: 50,
            min_samples: 51,
            ..RecalibrationConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let fits = RecalibrationConfig {
            min_samples: 50,
            ..config.clone()
        };
        assert!(fits.validate().is_ok());

        let disabled = RecalibrationConfig {
            every: 0,
            ..config
        };
        assert!(disabled.validate().is_ok());
    }

    #[test]
    fn test_prior_step_must_not_overshoot() {
        let config = RecalibrationConfig {
            learning_rate: 1e6,
            ..RecalibrationConfig::default()
        };
        assert!(config.validate().is_err());

        let edge = RecalibrationConfig {
            l2: 0.8,
            learning_rate: 2.5,
            ..RecalibrationConfig::default()
        };
        assert!(edge.validate().is_err());

        let unpenalised = RecalibrationConfig {
            l2: 0.0,
            learning_rate: 1e6,
            ..RecalibrationConfig::default()
        };
        assert!(unpenalised.validate().is_ok());
    }

    #[test]
    fn test_success_probability_by_action() {
        let learning = LearningConfig::default();
        assert!((learning.success_probability(ActionKind::Patrol, true) - 0.82).abs() < 1e-12);
        assert!((learning.success_probability(ActionKind::Reinforce, false) - 0.60).abs() < 1e-12);
        assert!((learning.success_probability(ActionKind::Reinforce, true) - 0.52).abs() < 1e-12);
    }

    #[test]
    fn test_success_probability_is_clamped() {
        let learning = LearningConfig {
            success_forceful: 0.1,
            crisis_penalty: 0.5,
            ..LearningConfig::default()
        };
        assert_eq!(learning.success_probability(ActionKind::Reinforce, true), 0.05);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: RunConfig = toml::from_str("steps = 12\n[recalibration]\nevery = 0\n").unwrap();
        assert_eq!(config.steps, 12);
        assert!(!config.recalibration.enabled());
        assert_eq!(config.recalibration.window, 2000);
        assert_eq!(config.learning, LearningConfig::default());
    }
}
