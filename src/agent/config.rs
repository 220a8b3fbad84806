//! Per-agent configuration as supplied by the scenario layer

use serde::{Deserialize, Serialize};

use crate::core::error::{ensure_finite, Result, SimError};

/// Initial parameters of one agent
///
/// Weight triples may be given un-normalised; they are normalised when the
/// agent is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub name: String,
    pub initial_resource: f64,
    /// Border vulnerability in [0, 1]
    pub border_vulnerability: f64,

    // Doctrine
    pub risk_tolerance: f64,
    pub deterrence_preference: f64,
    pub force_threshold: f64,
    pub cost_intensity: f64,

    /// [security, influence, cost]
    pub strategic_weights: [f64; 3],

    // Operational
    pub allocation_capacity: f64,
    pub tempo: f64,
    pub mobilization_threshold: f64,
    pub income_rate: f64,

    // Technical
    pub efficacy: f64,
    pub learning_cost_multiplier: f64,
    /// Beta(alpha, beta) prior of the success belief
    pub success_belief: [f64; 2],
    /// Beta(alpha, beta) prior of the reliability belief
    pub reliability_belief: [f64; 2],

    // Tactical
    pub choice_sharpness: f64,
    /// [Patrol, Signal, Reinforce]
    pub action_preference: [f64; 3],
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Agent".to_string(),
            initial_resource: 1200.0,
            border_vulnerability: 0.60,
            risk_tolerance: 0.45,
            deterrence_preference: 0.65,
            force_threshold: 0.55,
            cost_intensity: 1.05,
            strategic_weights: [3.0, 2.0, 2.0],
            allocation_capacity: 0.55,
            tempo: 5.5,
            mobilization_threshold: 0.56,
            income_rate: 15.0,
            efficacy: 1.10,
            learning_cost_multiplier: 1.0,
            success_belief: [2.4, 2.3],
            reliability_belief: [2.4, 2.4],
            choice_sharpness: 2.0,
            action_preference: [1.0, 1.1, 0.9],
        }
    }
}

impl AgentConfig {
    /// Default parameters under a given name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Check domains that the agent constructor does not re-check
    ///
    /// Weight triples and Beta pairs are validated when the agent is built.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SimError::invalid("agent name must not be empty"));
        }
        let scalars = [
            ("initial_resource", self.initial_resource),
            ("border_vulnerability", self.border_vulnerability),
            ("risk_tolerance", self.risk_tolerance),
            ("deterrence_preference", self.deterrence_preference),
            ("force_threshold", self.force_threshold),
            ("cost_intensity", self.cost_intensity),
            ("allocation_capacity", self.allocation_capacity),
            ("tempo", self.tempo),
            ("mobilization_threshold", self.mobilization_threshold),
            ("income_rate", self.income_rate),
            ("efficacy", self.efficacy),
            ("learning_cost_multiplier", self.learning_cost_multiplier),
            ("choice_sharpness", self.choice_sharpness),
        ];
        for (field, value) in scalars {
            ensure_finite(&format!("{}.{field}", self.name), value)?;
        }

        let unit = [
            ("border_vulnerability", self.border_vulnerability),
            ("risk_tolerance", self.risk_tolerance),
            ("deterrence_preference", self.deterrence_preference),
            ("force_threshold", self.force_threshold),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::invalid(format!("{}.{field} must be in [0, 1], got {value}", self.name)));
            }
        }

        let positive = [
            ("cost_intensity", self.cost_intensity),
            ("tempo", self.tempo),
            ("efficacy", self.efficacy),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(SimError::invalid(format!("{}.{field} must be positive, got {value}", self.name)));
            }
        }

        if self.initial_resource < 0.0 {
            return Err(SimError::invalid(format!("{}.initial_resource must be non-negative", self.name)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AgentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_doctrine() {
        let config = AgentConfig {
            risk_tolerance: 1.5,
            ..AgentConfig::named("A")
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_non_finite_and_zero_tempo() {
        let nan = AgentConfig {
            income_rate: f64::NAN,
            ..AgentConfig::named("A")
        };
        assert!(nan.validate().is_err());

        let zero_tempo = AgentConfig {
            tempo: 0.0,
            ..AgentConfig::named("A")
        };
        assert!(zero_tempo.validate().is_err());
    }

    #[test]
    fn test_rejects_blank_name() {
        assert!(AgentConfig::named("  ").validate().is_err());
    }
}
