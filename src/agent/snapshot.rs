//! Serializable point-in-time view of an agent

use serde::{Deserialize, Serialize};

/// Before/after view of every externally interesting agent parameter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub name: String,

    pub risk_tolerance: f64,
    pub deterrence_preference: f64,
    pub force_threshold: f64,
    pub cost_intensity: f64,

    pub strategic_weights: [f64; 3],

    pub allocation_capacity: f64,
    pub tempo: f64,
    pub mobilization_threshold: f64,
    pub income_rate: f64,

    pub efficacy: f64,
    pub learning_cost_multiplier: f64,
    pub success_belief: [f64; 2],
    pub reliability_belief: [f64; 2],
    pub success_mean: f64,
    pub reliability_mean: f64,

    pub choice_sharpness: f64,
    pub action_preference: [f64; 3],

    pub tension: f64,
    pub resource: f64,
    pub border_vulnerability: f64,
}
