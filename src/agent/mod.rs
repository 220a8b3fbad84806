//! Strategic agent: bounded-rational choice, escalation risk and learning
//!
//! An agent scores the three actions, samples one through a softmax with
//! learned preference offsets, and afterwards updates its beliefs, doctrine,
//! tension and resources from what happened that step.

pub mod beliefs;
pub mod config;
pub mod doctrine;
pub mod features;
pub mod simplex;
pub mod snapshot;

use std::sync::Arc;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::core::config::LearningConfig;
use crate::core::error::{Result, SimError};
use crate::core::math::{dot3, resource_norm};
use crate::core::types::{ActionKind, PerAction};
use crate::model::{ActionBases, EscalationCoeffs, StateDynamicsCoeffs};

pub use beliefs::BetaBelief;
pub use config::AgentConfig;
pub use doctrine::Doctrine;
pub use features::FeatureSet;
pub use simplex::Simplex3;
pub use snapshot::AgentSnapshot;

/// Outcome of one stochastic choice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub action: ActionKind,
    /// Softmax choice distribution the action was drawn from
    pub probabilities: [f64; 3],
    /// Utilities the distribution was computed from
    pub utilities: [f64; 3],
}

impl Decision {
    /// Probability-weighted utility E[U]
    pub fn expected_utility(&self) -> f64 {
        dot3(&self.probabilities, &self.utilities)
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    name: String,

    resource: f64,
    tension: f64,
    border_vulnerability: f64,

    doctrine: Doctrine,
    strategic_weights: Simplex3,

    allocation_capacity: f64,
    tempo: f64,
    mobilization_threshold: f64,
    income_rate: f64,

    efficacy: f64,
    learning_cost_multiplier: f64,
    success_belief: BetaBelief,
    reliability_belief: BetaBelief,

    choice_sharpness: f64,
    action_preference: Simplex3,

    action_counts: PerAction<u32>,

    bases: Arc<ActionBases>,
    dynamics: Arc<StateDynamicsCoeffs>,
}

impl Agent {
    pub fn new(config: &AgentConfig, bases: Arc<ActionBases>, dynamics: Arc<StateDynamicsCoeffs>) -> Result<Self> {
        config.validate()?;
        let name = config.name.clone();
        let named = |e: SimError| match e {
            SimError::InvalidConfig(msg) => SimError::InvalidConfig(format!("{name}: {msg}")),
            other => other,
        };

        let strategic_weights = Simplex3::new(config.strategic_weights).map_err(named)?;
        let action_preference = Simplex3::new(config.action_preference).map_err(named)?;
        let [pa, pb] = config.success_belief;
        let success_belief = BetaBelief::new(pa, pb).map_err(named)?;
        let [ra, rb] = config.reliability_belief;
        let reliability_belief = BetaBelief::new(ra, rb).map_err(named)?;

        Ok(Self {
            tension: dynamics.initial_tension(config.border_vulnerability),
            name: config.name.clone(),
            resource: config.initial_resource,
            border_vulnerability: config.border_vulnerability,
            doctrine: Doctrine {
                risk_tolerance: config.risk_tolerance,
                deterrence_preference: config.deterrence_preference,
                force_threshold: config.force_threshold,
                cost_intensity: config.cost_intensity,
            },
            strategic_weights,
            allocation_capacity: config.allocation_capacity,
            tempo: config.tempo,
            mobilization_threshold: config.mobilization_threshold,
            income_rate: config.income_rate,
            efficacy: config.efficacy,
            learning_cost_multiplier: config.learning_cost_multiplier,
            success_belief,
            reliability_belief,
            choice_sharpness: config.choice_sharpness,
            action_preference,
            action_counts: PerAction::default(),
            bases,
            dynamics,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource(&self) -> f64 {
        self.resource
    }

    pub fn tension(&self) -> f64 {
        self.tension
    }

    pub fn border_vulnerability(&self) -> f64 {
        self.border_vulnerability
    }

    pub fn doctrine(&self) -> &Doctrine {
        &self.doctrine
    }

    pub fn strategic_weights(&self) -> &Simplex3 {
        &self.strategic_weights
    }

    pub fn action_preference(&self) -> &Simplex3 {
        &self.action_preference
    }

    pub fn success_belief(&self) -> &BetaBelief {
        &self.success_belief
    }

    pub fn reliability_belief(&self) -> &BetaBelief {
        &self.reliability_belief
    }

    pub fn action_counts(&self) -> PerAction<u32> {
        self.action_counts
    }

    /// Softmax over `sharpness * U + preference`, shifted by the max logit
    pub fn choice_probabilities(&self, utilities: &[f64; 3]) -> [f64; 3] {
        let preference = self.action_preference.as_array();
        let logits = [0, 1, 2].map(|i| self.choice_sharpness * utilities[i] + preference[i]);
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let weights = logits.map(|l| (l - max).exp());
        let total: f64 = weights.iter().sum();
        weights.map(|w| w / total)
    }

    /// Sample an action from the choice distribution
    pub fn choose_action<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Decision> {
        let utilities = self.utilities();
        let probabilities = self.choice_probabilities(&utilities);
        let dist = WeightedIndex::new(probabilities).map_err(|e| {
            SimError::Numerical(format!(
                "{}: invalid choice distribution {probabilities:?} ({e})",
                self.name
            ))
        })?;
        let action = ActionKind::ALL[dist.sample(rng)];
        Ok(Decision {
            action,
            probabilities,
            utilities,
        })
    }

    /// Escalation probability psi_c for the given action under `coeffs`
    pub fn escalation_probability(&self, action: ActionKind, coeffs: &EscalationCoeffs) -> f64 {
        let f = self.features(action);
        coeffs.escalation_probability(&f.strategic, &f.operational, &f.technical, &f.context)
    }

    /// Learn from the outcome of this step's action
    pub fn update_beliefs(&mut self, action: ActionKind, success: bool, crisis_involved: bool, learning: &LearningConfig) {
        self.action_preference.blend_toward(action.index(), learning.preference_rate);

        if success {
            self.success_belief.add_success(1.0);
        } else {
            self.success_belief.add_failure(1.0);
        }

        if crisis_involved && !success {
            self.reliability_belief.add_failure(1.0);
        } else {
            self.reliability_belief.add_success(learning.reliability_credit);
        }
    }

    /// Count an occurrence of `action`; every `every`-th occurrence of the
    /// same action drifts doctrine. Returns whether drift was applied.
    pub fn record_action(&mut self, action: ActionKind, every: u32) -> bool {
        self.action_counts[action] += 1;
        if every == 0 || self.action_counts[action] % every != 0 {
            return false;
        }
        self.doctrine.apply_drift(action);
        true
    }

    /// Carry tension and resources forward one step
    ///
    /// Spending is proportional to the agent's own resources, so large
    /// stockpiles drain faster and small ones barely move.
    pub fn update_state(&mut self, expected_utility: f64, psi: f64, action: ActionKind) {
        let norm = resource_norm(self.resource);
        let next_tension = self
            .dynamics
            .next_tension(self.border_vulnerability, psi, expected_utility, norm);

        let spend = self.doctrine.cost_intensity * self.bases.cost[action] * (50.0 * self.resource / 1000.0);
        let next_resource = self.resource + self.income_rate - spend;

        self.tension = next_tension.clamp(0.0, 1.0);
        self.resource = next_resource.max(0.0);
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            name: self.name.clone(),
            risk_tolerance: self.doctrine.risk_tolerance,
            deterrence_preference: self.doctrine.deterrence_preference,
            force_threshold: self.doctrine.force_threshold,
            cost_intensity: self.doctrine.cost_intensity,
            strategic_weights: self.strategic_weights.as_array(),
            allocation_capacity: self.allocation_capacity,
            tempo: self.tempo,
            mobilization_threshold: self.mobilization_threshold,
            income_rate: self.income_rate,
            efficacy: self.efficacy,
            learning_cost_multiplier: self.learning_cost_multiplier,
            success_belief: [self.success_belief.alpha, self.success_belief.beta],
            reliability_belief: [self.reliability_belief.alpha, self.reliability_belief.beta],
            success_mean: self.success_belief.mean(),
            reliability_mean: self.reliability_belief.mean(),
            choice_sharpness: self.choice_sharpness,
            action_preference: self.action_preference.as_array(),
            tension: self.tension,
            resource: self.resource,
            border_vulnerability: self.border_vulnerability,
        }
    }
}
