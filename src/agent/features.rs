//! Feature maps and utilities
//!
//! Every action is described by three feature blocks plus a shared context
//! block. Utilities and escalation probabilities are both linear in these.

use crate::agent::Agent;
use crate::core::math::{dot3, resource_norm, sigmoid};
use crate::core::types::ActionKind;
use crate::model::AGENT_FEATURES;

/// Floor for divisions by configured positive scalars
const DIV_FLOOR: f64 = 1e-12;

/// Feature blocks of one action for one agent at one moment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureSet {
    /// [security, influence, cost]
    pub strategic: [f64; 3],
    /// [allocation, tempo, mobilize]
    pub operational: [f64; 3],
    /// [efficiency loss, failure risk, learning cost]
    pub technical: [f64; 3],
    /// [border vulnerability, resource norm]
    pub context: [f64; 2],
}

impl FeatureSet {
    /// Flattened S, O, T, Z row used by the escalation regression
    pub fn row(&self) -> [f64; AGENT_FEATURES] {
        let [s0, s1, s2] = self.strategic;
        let [o0, o1, o2] = self.operational;
        let [t0, t1, t2] = self.technical;
        let [z0, z1] = self.context;
        [s0, s1, s2, o0, o1, o2, t0, t1, t2, z0, z1]
    }

    pub fn is_finite(&self) -> bool {
        self.row().iter().all(|x| x.is_finite())
    }
}

impl Agent {
    pub fn strategic_features(&self, action: ActionKind) -> [f64; 3] {
        let security = self.bases.security[action] * (1.0 - self.tension);
        let influence = self.bases.influence[action] * self.doctrine.deterrence_preference;
        let cost = self.bases.cost[action] * (1.0 - self.doctrine.risk_tolerance);
        [security, influence, cost]
    }

    pub fn operational_features(&self, action: ActionKind) -> [f64; 3] {
        let allocation = match action {
            ActionKind::Patrol | ActionKind::Reinforce => self.allocation_capacity,
            ActionKind::Signal => 0.0,
        };
        let tempo = match action {
            ActionKind::Patrol => 1.0 / (self.tempo + DIV_FLOOR),
            _ => 0.0,
        };
        let mobilize = sigmoid(self.bases.mobilization_sharpness * (self.mobilization_threshold - self.tension));
        [allocation, tempo, mobilize]
    }

    pub fn technical_features(&self, action: ActionKind) -> [f64; 3] {
        let efficiency_loss = self.bases.efficiency_loss[action] / (self.efficacy + DIV_FLOOR);
        let confidence = self.success_belief.mean() * self.reliability_belief.mean();
        let failure_risk = self.bases.failure_risk[action] * (1.0 - confidence);
        let learning_cost = self.bases.learning_cost[action] * self.learning_cost_multiplier;
        [efficiency_loss, failure_risk, learning_cost]
    }

    pub fn context_features(&self) -> [f64; 2] {
        [self.border_vulnerability, resource_norm(self.resource)]
    }

    pub fn features(&self, action: ActionKind) -> FeatureSet {
        FeatureSet {
            strategic: self.strategic_features(action),
            operational: self.operational_features(action),
            technical: self.technical_features(action),
            context: self.context_features(),
        }
    }

    /// U(a) = w . S(a) + sum(O(a)) - sum(T(a))
    pub fn utility(&self, action: ActionKind) -> f64 {
        let s = self.strategic_features(action);
        let o = self.operational_features(action);
        let t = self.technical_features(action);
        dot3(&self.strategic_weights.as_array(), &s) + o.iter().sum::<f64>() - t.iter().sum::<f64>()
    }

    pub fn utilities(&self) -> [f64; 3] {
        ActionKind::ALL.map(|a| self.utility(a))
    }
}
