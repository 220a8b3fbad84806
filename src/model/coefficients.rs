//! Escalation and state-dynamics coefficient bundles

use serde::{Deserialize, Serialize};

use crate::core::error::{ensure_finite, Result};
use crate::core::math::{dot3, sigmoid, signed_to_weight01};

/// Width of the agent-level escalation feature row: S(3) + O(3) + T(3) + Z(2)
pub const AGENT_FEATURES: usize = 11;

/// Width of the edge-level crisis feature row: psi_i, psi_j, psi_i*psi_j, w - 0.5, 1
pub const EDGE_FEATURES: usize = 5;

/// Coefficients of the agent escalation probability and the dyadic crisis
/// probability
///
/// `psi = sigmoid(scale * (strategic.S + operational.O + technical.T + context.Z - psi_bias))`
///
/// The technical weights are negative: higher risk and cost make an agent
/// less likely to escalate. `psi_bias` and `psi_scale` keep the logistic
/// input away from saturation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationCoeffs {
    /// [security, influence, cost]
    pub strategic: [f64; 3],
    /// [allocation, tempo, mobilize]
    pub operational: [f64; 3],
    /// [efficiency loss, failure risk, learning cost]
    pub technical: [f64; 3],
    /// [border vulnerability, resource norm]
    pub context: [f64; 2],
    pub eta1: f64,
    pub eta2: f64,
    pub eta3: f64,
    pub eta_bias: f64,
    pub eta_w: f64,
    pub psi_bias: f64,
    pub psi_scale: f64,
}

impl Default for EscalationCoeffs {
    fn default() -> Self {
        Self {
            strategic: [1.0, 0.8, -1.2],
            operational: [0.7, 0.6, 0.6],
            technical: [-1.0, -1.0, -0.8],
            context: [0.6, 0.3],
            eta1: 0.85,
            eta2: 0.85,
            eta3: 0.25,
            eta_bias: 0.0,
            eta_w: 0.6,
            psi_bias: 1.8,
            psi_scale: 0.75,
        }
    }
}

impl EscalationCoeffs {
    /// Raw linear score of a feature block before bias and scale
    pub fn linear(&self, s: &[f64; 3], o: &[f64; 3], t: &[f64; 3], z: &[f64; 2]) -> f64 {
        dot3(&self.strategic, s)
            + dot3(&self.operational, o)
            + dot3(&self.technical, t)
            + self.context[0] * z[0]
            + self.context[1] * z[1]
    }

    pub fn escalation_probability(&self, s: &[f64; 3], o: &[f64; 3], t: &[f64; 3], z: &[f64; 2]) -> f64 {
        let linear = self.psi_scale * (self.linear(s, o, t, z) - self.psi_bias);
        sigmoid(linear)
    }

    /// Logit of the directed crisis probability between i and j
    pub fn dyadic_logit(&self, psi_i: f64, psi_j: f64, w_signed: f64) -> f64 {
        let w01 = signed_to_weight01(w_signed);
        self.eta1 * psi_i
            + self.eta2 * psi_j
            + self.eta3 * psi_i * psi_j
            + self.eta_bias
            + self.eta_w * (w01 - 0.5)
    }

    pub fn dyadic_probability(&self, psi_i: f64, psi_j: f64, w_signed: f64) -> f64 {
        sigmoid(self.dyadic_logit(psi_i, psi_j, w_signed))
    }

    /// Agent-level weights flattened in feature-row order
    pub fn agent_weights(&self) -> [f64; AGENT_FEATURES] {
        let [s0, s1, s2] = self.strategic;
        let [o0, o1, o2] = self.operational;
        let [t0, t1, t2] = self.technical;
        let [z0, z1] = self.context;
        [s0, s1, s2, o0, o1, o2, t0, t1, t2, z0, z1]
    }

    pub fn set_agent_weights(&mut self, w: &[f64; AGENT_FEATURES]) {
        self.strategic = [w[0], w[1], w[2]];
        self.operational = [w[3], w[4], w[5]];
        self.technical = [w[6], w[7], w[8]];
        self.context = [w[9], w[10]];
    }

    /// Edge-level weights in feature-row order: [eta1, eta2, eta3, eta_w, eta_bias]
    pub fn edge_weights(&self) -> [f64; EDGE_FEATURES] {
        [self.eta1, self.eta2, self.eta3, self.eta_w, self.eta_bias]
    }

    pub fn set_edge_weights(&mut self, w: &[f64; EDGE_FEATURES]) {
        self.eta1 = w[0];
        self.eta2 = w[1];
        self.eta3 = w[2];
        self.eta_w = w[3];
        self.eta_bias = w[4];
    }

    pub fn validate(&self) -> Result<()> {
        for (i, w) in self.agent_weights().iter().enumerate() {
            ensure_finite(&format!("escalation.weights[{i}]"), *w)?;
        }
        for (i, w) in self.edge_weights().iter().enumerate() {
            ensure_finite(&format!("escalation.eta[{i}]"), *w)?;
        }
        ensure_finite("escalation.psi_bias", self.psi_bias)?;
        ensure_finite("escalation.psi_scale", self.psi_scale)
    }
}

/// Coefficients of the logistic tension update
///
/// `tension' = sigmoid(base + vulnerability*v + psi*psi_c + expected_utility*E[U] - resource*norm(R))`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateDynamicsCoeffs {
    pub base: f64,
    pub vulnerability: f64,
    pub psi: f64,
    pub expected_utility: f64,
    /// Applied to the normalised resource, not the raw amount
    pub resource: f64,
    /// Initial tension is `sigmoid(init_scale * v)`
    pub init_scale: f64,
}

impl Default for StateDynamicsCoeffs {
    fn default() -> Self {
        Self {
            base: -0.35,
            vulnerability: 1.1,
            psi: 0.9,
            expected_utility: 0.35,
            resource: 0.9,
            init_scale: 2.0,
        }
    }
}

impl StateDynamicsCoeffs {
    pub fn initial_tension(&self, vulnerability: f64) -> f64 {
        sigmoid(self.init_scale * vulnerability)
    }

    pub fn next_tension(&self, vulnerability: f64, psi: f64, expected_utility: f64, resource_norm: f64) -> f64 {
        sigmoid(
            self.base + self.vulnerability * vulnerability + self.psi * psi
                + self.expected_utility * expected_utility
                - self.resource * resource_norm,
        )
        .clamp(0.0, 1.0)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_finite("dynamics.base", self.base)?;
        ensure_finite("dynamics.vulnerability", self.vulnerability)?;
        ensure_finite("dynamics.psi", self.psi)?;
        ensure_finite("dynamics.expected_utility", self.expected_utility)?;
        ensure_finite("dynamics.resource", self.resource)?;
        ensure_finite("dynamics.init_scale", self.init_scale)
    }
}
