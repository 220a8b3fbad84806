//! Static per-action feature basis

use serde::{Deserialize, Serialize};

use crate::core::error::{ensure_finite, Result, SimError};
use crate::core::types::PerAction;

/// Base values from which the strategic and technical feature vectors are
/// derived. Patrol, Signal, Reinforce order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionBases {
    pub security: PerAction<f64>,
    /// Signal carries most of the influence
    pub influence: PerAction<f64>,
    /// Reinforce is by far the most expensive
    pub cost: PerAction<f64>,
    pub efficiency_loss: PerAction<f64>,
    pub failure_risk: PerAction<f64>,
    pub learning_cost: PerAction<f64>,
    /// Sharpness of the mobilization logistic `sigmoid(k * (threshold - tension))`
    pub mobilization_sharpness: f64,
}

impl Default for ActionBases {
    fn default() -> Self {
        Self {
            security: PerAction::new(0.85, 0.50, 0.95),
            influence: PerAction::new(0.25, 0.85, 0.90),
            cost: PerAction::new(0.25, 0.12, 0.90),
            efficiency_loss: PerAction::new(0.14, 0.10, 0.36),
            failure_risk: PerAction::new(0.20, 0.22, 0.55),
            learning_cost: PerAction::new(0.05, 0.07, 0.18),
            mobilization_sharpness: 10.0,
        }
    }
}

impl ActionBases {
    pub fn validate(&self) -> Result<()> {
        let tables = [
            ("security", &self.security),
            ("influence", &self.influence),
            ("cost", &self.cost),
            ("efficiency_loss", &self.efficiency_loss),
            ("failure_risk", &self.failure_risk),
            ("learning_cost", &self.learning_cost),
        ];
        for (name, table) in tables {
            for (action, value) in table.iter() {
                let field = format!("bases.{name}[{action}]");
                ensure_finite(&field, value)?;
                if value < 0.0 {
                    return Err(SimError::invalid(format!("{field} must be non-negative, got {value}")));
                }
            }
        }
        ensure_finite("bases.mobilization_sharpness", self.mobilization_sharpness)
    }
}
