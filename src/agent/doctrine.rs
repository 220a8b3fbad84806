//! Slow-moving doctrine parameters and their drift rules

use serde::{Deserialize, Serialize};

use crate::core::types::ActionKind;

/// Bounds of the cost-intensity multiplier after drift
pub const COST_INTENSITY_RANGE: (f64, f64) = (0.4, 3.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Doctrine {
    pub risk_tolerance: f64,
    pub deterrence_preference: f64,
    pub force_threshold: f64,
    pub cost_intensity: f64,
}

impl Doctrine {
    /// Nudge doctrine toward the habits of an action family
    pub fn apply_drift(&mut self, action: ActionKind) {
        match action {
            ActionKind::Reinforce => {
                self.risk_tolerance = unit(self.risk_tolerance + 0.03);
                self.force_threshold = unit(self.force_threshold - 0.02);
                self.deterrence_preference = unit(self.deterrence_preference - 0.01);
                self.cost_intensity = cost(self.cost_intensity + 0.03);
            }
            ActionKind::Signal => {
                self.deterrence_preference = unit(self.deterrence_preference + 0.03);
                self.force_threshold = unit(self.force_threshold + 0.01);
                self.risk_tolerance = unit(self.risk_tolerance - 0.01);
            }
            ActionKind::Patrol => {
                self.force_threshold = unit(self.force_threshold + 0.02);
                self.risk_tolerance = unit(self.risk_tolerance - 0.02);
                self.cost_intensity = cost(self.cost_intensity + 0.01);
            }
        }
    }
}

fn unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn cost(x: f64) -> f64 {
    x.clamp(COST_INTENSITY_RANGE.0, COST_INTENSITY_RANGE.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctrine() -> Doctrine {
        Doctrine {
            risk_tolerance: 0.5,
            deterrence_preference: 0.5,
            force_threshold: 0.5,
            cost_intensity: 1.0,
        }
    }

    #[test]
    fn test_reinforce_drift() {
        let mut d = doctrine();
        d.apply_drift(ActionKind::Reinforce);
        assert!((d.risk_tolerance - 0.53).abs() < 1e-12);
        assert!((d.force_threshold - 0.48).abs() < 1e-12);
        assert!((d.deterrence_preference - 0.49).abs() < 1e-12);
        assert!((d.cost_intensity - 1.03).abs() < 1e-12);
    }

    #[test]
    fn test_signal_drift_leaves_cost() {
        let mut d = doctrine();
        d.apply_drift(ActionKind::Signal);
        assert!((d.deterrence_preference - 0.53).abs() < 1e-12);
        assert!((d.force_threshold - 0.51).abs() < 1e-12);
        assert!((d.risk_tolerance - 0.49).abs() < 1e-12);
        assert_eq!(d.cost_intensity, 1.0);
    }

    #[test]
    fn test_drift_clamps() {
        let mut d = Doctrine {
            risk_tolerance: 0.0,
            deterrence_preference: 1.0,
            force_threshold: 1.0,
            cost_intensity: 3.0,
        };
        d.apply_drift(ActionKind::Patrol);
        assert_eq!(d.risk_tolerance, 0.0);
        assert_eq!(d.force_threshold, 1.0);
        assert_eq!(d.cost_intensity, 3.0);

        let mut low = Doctrine {
            cost_intensity: 0.1,
            ..doctrine()
        };
        low.apply_drift(ActionKind::Patrol);
        assert_eq!(low.cost_intensity, 0.4);
    }
}
