//! Complete run description: agents, interaction matrix, run parameters
//! and model coefficients, loadable from TOML

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentConfig};
use crate::core::config::RunConfig;
use crate::core::error::Result;
use crate::model::{ActionBases, EscalationCoeffs, StateDynamicsCoeffs};
use crate::world::{InteractionMatrix, World};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub run: RunConfig,
    pub agents: Vec<AgentConfig>,
    /// Signed matrix in [-1, 1]; omitted means every pair is neutral
    pub interaction: Option<Vec<Vec<f64>>>,
    /// Starting escalation coefficients
    pub escalation: EscalationCoeffs,
    pub dynamics: StateDynamicsCoeffs,
    pub bases: ActionBases,
}

impl Default for Scenario {
    /// Two default agents in maximal mutual rivalry
    fn default() -> Self {
        Self {
            name: "two-rivals".to_string(),
            run: RunConfig::default(),
            agents: vec![AgentConfig::named("Alpha"), AgentConfig::named("Beta")],
            interaction: Some(vec![vec![0.0, -1.0], vec![-1.0, 0.0]]),
            escalation: EscalationCoeffs::default(),
            dynamics: StateDynamicsCoeffs::default(),
            bases: ActionBases::default(),
        }
    }
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Everything except the per-agent and matrix checks that `build_world`
    /// performs while constructing
    pub fn validate(&self) -> Result<()> {
        self.run.validate()?;
        self.bases.validate()?;
        self.dynamics.validate()?;
        self.escalation.validate()?;
        for agent in &self.agents {
            agent.validate()?;
        }
        Ok(())
    }

    pub fn interaction_matrix(&self) -> Result<InteractionMatrix> {
        match &self.interaction {
            Some(rows) => InteractionMatrix::new(rows, self.agents.len()),
            None => Ok(InteractionMatrix::neutral(self.agents.len())),
        }
    }

    /// The configured seed, or a fresh one from entropy
    pub fn resolve_seed(&self) -> u64 {
        self.run.seed.unwrap_or_else(rand::random)
    }

    pub fn build_world(&self, seed: u64) -> Result<World> {
        let bases = Arc::new(self.bases.clone());
        let dynamics = Arc::new(self.dynamics.clone());
        let agents = self
            .agents
            .iter()
            .map(|cfg| Agent::new(cfg, Arc::clone(&bases), Arc::clone(&dynamics)))
            .collect::<Result<Vec<_>>>()?;

        World::new(
            agents,
            self.interaction_matrix()?,
            self.escalation.clone(),
            &self.run,
            ChaCha8Rng::seed_from_u64(seed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SimError;

    #[test]
    fn test_default_scenario_builds() {
        let scenario = Scenario::default();
        assert!(scenario.validate().is_ok());
        let world = scenario.build_world(1).unwrap();
        assert_eq!(world.agents().len(), 2);
        assert_eq!(world.interaction().get(0, 1), -1.0);
    }

    #[test]
    fn test_toml_scenario_with_defaults() {
        let scenario = Scenario::from_toml_str(
            r#"
            name = "trio"
            interaction = [[0.0, -0.4, 0.4], [-0.1, 0.0, 0.1], [0.3, -0.3, 0.0]]

            [run]
            steps = 20
            seed = 9
            doctrine_update_every = 5

            [[agents]]
            name = "North"
            choice_sharpness = 2.1

            [[agents]]
            name = "East"
            strategic_weights = [2.3, 3.2, 1.8]

            [[agents]]
            name = "South"
            initial_resource = 1150.0
            "#,
        )
        .unwrap();
        assert_eq!(scenario.agents.len(), 3);
        assert_eq!(scenario.run.steps, 20);
        assert_eq!(scenario.run.doctrine_update_every, 5);
        assert_eq!(scenario.agents[1].strategic_weights, [2.3, 3.2, 1.8]);
        assert_eq!(scenario.agents[2].income_rate, 15.0);
        assert_eq!(scenario.escalation, EscalationCoeffs::default());
        assert!(scenario.build_world(9).is_ok());
    }

    #[test]
    fn test_missing_matrix_is_neutral() {
        let scenario = Scenario {
            interaction: None,
            ..Scenario::default()
        };
        let m = scenario.interaction_matrix().unwrap();
        assert_eq!(m.targeting_weights(0), vec![0.0, 0.5]);
    }

    #[test]
    fn test_bad_matrix_rejected_before_first_step() {
        let scenario = Scenario {
            interaction: Some(vec![vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0]]),
            ..Scenario::default()
        };
        assert!(matches!(scenario.build_world(1), Err(SimError::MatrixShape { .. })));
    }

    #[test]
    fn test_malformed_toml_is_reported() {
        let err = Scenario::from_toml_str("run = 3").unwrap_err();
        assert!(matches!(err, SimError::TomlError(_)));
    }
}
