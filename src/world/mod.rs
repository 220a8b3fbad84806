//! World - agents, interaction matrix and the per-step protocol
//!
//! One `step(t)` runs three phases in order:
//! 1. every agent picks an action, its escalation probability and a target
//! 2. every chosen edge draws a crisis outcome; training rows are buffered
//!    and, when due, the escalation coefficients are refit
//! 3. every agent learns from the outcome and carries its state forward
//!
//! All draws come from the single generator owned by the world, in a fixed
//! order, so a seeded run is reproducible.

pub mod interaction;
pub mod record;
pub mod window;

use ahash::AHashMap;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::agent::{Agent, AgentSnapshot, Decision};
use crate::core::config::{LearningConfig, RecalibrationConfig, RunConfig};
use crate::core::error::{Result, SimError};
use crate::core::math::signed_to_weight01;
use crate::core::types::Step;
use crate::fitter::{fit_logistic_map, FitParams};
use crate::model::{EscalationCoeffs, AGENT_FEATURES, EDGE_FEATURES};

pub use interaction::InteractionMatrix;
pub use record::{AgentStepEntry, DyadTension, EdgeOutcome, FlatValue, StepRecord};
pub use window::SampleWindow;

/// Phase-1 result for one agent
#[derive(Debug, Clone, Copy)]
struct Intent {
    decision: Decision,
    psi: f64,
    target: usize,
}

pub struct World {
    agents: Vec<Agent>,
    interaction: InteractionMatrix,
    /// Shared escalation coefficients; only a refit writes them
    escalation: EscalationCoeffs,

    doctrine_update_every: u32,
    recalibration: RecalibrationConfig,
    learning: LearningConfig,

    agent_samples: SampleWindow<AGENT_FEATURES>,
    edge_samples: SampleWindow<EDGE_FEATURES>,

    history: Vec<StepRecord>,
    name_index: AHashMap<String, usize>,
    /// Random number generator (deterministic)
    rng: ChaCha8Rng,
    last_step: Option<Step>,
    /// Time of the step that failed; set once, never cleared
    halted_at: Option<Step>,
    recalibrations: u32,
}

impl World {
    /// Build a world, rejecting bad configuration before any step runs
    pub fn new(
        agents: Vec<Agent>,
        interaction: InteractionMatrix,
        escalation: EscalationCoeffs,
        config: &RunConfig,
        rng: ChaCha8Rng,
    ) -> Result<Self> {
        if agents.len() < 2 {
            return Err(SimError::invalid(format!(
                "at least two agents are required, got {}",
                agents.len()
            )));
        }
        if interaction.size() != agents.len() {
            return Err(SimError::MatrixShape {
                expected: agents.len(),
                rows: interaction.size(),
                row: 0,
                len: interaction.size(),
            });
        }
        escalation.validate()?;
        config.recalibration.validate()?;
        config.learning.validate()?;

        let mut name_index = AHashMap::with_capacity(agents.len());
        for (i, agent) in agents.iter().enumerate() {
            if name_index.insert(agent.name().to_string(), i).is_some() {
                return Err(SimError::invalid(format!("duplicate agent name '{}'", agent.name())));
            }
        }

        let window = if config.recalibration.enabled() {
            config.recalibration.window
        } else {
            0
        };

        Ok(Self {
            agents,
            interaction,
            escalation,
            doctrine_update_every: config.doctrine_update_every,
            recalibration: config.recalibration.clone(),
            learning: config.learning.clone(),
            agent_samples: SampleWindow::new(window),
            edge_samples: SampleWindow::new(window),
            history: Vec::new(),
            name_index,
            rng,
            last_step: None,
            halted_at: None,
            recalibrations: 0,
        })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.name_index.get(name).map(|&i| &self.agents[i])
    }

    pub fn agent_index(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    pub fn interaction(&self) -> &InteractionMatrix {
        &self.interaction
    }

    pub fn escalation(&self) -> &EscalationCoeffs {
        &self.escalation
    }

    pub fn history(&self) -> &[StepRecord] {
        &self.history
    }

    pub fn into_history(self) -> Vec<StepRecord> {
        self.history
    }

    pub fn last_step(&self) -> Option<Step> {
        self.last_step
    }

    /// Time of the failed step that halted the world, if any
    pub fn halted_at(&self) -> Option<Step> {
        self.halted_at
    }

    pub fn recalibrations(&self) -> u32 {
        self.recalibrations
    }

    /// Buffered (agent-level, edge-level) training row counts
    pub fn buffered_samples(&self) -> (usize, usize) {
        (self.agent_samples.len(), self.edge_samples.len())
    }

    pub fn snapshot(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(Agent::snapshot).collect()
    }

    /// Run steps `next..next + steps`, continuing after the last step taken
    pub fn run(&mut self, steps: u64) -> Result<()> {
        let start = self.last_step.map_or(0, |t| t + 1);
        for t in start..start + steps {
            self.step(t)?;
        }
        Ok(())
    }

    /// Advance the world by one step at time `t`
    ///
    /// `t` must be greater than the previous step's time. An out-of-order
    /// `t` is refused without touching any state. Any other error halts the
    /// world: the failed step may have been partly applied, so every later
    /// call returns `SimError::Halted`.
    pub fn step(&mut self, t: Step) -> Result<&StepRecord> {
        if let Some(step) = self.halted_at {
            return Err(SimError::Halted { step });
        }
        if let Some(last) = self.last_step {
            if t <= last {
                return Err(SimError::StepOrder { last, requested: t });
            }
        }

        if let Err(e) = self.advance(t) {
            tracing::warn!(step = t, error = %e, "step failed, world halted");
            self.halted_at = Some(t);
            return Err(e);
        }

        let last = self.history.len() - 1;
        Ok(&self.history[last])
    }

    fn advance(&mut self, t: Step) -> Result<()> {
        // Phase 1: decisions. Nothing but the generator is mutated until
        // every intent is known to be finite.
        let intents = self.decide()?;

        let entries: Vec<AgentStepEntry> = self
            .agents
            .iter()
            .zip(&intents)
            .map(|(agent, intent)| AgentStepEntry {
                agent: agent.name().to_string(),
                action: intent.decision.action,
                target: self.agents[intent.target].name().to_string(),
                tension: agent.tension(),
                resource: agent.resource(),
                psi: intent.psi,
            })
            .collect();

        for (agent, intent) in self.agents.iter_mut().zip(&intents) {
            if agent.record_action(intent.decision.action, self.doctrine_update_every) {
                tracing::debug!(
                    agent = agent.name(),
                    action = %intent.decision.action,
                    "doctrine drift applied"
                );
            }
        }

        // Phase 2: dyadic crisis resolution
        let dyad_tension = self.dyad_tension(&intents);
        let (edges, involved) = self.resolve_edges(&intents);
        let global_escalation = involved.iter().any(|&x| x);

        if self.recalibration.enabled() {
            for ((agent, intent), &hit) in self.agents.iter().zip(&intents).zip(&involved) {
                let row = agent.features(intent.decision.action).row();
                self.agent_samples.push(row, if hit { 1.0 } else { 0.0 });
            }
        }

        let recalibrated = self.maybe_recalibrate(t)?;

        // Phase 3: learning and state update
        for ((agent, intent), &hit) in self.agents.iter_mut().zip(&intents).zip(&involved) {
            let action = intent.decision.action;
            let p_success = self.learning.success_probability(action, hit);
            let success = self.rng.gen::<f64>() < p_success;
            agent.update_beliefs(action, success, hit, &self.learning);
            agent.update_state(intent.decision.expected_utility(), intent.psi, action);
        }

        let record = StepRecord {
            time: t,
            agents: entries,
            dyad_tension,
            edges,
            global_escalation,
            recalibrated,
        };

        tracing::debug!(
            step = t,
            crises = record.crisis_count(),
            global_escalation,
            recalibrated,
            "step complete"
        );

        self.last_step = Some(t);
        self.history.push(record);
        Ok(())
    }

    fn decide(&mut self) -> Result<Vec<Intent>> {
        let mut intents = Vec::with_capacity(self.agents.len());
        for (i, agent) in self.agents.iter().enumerate() {
            let decision = agent.choose_action(&mut self.rng)?;
            let psi = agent.escalation_probability(decision.action, &self.escalation);
            let target = self.interaction.pick_target(i, &mut self.rng).ok_or_else(|| {
                SimError::invalid(format!("agent '{}' has no possible target", agent.name()))
            })?;

            let finite = psi.is_finite()
                && decision.utilities.iter().all(|u| u.is_finite())
                && decision.probabilities.iter().all(|p| p.is_finite());
            if !finite {
                return Err(SimError::Numerical(format!(
                    "agent '{}' produced non-finite decision values (psi {psi}, utilities {:?})",
                    agent.name(),
                    decision.utilities
                )));
            }

            intents.push(Intent { decision, psi, target });
        }
        Ok(intents)
    }

    /// Diagnostic tension for every ordered pair; never drives state
    fn dyad_tension(&self, intents: &[Intent]) -> Vec<DyadTension> {
        let n = self.agents.len();
        let mut out = Vec::with_capacity(n * (n - 1));
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                out.push(DyadTension {
                    source: self.agents[i].name().to_string(),
                    target: self.agents[j].name().to_string(),
                    value: self.escalation.dyadic_probability(
                        intents[i].psi,
                        intents[j].psi,
                        self.interaction.get(i, j),
                    ),
                });
            }
        }
        out
    }

    /// Draw a crisis on each chosen edge; returns the edges and per-agent
    /// crisis involvement (as source or target)
    fn resolve_edges(&mut self, intents: &[Intent]) -> (Vec<EdgeOutcome>, Vec<bool>) {
        let n = self.agents.len();
        let mut edges = Vec::with_capacity(n);
        let mut involved = vec![false; n];

        for (i, intent) in intents.iter().enumerate() {
            let j = intent.target;
            let psi_i = intent.psi;
            let psi_j = intents[j].psi;
            let w_signed = self.interaction.get(i, j);

            let probability = self.escalation.dyadic_probability(psi_i, psi_j, w_signed);
            let crisis = self.rng.gen::<f64>() < probability;

            if self.recalibration.enabled() {
                let w01 = signed_to_weight01(w_signed);
                let row = [psi_i, psi_j, psi_i * psi_j, w01 - 0.5, 1.0];
                self.edge_samples.push(row, if crisis { 1.0 } else { 0.0 });
            }

            if crisis {
                involved[i] = true;
                involved[j] = true;
            }

            edges.push(EdgeOutcome {
                source: self.agents[i].name().to_string(),
                target: self.agents[j].name().to_string(),
                probability,
                crisis,
            });
        }

        (edges, involved)
    }

    /// Refit the escalation coefficients when the period is reached and
    /// both windows hold enough rows. Too few rows is a silent skip.
    fn maybe_recalibrate(&mut self, t: Step) -> Result<bool> {
        let every = self.recalibration.every;
        if every == 0 || t == 0 || t % every != 0 {
            return Ok(false);
        }

        let min = self.recalibration.min_samples;
        if self.agent_samples.len() < min || self.edge_samples.len() < min {
            tracing::debug!(
                step = t,
                agent_rows = self.agent_samples.len(),
                edge_rows = self.edge_samples.len(),
                min_samples = min,
                "skipping recalibration, not enough samples"
            );
            return Ok(false);
        }

        let params = FitParams::from(&self.recalibration);
        let agent_weights = fit_logistic_map(
            self.agent_samples.as_slice(),
            self.escalation.agent_weights(),
            &params,
        )?;
        let edge_weights = fit_logistic_map(
            self.edge_samples.as_slice(),
            self.escalation.edge_weights(),
            &params,
        )?;

        self.escalation.set_agent_weights(&agent_weights);
        self.escalation.set_edge_weights(&edge_weights);
        self.recalibrations += 1;

        tracing::info!(
            step = t,
            agent_rows = self.agent_samples.len(),
            edge_rows = self.edge_samples.len(),
            eta = ?edge_weights,
            "escalation coefficients recalibrated"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentConfig;
    use crate::model::{ActionBases, StateDynamicsCoeffs};
    use rand::SeedableRng;
    use std::sync::Arc;

    fn agents(names: &[&str]) -> Vec<Agent> {
        let bases = Arc::new(ActionBases::default());
        let dynamics = Arc::new(StateDynamicsCoeffs::default());
        names
            .iter()
            .map(|n| Agent::new(&AgentConfig::named(*n), bases.clone(), dynamics.clone()).unwrap())
            .collect()
    }

    fn rivals(config: &RunConfig, seed: u64) -> World {
        let matrix = InteractionMatrix::new(&[vec![0.0, -1.0], vec![-1.0, 0.0]], 2).unwrap();
        World::new(
            agents(&["A", "B"]),
            matrix,
            EscalationCoeffs::default(),
            config,
            ChaCha8Rng::seed_from_u64(seed),
        )
        .unwrap()
    }

    #[test]
    fn test_world_rejects_single_agent() {
        let result = World::new(
            agents(&["Solo"]),
            InteractionMatrix::neutral(1),
            EscalationCoeffs::default(),
            &RunConfig::default(),
            ChaCha8Rng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_world_rejects_duplicate_names() {
        let result = World::new(
            agents(&["A", "A"]),
            InteractionMatrix::neutral(2),
            EscalationCoeffs::default(),
            &RunConfig::default(),
            ChaCha8Rng::seed_from_u64(1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_world_rejects_matrix_size_mismatch() {
        let result = World::new(
            agents(&["A", "B"]),
            InteractionMatrix::neutral(3),
            EscalationCoeffs::default(),
            &RunConfig::default(),
            ChaCha8Rng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(SimError::MatrixShape { expected: 2, .. })));
    }

    #[test]
    fn test_step_produces_complete_record() {
        let mut world = rivals(&RunConfig::default(), 5);
        let record = world.step(0).unwrap().clone();
        assert_eq!(record.time, 0);
        assert_eq!(record.agents.len(), 2);
        assert_eq!(record.edges.len(), 2);
        assert_eq!(record.dyad_tension.len(), 2);
        // with two agents each must target the other
        assert_eq!(record.agents[0].target, "B");
        assert_eq!(record.agents[1].target, "A");
        assert_eq!(record.global_escalation, record.crisis_count() > 0);
    }

    #[test]
    fn test_steps_must_increase() {
        let mut world = rivals(&RunConfig::default(), 5);
        world.step(3).unwrap();
        assert!(matches!(world.step(3), Err(SimError::StepOrder { last: 3, requested: 3 })));
        assert!(world.step(4).is_ok());
        world.run(2).unwrap();
        assert_eq!(world.last_step(), Some(6));
        assert_eq!(world.history().len(), 4);
    }

    #[test]
    fn test_buffers_respect_window() {
        let config = RunConfig {
            recalibration: RecalibrationConfig {
                every: 1000,
                window: 15,
                min_samples: 15,
                ..RecalibrationConfig::default()
            },
            ..RunConfig::default()
        };
        let mut world = rivals(&config, 9);
        world.run(30).unwrap();
        assert_eq!(world.buffered_samples(), (15, 15));
        assert_eq!(world.recalibrations(), 0);
    }

    #[test]
    fn test_disabled_recalibration_buffers_nothing() {
        let config = RunConfig {
            recalibration: RecalibrationConfig::disabled(),
            ..RunConfig::default()
        };
        let mut world = rivals(&config, 9);
        world.run(20).unwrap();
        assert_eq!(world.buffered_samples(), (0, 0));
        assert_eq!(world.escalation(), &EscalationCoeffs::default());
    }

    #[test]
    fn test_recalibration_fires_on_period() {
        let config = RunConfig {
            recalibration: RecalibrationConfig {
                every: 5,
                min_samples: 10,
                ..RecalibrationConfig::default()
            },
            ..RunConfig::default()
        };
        let mut world = rivals(&config, 21);
        world.run(5).unwrap();
        // 10 rows each after steps 0..=4, first eligible step is 5
        assert_eq!(world.recalibrations(), 0);
        let record = world.step(5).unwrap();
        assert!(record.recalibrated);
        assert_eq!(world.recalibrations(), 1);
        assert_ne!(world.escalation(), &EscalationCoeffs::default());
        assert!(world.escalation().validate().is_ok());
    }

    #[test]
    fn test_failed_refit_halts_world() {
        let config = RunConfig {
            doctrine_update_every: 1,
            recalibration: RecalibrationConfig {
                every: 5,
                min_samples: 4,
                ..RecalibrationConfig::default()
            },
            ..RunConfig::default()
        };
        let mut world = rivals(&config, 13);
        world.run(5).unwrap();

        // past validation: the prior term alone now overshoots every iteration
        world.recalibration.learning_rate = 1e6;
        let before = world.escalation().clone();

        let err = world.step(5).unwrap_err();
        assert!(matches!(err, SimError::Numerical(_)));
        assert_eq!(world.escalation(), &before);
        assert_eq!(world.recalibrations(), 0);
        assert_eq!(world.halted_at(), Some(5));
        assert_eq!(world.last_step(), Some(4));
        assert_eq!(world.history().len(), 5);

        let counts: Vec<_> = world.agents().iter().map(Agent::action_counts).collect();
        let doctrine: Vec<_> = world.agents().iter().map(|a| *a.doctrine()).collect();

        assert!(matches!(world.step(5), Err(SimError::Halted { step: 5 })));
        assert!(matches!(world.step(6), Err(SimError::Halted { step: 5 })));
        assert!(matches!(world.run(3), Err(SimError::Halted { step: 5 })));

        let counts_after: Vec<_> = world.agents().iter().map(Agent::action_counts).collect();
        let doctrine_after: Vec<_> = world.agents().iter().map(|a| *a.doctrine()).collect();
        assert_eq!(counts, counts_after);
        assert_eq!(doctrine, doctrine_after);
        assert_eq!(world.history().len(), 5);
    }

    #[test]
    fn test_out_of_order_step_does_not_halt() {
        let mut world = rivals(&RunConfig::default(), 2);
        world.run(3).unwrap();
        assert!(world.step(1).is_err());
        assert_eq!(world.halted_at(), None);
        assert!(world.step(3).is_ok());
    }

    #[test]
    fn test_lookup_by_name() {
        let world = rivals(&RunConfig::default(), 1);
        assert_eq!(world.agent_index("B"), Some(1));
        assert_eq!(world.agent("A").map(Agent::name), Some("A"));
        assert!(world.agent("Z").is_none());
    }
}
