//! Simulation output and serialization

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::AgentSnapshot;
use crate::core::error::Result;
use crate::core::types::ActionKind;
use crate::model::EscalationCoeffs;
use crate::world::{FlatValue, StepRecord, World};

/// Complete simulation output
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub scenario: String,
    pub seed: u64,
    pub initial: Vec<AgentSnapshot>,
    #[serde(rename = "final")]
    pub final_state: Vec<AgentSnapshot>,
    pub history: Vec<StepRecord>,
    /// Escalation coefficients at the end of the run
    pub escalation: EscalationCoeffs,
    pub statistics: SimulationStats,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationStats {
    pub steps_simulated: u64,
    pub simulation_time_ms: u64,
    /// Steps in which at least one edge fired
    pub escalation_steps: u64,
    pub crisis_events: u64,
    pub recalibrations: u32,
    pub mean_crisis_probability: f64,
    pub action_counts: Vec<ActionCounts>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionCounts {
    pub agent: String,
    pub patrol: u32,
    pub signal: u32,
    pub reinforce: u32,
}

impl SimulationOutput {
    pub fn new(
        scenario: String,
        seed: u64,
        initial: Vec<AgentSnapshot>,
        world: World,
        elapsed: Duration,
    ) -> Self {
        let final_state = world.snapshot();
        let escalation = world.escalation().clone();
        let recalibrations = world.recalibrations();
        let action_counts = world
            .agents()
            .iter()
            .map(|a| {
                let counts = a.action_counts();
                ActionCounts {
                    agent: a.name().to_string(),
                    patrol: counts[ActionKind::Patrol],
                    signal: counts[ActionKind::Signal],
                    reinforce: counts[ActionKind::Reinforce],
                }
            })
            .collect();

        let history = world.into_history();
        let escalation_steps = history.iter().filter(|r| r.global_escalation).count() as u64;
        let crisis_events = history.iter().map(|r| r.crisis_count() as u64).sum();
        let (prob_sum, prob_n) = history
            .iter()
            .flat_map(|r| r.edges.iter())
            .fold((0.0, 0usize), |(s, n), e| (s + e.probability, n + 1));

        Self {
            scenario,
            seed,
            initial,
            final_state,
            statistics: SimulationStats {
                steps_simulated: history.len() as u64,
                simulation_time_ms: elapsed.as_millis() as u64,
                escalation_steps,
                crisis_events,
                recalibrations,
                mean_crisis_probability: if prob_n > 0 { prob_sum / prob_n as f64 } else { 0.0 },
                action_counts,
            },
            history,
            escalation,
        }
    }

    /// Wide-table rows, one per step
    pub fn flat_history(&self) -> Vec<BTreeMap<String, FlatValue>> {
        self.history.iter().map(StepRecord::to_flat).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn summary(&self) -> String {
        let mut out = format!(
            "Scenario '{}' (seed {}): simulated {} steps in {}ms\n{} crisis events over {} escalated steps, mean crisis probability {:.3}, {} recalibrations",
            self.scenario,
            self.seed,
            self.statistics.steps_simulated,
            self.statistics.simulation_time_ms,
            self.statistics.crisis_events,
            self.statistics.escalation_steps,
            self.statistics.mean_crisis_probability,
            self.statistics.recalibrations,
        );
        for (counts, end) in self.statistics.action_counts.iter().zip(&self.final_state) {
            out.push_str(&format!(
                "\n  {}: P={} S={} R={} | tension {:.3} resource {:.1}",
                counts.agent, counts.patrol, counts.signal, counts.reinforce, end.tension, end.resource,
            ));
        }
        out
    }
}
