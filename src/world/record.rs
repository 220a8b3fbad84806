//! Per-step output records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{ActionKind, Step};

/// What one agent did in a step, with its state before the update
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentStepEntry {
    pub agent: String,
    pub action: ActionKind,
    pub target: String,
    pub tension: f64,
    pub resource: f64,
    /// Escalation probability of the chosen action
    pub psi: f64,
}

/// Diagnostic dyadic tension for one ordered pair
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DyadTension {
    pub source: String,
    pub target: String,
    pub value: f64,
}

/// Resolved crisis draw on a chosen edge
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeOutcome {
    pub source: String,
    pub target: String,
    pub probability: f64,
    pub crisis: bool,
}

/// Cell of the flat column view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlatValue {
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub time: Step,
    /// One entry per agent, in world order
    pub agents: Vec<AgentStepEntry>,
    /// Every ordered pair of distinct agents
    pub dyad_tension: Vec<DyadTension>,
    /// One edge per agent: the agent and the target it picked
    pub edges: Vec<EdgeOutcome>,
    pub global_escalation: bool,
    /// Whether escalation coefficients were refit during this step
    pub recalibrated: bool,
}

impl StepRecord {
    pub fn entry(&self, agent: &str) -> Option<&AgentStepEntry> {
        self.agents.iter().find(|e| e.agent == agent)
    }

    pub fn crisis_count(&self) -> usize {
        self.edges.iter().filter(|e| e.crisis).count()
    }

    pub fn mean_crisis_probability(&self) -> Option<f64> {
        if self.edges.is_empty() {
            return None;
        }
        Some(self.edges.iter().map(|e| e.probability).sum::<f64>() / self.edges.len() as f64)
    }

    /// Column view keyed like a wide table row
    ///
    /// `Crisis_*` and `CrisisProb_*` cover every ordered pair (self pairs
    /// included) and read 0 where no edge was drawn.
    pub fn to_flat(&self) -> BTreeMap<String, FlatValue> {
        let mut row = BTreeMap::new();
        row.insert("Time".to_string(), FlatValue::Int(self.time as i64));

        for src in &self.agents {
            for dst in &self.agents {
                row.insert(format!("Crisis_{}_{}", src.agent, dst.agent), FlatValue::Int(0));
                row.insert(format!("CrisisProb_{}_{}", src.agent, dst.agent), FlatValue::Float(0.0));
            }
        }

        for e in &self.agents {
            let name = &e.agent;
            row.insert(format!("Action_{name}"), FlatValue::Text(e.action.label().to_string()));
            row.insert(format!("Target_{name}"), FlatValue::Text(e.target.clone()));
            row.insert(format!("Tension_{name}"), FlatValue::Float(e.tension));
            row.insert(format!("Resource_{name}"), FlatValue::Float(e.resource));
            row.insert(format!("Psi_{name}"), FlatValue::Float(e.psi));
        }

        for d in &self.dyad_tension {
            row.insert(format!("DyadTension_{}_{}", d.source, d.target), FlatValue::Float(d.value));
        }

        for edge in &self.edges {
            let pair = format!("{}_{}", edge.source, edge.target);
            let crisis = FlatValue::Int(i64::from(edge.crisis));
            row.insert(format!("PsiEdge_{pair}"), FlatValue::Float(edge.probability));
            row.insert(format!("Y_{pair}"), crisis.clone());
            row.insert(format!("CrisisProb_{pair}"), FlatValue::Float(edge.probability));
            row.insert(format!("Crisis_{pair}"), crisis);
        }

        row.insert(
            "Global_Escalation".to_string(),
            FlatValue::Int(i64::from(self.global_escalation)),
        );
        row
    }
}
