//! Crisis Sim - multi-agent strategic escalation simulation
//!
//! Agents choose among Patrol, Signal and Reinforce, target each other over
//! a signed interaction network and learn from the crises that follow. The
//! shared escalation coefficients are periodically refit from a bounded
//! window of observations.

pub mod agent;
pub mod core;
pub mod fitter;
pub mod model;
pub mod output;
pub mod scenario;
pub mod simulation;
pub mod world;

pub use agent::{Agent, AgentConfig, AgentSnapshot};
pub use crate::core::error::{Result, SimError};
pub use crate::core::types::ActionKind;
pub use output::SimulationOutput;
pub use scenario::Scenario;
pub use simulation::simulate;
pub use world::{StepRecord, World};
