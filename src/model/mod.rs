//! Shared model parameters
//!
//! Coefficient bundles and the per-action feature basis. Agents only read
//! these; the escalation bundle is rewritten by the world after a refit.

pub mod bases;
pub mod coefficients;

pub use bases::ActionBases;
pub use coefficients::{EscalationCoeffs, StateDynamicsCoeffs, AGENT_FEATURES, EDGE_FEATURES};
