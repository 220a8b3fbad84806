pub mod config;
pub mod error;
pub mod math;
pub mod types;

pub use config::{LearningConfig, RecalibrationConfig, RunConfig};
pub use error::{Result, SimError};
pub use types::{ActionKind, PerAction, Step};
