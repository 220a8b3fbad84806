use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Interaction matrix shape mismatch: expected {expected}x{expected}, got {rows} rows (row {row} has {len} columns)")]
    MatrixShape {
        expected: usize,
        rows: usize,
        row: usize,
        len: usize,
    },

    #[error("Steps must be strictly increasing: last step was {last}, requested {requested}")]
    StepOrder { last: u64, requested: u64 },

    #[error("World halted after step {step} failed; no further steps can run")]
    Halted { step: u64 },

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl SimError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Reject NaN and infinities in a named configuration field.
pub fn ensure_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!("{field} must be finite, got {value}")))
    }
}
