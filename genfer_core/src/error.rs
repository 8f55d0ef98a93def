use thiserror::Error;

use crate::signal::{Gender, SignalSource};

/// Per-call fusion failure. Either a full result or one of these, never both.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FusionError {
    #[error("invalid {signal} signal: {reason}")]
    InvalidSignal { signal: SignalSource, reason: String },

    #[error("insufficient signals: every signal is absent")]
    InsufficientSignals,
}

pub type FusionResult<T> = Result<T, FusionError>;

/// Configuration problems. Raised at startup, never from `infer`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid prior for {signal}: {value}")]
    InvalidPrior { signal: SignalSource, value: f64 },

    #[error("invalid {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("tie order must list each gender exactly once: {0:?}")]
    InvalidTieOrder([Gender; 3]),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
}
