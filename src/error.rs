use std::path::PathBuf;

use thiserror::Error;

/// Main error type for agent evaluation and ensemble selection
#[derive(Error, Debug)]
pub enum EnsembleError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Unknown agent identifier: {0}")]
    UnknownAgent(String),

    #[error("Invalid configuration for agent {agent}: {reason}")]
    Configuration { agent: String, reason: String },

    #[error("Fail to read arguments: missing key '{key}' in model kwargs")]
    MissingKwarg { key: String },

    #[error("Fail to read arguments: key '{key}' has invalid value ({reason})")]
    InvalidKwarg { key: String, reason: String },

    #[error("Benchmark too short: need at least {required} values, got {actual}")]
    BenchmarkTooShort { required: usize, actual: usize },

    #[error("Trajectory length mismatch: agent {agent} has {actual} values, expected {expected}")]
    TrajectoryMismatch {
        agent: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Benchmark value at step {step} is not finite")]
    NonFiniteBenchmark { step: usize },

    #[error("Invalid market data: {0}")]
    InvalidMarketData(String),

    // Load errors
    #[error("Fail to load agent {agent} from {path:?}: {reason}")]
    Load {
        agent: String,
        path: PathBuf,
        reason: String,
    },

    // Computation errors
    #[error("Zero variance in returns of agent {agent} at chunk {chunk}")]
    ZeroVariance { agent: usize, chunk: usize },

    #[error("Division by zero: agent {agent} has zero total asset at step {step}")]
    DivideByZero { agent: usize, step: usize },

    #[error("Non-finite returns or Sharpe ratio for agent {agent} at chunk {chunk}")]
    NonFiniteScore { agent: usize, chunk: usize },

    #[error("No agent produced a usable Sharpe ratio at chunk {chunk}")]
    NoSignal { chunk: usize },

    #[error("Policy error: {0}")]
    Policy(String),

    // Environment errors
    #[error("Environment error: {0}")]
    Environment(String),

    // Training errors (external trainer)
    #[error("Training failed: {0}")]
    Training(#[from] anyhow::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EnsembleError {
    /// True for the configuration class of failures (bad identifiers, kwargs, inputs)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EnsembleError::Config(_)
                | EnsembleError::UnknownAgent(_)
                | EnsembleError::Configuration { .. }
                | EnsembleError::MissingKwarg { .. }
                | EnsembleError::InvalidKwarg { .. }
                | EnsembleError::BenchmarkTooShort { .. }
                | EnsembleError::TrajectoryMismatch { .. }
                | EnsembleError::NonFiniteBenchmark { .. }
                | EnsembleError::InvalidMarketData(_)
        )
    }

    /// True for degenerate statistics during scoring
    pub fn is_computation(&self) -> bool {
        matches!(
            self,
            EnsembleError::ZeroVariance { .. }
                | EnsembleError::DivideByZero { .. }
                | EnsembleError::NonFiniteScore { .. }
                | EnsembleError::NoSignal { .. }
        )
    }
}

/// Result type alias for EnsembleError
pub type Result<T> = std::result::Result<T, EnsembleError>;
