//! RL Configuration
//!
//! Training arguments handed to the external trainer, and the knobs of the
//! ensemble selector.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EnsembleError, Result};
use crate::rl::core::AgentKind;
use crate::rl::environment::TradingEnvConfig;

/// Keyword mapping of hyperparameters, as read from config or JSON
pub type ModelKwargs = serde_json::Map<String, Value>;

/// Keys every non-empty kwargs mapping must provide
pub const REQUIRED_KWARGS: [&str; 7] = [
    "learning_rate",
    "batch_size",
    "gamma",
    "seed",
    "net_dimension",
    "target_step",
    "eval_time_gap",
];

/// Arguments for one training run of one agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentArgs {
    /// Agent kind
    pub agent: AgentKind,
    /// Mirrors `agent.is_off_policy()`; kept for the trainer's convenience
    pub if_off_policy: bool,
    /// Optimizer learning rate
    pub learning_rate: f64,
    /// Mini-batch size
    pub batch_size: usize,
    /// Discount factor
    pub gamma: f64,
    /// Random seed
    pub seed: u64,
    /// Hidden layer width of actor and critic
    pub net_dim: usize,
    /// Environment steps collected per update
    pub target_step: usize,
    /// Seconds between evaluations
    pub eval_gap: u64,
    /// Replay buffer capacity
    pub max_memo: usize,
    /// Gradient passes per update
    pub repeat_times: usize,
    /// Working directory for checkpoints
    pub cwd: PathBuf,
    /// Stop after this many environment steps; unbounded when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_step: Option<usize>,
    /// Training environment configuration
    pub env: TradingEnvConfig,
}

impl AgentArgs {
    /// Framework defaults for an agent kind
    pub fn new(agent: AgentKind, env: TradingEnvConfig) -> Self {
        let net_dim = 1 << 8;
        let if_off_policy = agent.is_off_policy();

        let (batch_size, target_step, max_memo, repeat_times) = if if_off_policy {
            (net_dim, 1 << 10, 1 << 21, 1)
        } else {
            (net_dim * 2, 1 << 12, 1 << 12, 1 << 3)
        };

        Self {
            agent,
            if_off_policy,
            learning_rate: 2f64.powi(-15),
            batch_size,
            gamma: 0.99,
            seed: 0,
            net_dim,
            target_step,
            eval_gap: 1 << 7,
            max_memo,
            repeat_times,
            cwd: PathBuf::from(format!("./{}", agent)),
            break_step: None,
            env,
        }
    }

    /// Overwrite hyperparameters from a kwargs mapping.
    ///
    /// All of `REQUIRED_KWARGS` must be present; extra keys are ignored.
    pub fn apply_kwargs(&mut self, kwargs: &ModelKwargs) -> Result<()> {
        for key in REQUIRED_KWARGS {
            kwarg(kwargs, key)?;
        }

        self.learning_rate = kwarg_f64(kwargs, "learning_rate")?;
        self.batch_size = kwarg_usize(kwargs, "batch_size")?;
        self.gamma = kwarg_f64(kwargs, "gamma")?;
        self.seed = kwarg_usize(kwargs, "seed")? as u64;
        self.net_dim = kwarg_usize(kwargs, "net_dimension")?;
        self.target_step = kwarg_usize(kwargs, "target_step")?;
        self.eval_gap = kwarg_usize(kwargs, "eval_time_gap")? as u64;

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(EnsembleError::InvalidKwarg {
                key: "gamma".to_string(),
                reason: format!("{} is outside [0, 1]", self.gamma),
            });
        }
        if self.learning_rate <= 0.0 {
            return Err(EnsembleError::InvalidKwarg {
                key: "learning_rate".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn kwarg<'a>(kwargs: &'a ModelKwargs, key: &str) -> Result<&'a Value> {
    kwargs.get(key).ok_or_else(|| EnsembleError::MissingKwarg {
        key: key.to_string(),
    })
}

fn kwarg_f64(kwargs: &ModelKwargs, key: &str) -> Result<f64> {
    kwarg(kwargs, key)?
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EnsembleError::InvalidKwarg {
            key: key.to_string(),
            reason: "expected a finite number".to_string(),
        })
}

fn kwarg_usize(kwargs: &ModelKwargs, key: &str) -> Result<usize> {
    let value = kwarg(kwargs, key)?;
    let parsed = match value.as_u64() {
        Some(v) => Some(v),
        // integral floats such as 2.0 are accepted
        None => value
            .as_f64()
            .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64)
            .map(|v| v as u64),
    };
    parsed
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| EnsembleError::InvalidKwarg {
            key: key.to_string(),
            reason: format!("expected a non-negative integer, got {value}"),
        })
}

/// What the selector does when an agent's returns have zero variance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroVariancePolicy {
    /// Abort the ensemble run with a computation error
    #[default]
    Fail,
    /// Treat the agent as having no signal for that chunk
    Skip,
}

/// Ensemble selector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Steps per selection window
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Agent whose first chunk seeds the ensemble; defaults to the second
    /// configured agent, or the first when only one is configured
    #[serde(default)]
    pub seed_agent: Option<usize>,
    #[serde(default)]
    pub zero_variance: ZeroVariancePolicy,
    /// Drop agents that fail to load or run instead of aborting the ensemble
    #[serde(default)]
    pub exclude_failed_agents: bool,
}

fn default_chunk_size() -> usize {
    200
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            seed_agent: None,
            zero_variance: ZeroVariancePolicy::default(),
            exclude_failed_agents: false,
        }
    }
}

impl EnsembleConfig {
    /// Resolve the seed agent index for `num_agents` agents
    pub fn seed_agent_index(&self, num_agents: usize) -> Result<usize> {
        let index = self
            .seed_agent
            .unwrap_or(if num_agents > 1 { 1 } else { 0 });
        if index >= num_agents {
            return Err(EnsembleError::Configuration {
                agent: index.to_string(),
                reason: format!("seed agent index out of range for {num_agents} agents"),
            });
        }
        Ok(index)
    }
}
