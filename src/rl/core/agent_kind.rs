//! Agent Catalogue
//!
//! The fixed set of agent kinds the ensemble can evaluate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EnsembleError;

/// Agent kinds supported by the trainer and the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Deep Deterministic Policy Gradient
    Ddpg,
    /// Twin Delayed DDPG
    Td3,
    /// Soft Actor-Critic
    Sac,
    /// Proximal Policy Optimization
    Ppo,
    /// Advantage Actor-Critic
    A2c,
}

impl AgentKind {
    /// All kinds in catalogue order
    pub const ALL: [AgentKind; 5] = [
        AgentKind::Ddpg,
        AgentKind::Td3,
        AgentKind::Sac,
        AgentKind::Ppo,
        AgentKind::A2c,
    ];

    /// Lowercase identifier used in configs and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Ddpg => "ddpg",
            AgentKind::Td3 => "td3",
            AgentKind::Sac => "sac",
            AgentKind::Ppo => "ppo",
            AgentKind::A2c => "a2c",
        }
    }

    /// Whether the agent learns from a replay buffer filled by older policies
    pub fn is_off_policy(&self) -> bool {
        matches!(self, AgentKind::Ddpg | AgentKind::Td3 | AgentKind::Sac)
    }

    /// Width of the actor's final layer for a given action dimension.
    ///
    /// SAC actors emit a mean and a log-std per action dimension; the other
    /// kinds emit the action pre-activation directly.
    pub fn actor_output_dim(&self, action_dim: usize) -> usize {
        match self {
            AgentKind::Sac => action_dim * 2,
            _ => action_dim,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ddpg" => Ok(AgentKind::Ddpg),
            "td3" => Ok(AgentKind::Td3),
            "sac" => Ok(AgentKind::Sac),
            "ppo" => Ok(AgentKind::Ppo),
            "a2c" => Ok(AgentKind::A2c),
            _ => Err(EnsembleError::UnknownAgent(s.to_string())),
        }
    }
}
