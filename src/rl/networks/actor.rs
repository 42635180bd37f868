//! Actor Network (Policy)
//!
//! Deterministic action selection from an exported actor. Exploration noise
//! and log-std heads are ignored at evaluation time: the action is the
//! `tanh` of the mean head.

use std::path::{Path, PathBuf};

use crate::error::{EnsembleError, Result};
use crate::ml::{Activation, DenseNetwork};
use crate::rl::core::AgentKind;

/// A trained policy that maps a state to an action in `[-1, 1]^action_dim`
#[cfg_attr(test, mockall::automock)]
pub trait Policy {
    fn act(&self, state: &[f32]) -> Result<Vec<f32>>;
}

/// Actor loaded from the parameter store
#[derive(Debug, Clone)]
pub struct ActorPolicy {
    network: DenseNetwork,
    action_dim: usize,
}

impl ActorPolicy {
    /// Wrap a network after checking it fits `(net_dim, state_dim, action_dim)`
    pub fn new(
        kind: AgentKind,
        network: DenseNetwork,
        net_dim: usize,
        state_dim: usize,
        action_dim: usize,
    ) -> std::result::Result<Self, String> {
        network.validate()?;

        if network.input_dim != state_dim {
            return Err(format!(
                "actor input_dim {} != state_dim {state_dim}",
                network.input_dim
            ));
        }

        let expected_out = kind.actor_output_dim(action_dim);
        if network.output_dim() != expected_out {
            return Err(format!(
                "actor output_dim {} != {expected_out} for {kind} with action_dim {action_dim}",
                network.output_dim()
            ));
        }

        let hidden = network.hidden_widths();
        if hidden.is_empty() {
            return Err("actor has no hidden layer".to_string());
        }
        if let Some(width) = hidden.iter().find(|w| **w != net_dim) {
            return Err(format!("hidden width {width} != net_dim {net_dim}"));
        }

        if network.layers.last().map(|l| l.activation) != Some(Activation::Linear) {
            return Err("actor output layer must be linear".to_string());
        }

        Ok(Self {
            network,
            action_dim,
        })
    }

    /// Load an actor file, mapping every failure to a load error for `kind`
    pub fn load(
        kind: AgentKind,
        path: &Path,
        net_dim: usize,
        state_dim: usize,
        action_dim: usize,
    ) -> Result<Self> {
        let load_err = |reason: String| EnsembleError::Load {
            agent: kind.to_string(),
            path: PathBuf::from(path),
            reason,
        };

        if !path.exists() {
            return Err(load_err("actor file not found".to_string()));
        }

        let network = DenseNetwork::from_file(path).map_err(|e| load_err(e.to_string()))?;
        Self::new(kind, network, net_dim, state_dim, action_dim).map_err(load_err)
    }
}

impl Policy for ActorPolicy {
    fn act(&self, state: &[f32]) -> Result<Vec<f32>> {
        let input: Vec<f64> = state.iter().map(|v| f64::from(*v)).collect();
        let output = self.network.forward(&input)?;

        Ok(output
            .iter()
            .take(self.action_dim)
            .map(|mean| mean.tanh() as f32)
            .collect())
    }
}
