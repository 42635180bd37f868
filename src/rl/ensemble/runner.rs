//! Agent Runner
//!
//! Replays trained agents deterministically against an environment and
//! stitches their trajectories into an ensemble.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::selector::{select_ensemble, ChunkSelection, EnsembleOutcome};
use super::stats::{cumulative_return, max_drawdown};
use crate::error::{EnsembleError, Result};
use crate::rl::config::EnsembleConfig;
use crate::rl::core::AgentKind;
use crate::rl::environment::TradingEnv;
use crate::rl::networks::{ActorPolicy, Policy};
use crate::rl::training::Checkpointer;

/// A trained agent to evaluate: its kind and where its parameters live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub kind: AgentKind,
    pub cwd: PathBuf,
}

/// Total-asset trajectory of one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeTrajectory {
    pub agent: AgentKind,
    /// Initial total asset followed by one value per executed step
    pub total_assets: Vec<f64>,
}

impl EpisodeTrajectory {
    /// Number of environment steps executed
    pub fn steps(&self) -> usize {
        self.total_assets.len().saturating_sub(1)
    }

    /// Final total asset over the initial total asset
    pub fn episode_return(&self) -> Option<f64> {
        cumulative_return(&self.total_assets).map(|r| r + 1.0)
    }
}

/// `cash + Σ price[time][j] * stocks[j]`
pub fn total_asset(env: &dyn TradingEnv) -> Result<f64> {
    let prices = env.price_array().get(env.time()).ok_or_else(|| {
        EnsembleError::Environment(format!("time {} is outside the price array", env.time()))
    })?;
    if prices.len() != env.stocks().len() {
        return Err(EnsembleError::Environment(format!(
            "{} prices for {} holdings",
            prices.len(),
            env.stocks().len()
        )));
    }

    let holdings: f64 = prices.iter().zip(env.stocks()).map(|(p, s)| p * s).sum();
    Ok(env.cash() + holdings)
}

/// Run a policy from reset until `done` or `max_step` steps.
///
/// Returns the total-asset trajectory, starting with the initial total asset.
pub fn run_policy(policy: &dyn Policy, env: &mut dyn TradingEnv) -> Result<Vec<f64>> {
    let mut state = env.reset();
    let mut total_assets = Vec::with_capacity(env.max_step() + 1);
    total_assets.push(env.initial_total_asset());

    for _ in 0..env.max_step() {
        let action = policy.act(&state)?;
        let outcome = env.step(&action)?;
        state = outcome.state;

        if outcome.info.turbulence_triggered {
            debug!(
                "Turbulence at step {}: holdings liquidated, cash {:.2}, total asset {:.2}",
                env.time(),
                outcome.info.cash,
                outcome.info.total_asset
            );
        }
        total_assets.push(total_asset(env)?);
        if outcome.done {
            break;
        }
    }

    Ok(total_assets)
}

/// Load one agent and replay it on `env`.
///
/// Parameters are read from the agent's directory; nothing is written.
/// When the directory holds saved training arguments their `net_dim`
/// overrides `net_dim`.
pub fn drl_prediction(
    spec: &AgentSpec,
    net_dim: usize,
    env: &mut dyn TradingEnv,
) -> Result<EpisodeTrajectory> {
    let checkpointer = Checkpointer::new(&spec.cwd);
    let net_dim = saved_net_dim(spec, &checkpointer)?.unwrap_or(net_dim);
    let policy = ActorPolicy::load(
        spec.kind,
        &checkpointer.actor_path(),
        net_dim,
        env.state_dim(),
        env.action_dim(),
    )?;

    let total_assets = run_policy(&policy, env)?;
    let trajectory = EpisodeTrajectory {
        agent: spec.kind,
        total_assets,
    };

    info!(
        "Test finished: agent={} steps={} episode_return={:.4}",
        spec.kind,
        trajectory.steps(),
        trajectory.episode_return().unwrap_or(f64::NAN)
    );

    Ok(trajectory)
}

/// Hidden width recorded in the agent's `args.toml`, if one was saved
fn saved_net_dim(spec: &AgentSpec, checkpointer: &Checkpointer) -> Result<Option<usize>> {
    if !checkpointer.args_path().exists() {
        return Ok(None);
    }

    let args = checkpointer.load_args()?;
    if args.agent != spec.kind {
        return Err(EnsembleError::Configuration {
            agent: spec.kind.to_string(),
            reason: format!("{:?} holds arguments for {}", spec.cwd, args.agent),
        });
    }
    Ok(Some(args.net_dim))
}

/// Per-agent line of an ensemble report
#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub kind: AgentKind,
    pub cwd: PathBuf,
    pub final_asset: f64,
    pub episode_return: Option<f64>,
    pub max_drawdown: f64,
}

/// A selection record with the agent kind resolved
#[derive(Debug, Clone, Serialize)]
pub struct SelectionReport {
    pub chunk: usize,
    pub agent: AgentKind,
    pub agent_index: usize,
    pub scores: Vec<Option<f64>>,
}

/// Full result of an ensemble run
#[derive(Debug, Clone, Serialize)]
pub struct EnsembleReport {
    /// Agents that were evaluated, in selection order
    pub agents: Vec<AgentReport>,
    /// Agents excluded because they failed to load or run
    pub excluded: Vec<AgentSpec>,
    pub seed_agent: AgentKind,
    pub selections: Vec<SelectionReport>,
    pub total_assets: Vec<f64>,
    pub cumulative_return: Option<f64>,
    pub max_drawdown: f64,
}

impl EnsembleReport {
    fn new(
        agents: &[(AgentSpec, EpisodeTrajectory)],
        excluded: Vec<AgentSpec>,
        outcome: EnsembleOutcome,
    ) -> Self {
        let kind_of = |index: usize| agents[index].0.kind;

        let selections = outcome
            .selections
            .into_iter()
            .map(|ChunkSelection { chunk, agent_index, scores }| SelectionReport {
                chunk,
                agent: kind_of(agent_index),
                agent_index,
                scores,
            })
            .collect();

        Self {
            agents: agents
                .iter()
                .map(|(spec, trajectory)| AgentReport {
                    kind: spec.kind,
                    cwd: spec.cwd.clone(),
                    final_asset: trajectory.total_assets.last().copied().unwrap_or(0.0),
                    episode_return: trajectory.episode_return(),
                    max_drawdown: max_drawdown(&trajectory.total_assets),
                })
                .collect(),
            excluded,
            seed_agent: kind_of(outcome.seed_agent),
            selections,
            cumulative_return: cumulative_return(&outcome.total_assets),
            max_drawdown: max_drawdown(&outcome.total_assets),
            total_assets: outcome.total_assets,
        }
    }
}

/// Evaluate every agent in order on the shared environment, then select.
///
/// Agents run one after another; the environment is reset before each run.
/// A failing agent aborts the run unless `config.exclude_failed_agents` is
/// set, in which case it is logged and left out of the selection. Agent
/// indices in selector errors and in `SelectionReport::agent_index` then
/// refer to `EnsembleReport::agents`, not to `specs`.
pub fn drl_prediction_ensemble(
    specs: &[AgentSpec],
    net_dim: usize,
    env: &mut dyn TradingEnv,
    base_returns: &[f64],
    config: &EnsembleConfig,
) -> Result<EnsembleReport> {
    let mut evaluated = Vec::with_capacity(specs.len());
    let mut excluded = Vec::new();

    for spec in specs {
        match drl_prediction(spec, net_dim, env) {
            Ok(trajectory) => evaluated.push((spec.clone(), trajectory)),
            Err(e) if config.exclude_failed_agents => {
                warn!("Excluding agent {} ({:?}): {}", spec.kind, spec.cwd, e);
                excluded.push(spec.clone());
            }
            Err(e) => return Err(e),
        }
    }

    let trajectories: Vec<Vec<f64>> = evaluated
        .iter()
        .map(|(_, t)| t.total_assets.clone())
        .collect();
    let outcome = select_ensemble(&trajectories, base_returns, config)?;

    info!(
        "Ensemble finished: {} agents, {} chunks, final asset {:.2}",
        evaluated.len(),
        outcome.selections.len() + 1,
        outcome.total_assets.last().copied().unwrap_or(0.0)
    );

    Ok(EnsembleReport::new(&evaluated, excluded, outcome))
}
