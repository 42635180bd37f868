//! Training Orchestration
//!
//! Builds training arguments for an agent kind and hands them to an
//! external trainer. The learning algorithms themselves live behind the
//! `Trainer` trait.

use std::path::Path;

use tracing::info;

use super::checkpointing::Checkpointer;
use crate::error::{EnsembleError, Result};
use crate::rl::config::{AgentArgs, ModelKwargs};
use crate::rl::core::AgentKind;
use crate::rl::environment::{MarketData, StockTradingEnvironment, TradingEnv, TradingEnvConfig};

/// External training framework
pub trait Trainer {
    /// Train until `args.break_step` environment steps, writing the actor
    /// into `args.cwd`
    fn train_and_evaluate(&mut self, args: &AgentArgs, env: &mut dyn TradingEnv)
        -> anyhow::Result<()>;
}

/// Builds and trains agents over one market
pub struct DrlEnsembleAgent {
    market: MarketData,
    env_config: TradingEnvConfig,
}

impl DrlEnsembleAgent {
    pub fn new(market: MarketData, env_config: TradingEnvConfig) -> Self {
        Self { market, env_config }
    }

    /// Training environment configuration (training mode on)
    fn train_env_config(&self) -> TradingEnvConfig {
        TradingEnvConfig {
            if_train: true,
            ..self.env_config.clone()
        }
    }

    /// Training arguments for `kind`, overridden by `kwargs` when given
    pub fn get_model(&self, kind: AgentKind, kwargs: Option<&ModelKwargs>) -> Result<AgentArgs> {
        let mut args = AgentArgs::new(kind, self.train_env_config());
        if let Some(kwargs) = kwargs {
            args.apply_kwargs(kwargs)?;
        }
        Ok(args)
    }

    /// Resolve `cwd` and `break_step` and persist the arguments there
    pub fn prepare_model(
        &self,
        mut args: AgentArgs,
        cwd: &Path,
        total_timesteps: usize,
    ) -> Result<AgentArgs> {
        args.cwd = cwd.to_path_buf();
        args.break_step = Some(total_timesteps);
        Checkpointer::new(cwd).save_args(&args)?;
        Ok(args)
    }

    /// Train one agent with an external trainer
    pub fn train_model(
        &self,
        trainer: &mut dyn Trainer,
        args: AgentArgs,
        cwd: &Path,
        total_timesteps: usize,
    ) -> Result<AgentArgs> {
        let args = self.prepare_model(args, cwd, total_timesteps)?;
        let mut env = StockTradingEnvironment::new(self.market.clone(), args.env.clone())?;

        info!(
            "Training {} for {} steps in {:?}",
            args.agent, total_timesteps, args.cwd
        );
        trainer
            .train_and_evaluate(&args, &mut env)
            .map_err(EnsembleError::Training)?;

        Ok(args)
    }
}
