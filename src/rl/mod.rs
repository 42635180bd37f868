//! Reinforcement Learning Module
//!
//! Evaluation and ensembling of trained DRL trading agents.
//!
//! # Features
//!
//! - **Agents**: DDPG, TD3, SAC (off-policy) and PPO, A2C (on-policy)
//! - **Environment**: multi-stock trading with costs and a turbulence guard
//! - **Runner**: deterministic replay of exported actors
//! - **Ensemble**: per-window selection by Sharpe ratio against a benchmark
//!
//! Training is delegated to an external framework through [`training::Trainer`].

pub mod config;
pub mod core;
pub mod ensemble;
pub mod environment;
pub mod networks;
pub mod training;

// Config exports
pub use config::{AgentArgs, EnsembleConfig, ModelKwargs, ZeroVariancePolicy};

// Core exports
pub use core::AgentKind;

// Ensemble exports
pub use ensemble::{
    drl_prediction, drl_prediction_ensemble, select_ensemble, AgentSpec, EnsembleOutcome,
    EnsembleReport, EpisodeTrajectory,
};

// Environment exports
pub use environment::{
    generate_sample_data, MarketConfig, MarketData, StepOutcome, StockTradingEnvironment,
    TradingEnv, TradingEnvConfig,
};

// Training exports
pub use training::{Checkpointer, DrlEnsembleAgent, Trainer};
