pub mod cli;
pub mod config;
pub mod error;
pub mod ml;
pub mod rl;

pub use config::AppConfig;
pub use error::{EnsembleError, Result};
pub use rl::{
    drl_prediction, drl_prediction_ensemble, select_ensemble, AgentKind, AgentSpec,
    EnsembleConfig, EnsembleReport,
};
