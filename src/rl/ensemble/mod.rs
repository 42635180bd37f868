//! Agent Evaluation and Ensemble Selection

pub mod runner;
pub mod selector;
pub mod stats;

pub use runner::{
    drl_prediction, drl_prediction_ensemble, run_policy, total_asset, AgentReport, AgentSpec,
    EnsembleReport, EpisodeTrajectory, SelectionReport,
};
pub use selector::{select_ensemble, ChunkSelection, EnsembleOutcome};
