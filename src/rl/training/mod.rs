//! Training Infrastructure
//!
//! Argument preparation for the external trainer and the agent parameter store.

pub mod checkpointing;
pub mod trainer;

pub use checkpointing::{timestamped_name, Checkpointer};
pub use trainer::{DrlEnsembleAgent, Trainer};
