//! Core RL Types
//!
//! Agent identifiers and their capability flags.

pub mod agent_kind;

pub use agent_kind::AgentKind;
