//! Policy Networks
//!
//! Actors used for deterministic evaluation.

pub mod actor;

pub use actor::{ActorPolicy, Policy};

#[cfg(test)]
pub use actor::MockPolicy;
