//! Environment contract consumed by the agent runner.

use crate::error::Result;

/// Per-step diagnostics returned alongside the reward
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepInfo {
    /// Cash after the step
    pub cash: f64,
    /// Total asset after the step
    pub total_asset: f64,
    /// Whether the turbulence guard liquidated holdings this step
    pub turbulence_triggered: bool,
}

/// Result of taking a step in the environment
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// New state after the action
    pub state: Vec<f32>,
    /// Reward signal
    pub reward: f64,
    /// Whether the episode is over
    pub done: bool,
    /// Additional info
    pub info: StepInfo,
}

/// Gym-like trading environment.
///
/// The runner reads `cash`, `stocks`, `price_array` and `time` after every
/// step to compute the total asset itself, so implementations must keep
/// those fields consistent with the executed trades.
pub trait TradingEnv {
    /// Reset to the first step and return the initial state
    fn reset(&mut self) -> Vec<f32>;

    /// Apply an action and advance one step
    fn step(&mut self, action: &[f32]) -> Result<StepOutcome>;

    fn state_dim(&self) -> usize;

    fn action_dim(&self) -> usize;

    /// Upper bound on steps per episode
    fn max_step(&self) -> usize;

    /// Total asset at reset
    fn initial_total_asset(&self) -> f64;

    /// Current cash
    fn cash(&self) -> f64;

    /// Current holdings, one entry per stock
    fn stocks(&self) -> &[f64];

    /// Prices `[T][N]`
    fn price_array(&self) -> &[Vec<f64>];

    /// Current step index into `price_array`
    fn time(&self) -> usize;
}
