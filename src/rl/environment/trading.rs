//! Stock Trading Environment
//!
//! Multi-stock environment with integer share trading, proportional
//! transaction costs and a turbulence guard that liquidates holdings.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::market::MarketData;
use super::traits::{StepInfo, StepOutcome, TradingEnv};
use crate::error::{EnsembleError, Result};

const CASH_SCALE: f64 = 1.0 / 4096.0; // 2^-12
const PRICE_SCALE: f64 = 1.0 / 64.0; // 2^-6
const STOCK_SCALE: f64 = 1.0 / 64.0;
const TECH_SCALE: f64 = 1.0 / 128.0; // 2^-7
const TURBULENCE_SCALE: f64 = 1.0 / 128.0;

/// Trading environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingEnvConfig {
    /// Initial cash
    pub initial_capital: f64,
    /// Shares traded for an action of magnitude 1.0
    pub max_stock: f64,
    /// Fraction of actions below which no trade happens
    pub min_stock_rate: f64,
    /// Buy cost (fraction of notional)
    pub buy_cost_pct: f64,
    /// Sell cost (fraction of notional)
    pub sell_cost_pct: f64,
    /// Reward multiplier on total-asset change
    pub reward_scaling: f64,
    /// Liquidate everything when turbulence reaches this level
    pub turbulence_thresh: f64,
    /// Randomize the starting cash on reset
    pub if_train: bool,
    /// Seed for the training-mode randomization
    pub seed: u64,
}

impl Default for TradingEnvConfig {
    fn default() -> Self {
        Self {
            initial_capital: 1_000_000.0,
            max_stock: 100.0,
            min_stock_rate: 0.1,
            buy_cost_pct: 0.001,
            sell_cost_pct: 0.001,
            reward_scaling: 1.0 / 4096.0,
            turbulence_thresh: 99.0,
            if_train: false,
            seed: 0,
        }
    }
}

/// Stock trading environment over step-indexed market arrays
pub struct StockTradingEnvironment {
    config: TradingEnvConfig,
    data: MarketData,
    time: usize,
    cash: f64,
    stocks: Vec<f64>,
    total_asset: f64,
    initial_total_asset: f64,
    rng: StdRng,
}

impl StockTradingEnvironment {
    /// Create a new environment; market data is validated first
    pub fn new(data: MarketData, config: TradingEnvConfig) -> Result<Self> {
        data.validate()?;
        if config.initial_capital <= 0.0 || config.max_stock <= 0.0 {
            return Err(EnsembleError::Environment(
                "initial_capital and max_stock must be positive".to_string(),
            ));
        }

        let num_stocks = data.num_stocks();
        let rng = StdRng::seed_from_u64(config.seed);
        let initial_capital = config.initial_capital;

        Ok(Self {
            config,
            data,
            time: 0,
            cash: initial_capital,
            stocks: vec![0.0; num_stocks],
            total_asset: initial_capital,
            initial_total_asset: initial_capital,
            rng,
        })
    }

    fn prices(&self) -> &[f64] {
        &self.data.price_array[self.time]
    }

    fn is_turbulent(&self) -> bool {
        self.data.turbulence_array[self.time] >= self.config.turbulence_thresh
    }

    fn holdings_value(&self) -> f64 {
        self.prices()
            .iter()
            .zip(&self.stocks)
            .map(|(p, s)| p * s)
            .sum()
    }

    fn observation(&self) -> Vec<f32> {
        let turbulence = self.data.turbulence_array[self.time];
        let mut state = Vec::with_capacity(self.state_dim());

        state.push((self.cash * CASH_SCALE) as f32);
        state.push(if self.is_turbulent() { 1.0 } else { 0.0 });
        state.push((turbulence * TURBULENCE_SCALE) as f32);
        state.extend(self.prices().iter().map(|p| (p * PRICE_SCALE) as f32));
        state.extend(self.stocks.iter().map(|s| (s * STOCK_SCALE) as f32));
        state.extend(
            self.data.tech_array[self.time]
                .iter()
                .map(|v| (v * TECH_SCALE) as f32),
        );
        state
    }

    fn sell(&mut self, index: usize, shares: f64) {
        let price = self.prices()[index];
        let qty = shares.min(self.stocks[index]);
        if qty <= 0.0 {
            return;
        }
        self.stocks[index] -= qty;
        self.cash += price * qty * (1.0 - self.config.sell_cost_pct);
    }

    fn buy(&mut self, index: usize, shares: f64) {
        let price = self.prices()[index];
        let unit_cost = price * (1.0 + self.config.buy_cost_pct);
        let affordable = (self.cash / unit_cost).floor();
        let qty = shares.min(affordable);
        if qty <= 0.0 {
            return;
        }
        self.stocks[index] += qty;
        self.cash -= unit_cost * qty;
    }
}

impl TradingEnv for StockTradingEnvironment {
    fn reset(&mut self) -> Vec<f32> {
        self.time = 0;
        self.stocks = vec![0.0; self.data.num_stocks()];
        self.cash = if self.config.if_train {
            self.config.initial_capital * self.rng.gen_range(0.95..1.05)
        } else {
            self.config.initial_capital
        };
        self.total_asset = self.cash;
        self.initial_total_asset = self.cash;

        self.observation()
    }

    fn step(&mut self, action: &[f32]) -> Result<StepOutcome> {
        if action.len() != self.action_dim() {
            return Err(EnsembleError::Environment(format!(
                "action dim mismatch: got {}, expected {}",
                action.len(),
                self.action_dim()
            )));
        }
        if self.time >= self.max_step() {
            return Err(EnsembleError::Environment(
                "step called after episode end".to_string(),
            ));
        }

        self.time += 1;

        let turbulence_triggered = self.is_turbulent();
        if turbulence_triggered {
            for index in 0..self.stocks.len() {
                let held = self.stocks[index];
                self.sell(index, held);
            }
        } else {
            let min_action = (self.config.max_stock * self.config.min_stock_rate).trunc();
            let shares: Vec<f64> = action
                .iter()
                .map(|a| (f64::from(a.clamp(-1.0, 1.0)) * self.config.max_stock).trunc())
                .collect();

            for (index, qty) in shares.iter().enumerate() {
                if *qty < -min_action {
                    self.sell(index, -qty);
                }
            }
            for (index, qty) in shares.iter().enumerate() {
                if *qty > min_action {
                    self.buy(index, *qty);
                }
            }
        }

        let total_asset = self.cash + self.holdings_value();
        let reward = (total_asset - self.total_asset) * self.config.reward_scaling;
        self.total_asset = total_asset;

        Ok(StepOutcome {
            state: self.observation(),
            reward,
            done: self.time == self.max_step(),
            info: StepInfo {
                cash: self.cash,
                total_asset,
                turbulence_triggered,
            },
        })
    }

    fn state_dim(&self) -> usize {
        3 + 2 * self.data.num_stocks() + self.data.num_tech()
    }

    fn action_dim(&self) -> usize {
        self.data.num_stocks()
    }

    fn max_step(&self) -> usize {
        self.data.len() - 1
    }

    fn initial_total_asset(&self) -> f64 {
        self.initial_total_asset
    }

    fn cash(&self) -> f64 {
        self.cash
    }

    fn stocks(&self) -> &[f64] {
        &self.stocks
    }

    fn price_array(&self) -> &[Vec<f64>] {
        &self.data.price_array
    }

    fn time(&self) -> usize {
        self.time
    }
}
