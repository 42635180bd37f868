//! Market Data for the Stock Trading Environment
//!
//! Price, technical-indicator and turbulence arrays indexed by step, plus a
//! seeded generator for synthetic data.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{EnsembleError, Result};

/// Step-indexed market arrays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    /// Close prices `[T][N]`
    pub price_array: Vec<Vec<f64>>,
    /// Technical indicators `[T][K]`
    pub tech_array: Vec<Vec<f64>>,
    /// Market turbulence `[T]`
    pub turbulence_array: Vec<f64>,
}

impl MarketData {
    /// Load market data from a JSON file and validate it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let data: Self = serde_json::from_str(&content)?;
        data.validate()?;
        Ok(data)
    }

    /// Write market data as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Number of steps (rows)
    pub fn len(&self) -> usize {
        self.price_array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.price_array.is_empty()
    }

    /// Number of tradable stocks
    pub fn num_stocks(&self) -> usize {
        self.price_array.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Number of technical indicators per step
    pub fn num_tech(&self) -> usize {
        self.tech_array.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn validate(&self) -> Result<()> {
        let t = self.price_array.len();
        if t < 2 {
            return Err(EnsembleError::InvalidMarketData(format!(
                "need at least 2 steps, got {t}"
            )));
        }
        if self.tech_array.len() != t || self.turbulence_array.len() != t {
            return Err(EnsembleError::InvalidMarketData(format!(
                "row counts differ: price={t}, tech={}, turbulence={}",
                self.tech_array.len(),
                self.turbulence_array.len()
            )));
        }

        let n = self.num_stocks();
        if n == 0 {
            return Err(EnsembleError::InvalidMarketData(
                "price rows must not be empty".to_string(),
            ));
        }
        for (i, row) in self.price_array.iter().enumerate() {
            if row.len() != n {
                return Err(EnsembleError::InvalidMarketData(format!(
                    "price row {i} has {} columns, expected {n}",
                    row.len()
                )));
            }
            if row.iter().any(|p| !p.is_finite() || *p <= 0.0) {
                return Err(EnsembleError::InvalidMarketData(format!(
                    "price row {i} contains non-positive or non-finite values"
                )));
            }
        }

        let k = self.num_tech();
        for (i, row) in self.tech_array.iter().enumerate() {
            if row.len() != k || row.iter().any(|v| !v.is_finite()) {
                return Err(EnsembleError::InvalidMarketData(format!(
                    "tech row {i} is malformed"
                )));
            }
        }
        if self.turbulence_array.iter().any(|v| !v.is_finite()) {
            return Err(EnsembleError::InvalidMarketData(
                "turbulence contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }
}

/// Synthetic market configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Number of stocks
    pub num_stocks: usize,
    /// Number of steps to generate
    pub num_steps: usize,
    /// Initial price of every stock
    pub initial_price: f64,
    /// Per-step return volatility
    pub volatility: f64,
    /// Per-step drift
    pub drift: f64,
    /// RNG seed
    pub seed: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            num_stocks: 3,
            num_steps: 601,
            initial_price: 100.0,
            volatility: 0.015,
            drift: 0.0003,
            seed: 42,
        }
    }
}

/// Momentum lookback for the generated indicators
const MOMENTUM_WINDOW: usize = 5;

/// Generate a geometric random walk with momentum and moving-average indicators.
///
/// Two indicators per stock: `MOMENTUM_WINDOW`-step momentum and the ratio of
/// price to its running mean. Turbulence is the scaled sum of squared returns.
pub fn generate_sample_data(config: &MarketConfig) -> MarketData {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let n = config.num_stocks;

    let mut price_array: Vec<Vec<f64>> = Vec::with_capacity(config.num_steps);
    let mut tech_array = Vec::with_capacity(config.num_steps);
    let mut turbulence_array = Vec::with_capacity(config.num_steps);
    let mut running_sum = vec![0.0f64; n];

    for t in 0..config.num_steps {
        let row: Vec<f64> = match price_array.last() {
            None => vec![config.initial_price; n],
            Some(prev) => prev
                .iter()
                .map(|p| {
                    let shock = sample_normal(&mut rng) * config.volatility;
                    (p * (1.0 + config.drift + shock)).max(0.01)
                })
                .collect(),
        };

        let turbulence = match price_array.last() {
            None => 0.0,
            Some(prev) => {
                row.iter()
                    .zip(prev)
                    .map(|(p, q)| ((p - q) / q).powi(2))
                    .sum::<f64>()
                    * 1e4
            }
        };

        let mut tech = Vec::with_capacity(n * 2);
        for j in 0..n {
            running_sum[j] += row[j];
            let lookback = t.saturating_sub(MOMENTUM_WINDOW);
            let past = if lookback == t {
                row[j]
            } else {
                price_array[lookback][j]
            };
            tech.push(row[j] - past);
            tech.push(row[j] / (running_sum[j] / (t + 1) as f64));
        }

        price_array.push(row);
        tech_array.push(tech);
        turbulence_array.push(turbulence);
    }

    MarketData {
        price_array,
        tech_array,
        turbulence_array,
    }
}

/// Standard normal sample (Box-Muller transform)
fn sample_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(0.0001..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
