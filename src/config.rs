use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::rl::config::{EnsembleConfig, ModelKwargs};
use crate::rl::ensemble::AgentSpec;
use crate::rl::environment::{generate_sample_data, MarketConfig, MarketData, TradingEnvConfig};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Trained agents to evaluate, in order
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
    /// Hyperparameters handed to every agent on `prepare`
    #[serde(default)]
    pub model: Option<ModelKwargs>,
    #[serde(default)]
    pub env: EnvConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub ensemble: EnsembleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvConfig {
    /// Hidden layer width the actors were trained with
    #[serde(default = "default_net_dimension")]
    pub net_dimension: usize,
    #[serde(default)]
    pub trading: TradingEnvConfig,
    /// Synthetic market used when no market data file is configured
    #[serde(default)]
    pub sample: MarketConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            net_dimension: default_net_dimension(),
            trading: TradingEnvConfig::default(),
            sample: MarketConfig::default(),
        }
    }
}

fn default_net_dimension() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DataConfig {
    /// Market data JSON (`price_array`, `tech_array`, `turbulence_array`)
    #[serde(default)]
    pub market: Option<PathBuf>,
    /// Benchmark per-step returns as a JSON array of numbers
    #[serde(default)]
    pub benchmark: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> std::result::Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Self::defaults()?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/backtest.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("DRL_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (DRL_ENSEMBLE__CHUNK_SIZE, etc.)
            .add_source(Self::environment());

        builder.build()?.try_deserialize()
    }

    fn defaults() -> std::result::Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("env.net_dimension", default_net_dimension() as i64)?
            .set_default("ensemble.chunk_size", 200)
    }

    fn environment() -> Environment {
        Environment::with_prefix("DRL")
            .separator("__")
            .try_parsing(true)
    }

    /// Market data from the configured file, or the seeded synthetic market
    pub fn market_data(&self) -> Result<MarketData> {
        match &self.data.market {
            Some(path) => MarketData::from_file(path),
            None => Ok(generate_sample_data(&self.env.sample)),
        }
    }

    /// Benchmark series from the configured file, or `len` zeros
    pub fn benchmark(&self, len: usize) -> Result<Vec<f64>> {
        match &self.data.benchmark {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&content)?)
            }
            None => Ok(vec![0.0; len]),
        }
    }
}
