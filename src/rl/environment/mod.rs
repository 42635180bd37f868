//! Trading Environment
//!
//! The environment contract the runner steps against, a concrete
//! multi-stock implementation, and its market data.

mod market;
mod traits;
mod trading;

pub use market::{generate_sample_data, MarketConfig, MarketData};
pub use trading::{StockTradingEnvironment, TradingEnvConfig};
pub use traits::{StepInfo, StepOutcome, TradingEnv};
