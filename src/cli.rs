use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing::info;

use crate::config::AppConfig;
use crate::error::Result;
use crate::rl::config::AgentArgs;
use crate::rl::core::AgentKind;
use crate::rl::ensemble::{
    drl_prediction, drl_prediction_ensemble, AgentSpec, EnsembleReport, EpisodeTrajectory,
};
use crate::rl::environment::{generate_sample_data, StockTradingEnvironment};
use crate::rl::training::{timestamped_name, DrlEnsembleAgent};

#[derive(Parser, Debug)]
#[command(name = "drl-ensemble")]
#[command(version)]
#[command(about = "Evaluate trained DRL trading agents and stitch a Sharpe-selected ensemble", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory (default.toml plus $DRL_ENV overrides)
    #[arg(short, long, default_value = "config", env = "DRL_CONFIG_DIR")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay one trained agent on the test market
    Predict {
        /// Agent kind (ddpg, td3, sac, ppo, a2c)
        #[arg(short, long)]
        agent: AgentKind,
        /// Directory holding the agent's actor.json
        #[arg(long)]
        cwd: PathBuf,
    },
    /// Replay every configured agent and select per window by Sharpe ratio
    Ensemble {
        /// Directory to write the JSON report into
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Resolve training arguments and save them for the external trainer
    Prepare {
        #[arg(short, long)]
        agent: AgentKind,
        #[arg(long)]
        cwd: PathBuf,
        /// Environment steps to train for
        #[arg(long, default_value = "100000")]
        total_timesteps: usize,
    },
    /// Write a synthetic market data file
    SampleData {
        #[arg(short, long)]
        output: PathBuf,
        /// Override the configured number of steps
        #[arg(long)]
        steps: Option<usize>,
        /// Override the configured seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Debug, Serialize, Tabled)]
pub struct AgentRow {
    pub agent: String,
    pub cwd: String,
    pub final_asset: String,
    pub episode_return: String,
    pub max_drawdown: String,
}

#[derive(Debug, Serialize, Tabled)]
pub struct SelectionRow {
    pub chunk: usize,
    pub selected: String,
    pub sharpe: String,
}

fn format_score(score: Option<f64>) -> String {
    score
        .map(|s| format!("{:.4}", s))
        .unwrap_or_else(|| "-".to_string())
}

pub fn agent_rows(report: &EnsembleReport) -> Vec<AgentRow> {
    report
        .agents
        .iter()
        .map(|a| AgentRow {
            agent: a.kind.to_string(),
            cwd: a.cwd.display().to_string(),
            final_asset: format!("{:.2}", a.final_asset),
            episode_return: format_score(a.episode_return),
            max_drawdown: format!("{:.2}%", a.max_drawdown * 100.0),
        })
        .collect()
}

pub fn selection_rows(report: &EnsembleReport) -> Vec<SelectionRow> {
    report
        .selections
        .iter()
        .map(|s| SelectionRow {
            chunk: s.chunk,
            selected: s.agent.to_string(),
            sharpe: s
                .scores
                .iter()
                .map(|score| format_score(*score))
                .collect::<Vec<_>>()
                .join(" / "),
        })
        .collect()
}

/// Replay one agent and print its summary
pub fn run_predict(config: &AppConfig, kind: AgentKind, cwd: &Path) -> Result<EpisodeTrajectory> {
    let market = config.market_data()?;
    let mut env = StockTradingEnvironment::new(market, config.env.trading.clone())?;
    let spec = AgentSpec {
        kind,
        cwd: cwd.to_path_buf(),
    };

    let trajectory = drl_prediction(&spec, config.env.net_dimension, &mut env)?;

    println!("Agent:          {}", trajectory.agent);
    println!("Steps:          {}", trajectory.steps());
    println!(
        "Final asset:    {:.2}",
        trajectory.total_assets.last().copied().unwrap_or_default()
    );
    println!(
        "Episode return: {}",
        format_score(trajectory.episode_return())
    );
    Ok(trajectory)
}

/// Run the configured agents, select the ensemble and print the tables
pub fn run_ensemble(config: &AppConfig, output: Option<&Path>) -> Result<EnsembleReport> {
    let market = config.market_data()?;
    let base_returns = config.benchmark(market.len())?;
    let mut env = StockTradingEnvironment::new(market, config.env.trading.clone())?;

    let report = drl_prediction_ensemble(
        &config.agents,
        config.env.net_dimension,
        &mut env,
        &base_returns,
        &config.ensemble,
    )?;

    println!("{}", Table::new(agent_rows(&report)));
    if report.selections.is_empty() {
        println!("(single window, no selections)");
    } else {
        println!("{}", Table::new(selection_rows(&report)));
    }
    println!("Seed agent:        {}", report.seed_agent);
    println!("Ensemble length:   {}", report.total_assets.len());
    println!(
        "Cumulative return: {}",
        format_score(report.cumulative_return)
    );
    println!("Max drawdown:      {:.2}%", report.max_drawdown * 100.0);

    if let Some(dir) = output {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", timestamped_name("ensemble")));
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        info!("Report written to {:?}", path);
    }

    Ok(report)
}

/// Build the training arguments for `kind` and save them into `cwd`
pub fn run_prepare(
    config: &AppConfig,
    kind: AgentKind,
    cwd: &Path,
    total_timesteps: usize,
) -> Result<AgentArgs> {
    let market = config.market_data()?;
    let agent = DrlEnsembleAgent::new(market, config.env.trading.clone());
    let args = agent.get_model(kind, config.model.as_ref())?;
    let args = agent.prepare_model(args, cwd, total_timesteps)?;

    println!(
        "Prepared {} ({}): lr={} batch={} gamma={} net_dim={} target_step={} break_step={}",
        args.agent,
        if args.if_off_policy {
            "off-policy"
        } else {
            "on-policy"
        },
        args.learning_rate,
        args.batch_size,
        args.gamma,
        args.net_dim,
        args.target_step,
        total_timesteps
    );
    Ok(args)
}

/// Write synthetic market data to `output`
pub fn run_sample_data(
    config: &AppConfig,
    output: &Path,
    steps: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let mut sample = config.env.sample.clone();
    if let Some(steps) = steps {
        sample.num_steps = steps;
    }
    if let Some(seed) = seed {
        sample.seed = seed;
    }

    let data = generate_sample_data(&sample);
    data.validate()?;
    data.save(output)?;

    println!(
        "Wrote {} steps x {} stocks to {}",
        data.len(),
        data.num_stocks(),
        output.display()
    );
    Ok(())
}
