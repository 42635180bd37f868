mod main_runtime;

use clap::Parser;
use drl_ensemble::cli::{self, Cli, Commands};
use drl_ensemble::config::AppConfig;
use drl_ensemble::error::Result;
use tracing::error;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;

    let _guard = match &cli.command {
        Commands::Predict { .. } | Commands::Ensemble { .. } => {
            main_runtime::init_logging(&config.logging)
        }
        Commands::Prepare { .. } | Commands::SampleData { .. } => {
            main_runtime::init_logging_simple();
            None
        }
    };

    let result = match &cli.command {
        Commands::Predict { agent, cwd } => cli::run_predict(&config, *agent, cwd).map(|_| ()),
        Commands::Ensemble { output } => {
            cli::run_ensemble(&config, output.as_deref()).map(|_| ())
        }
        Commands::Prepare {
            agent,
            cwd,
            total_timesteps,
        } => cli::run_prepare(&config, *agent, cwd, *total_timesteps).map(|_| ()),
        Commands::SampleData {
            output,
            steps,
            seed,
        } => cli::run_sample_data(&config, output, *steps, *seed),
    };

    if let Err(e) = &result {
        error!("{} failed: {}", command_name(&cli.command), e);
    }
    result
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Predict { .. } => "predict",
        Commands::Ensemble { .. } => "ensemble",
        Commands::Prepare { .. } => "prepare",
        Commands::SampleData { .. } => "sample-data",
    }
}
