//! Evaluate exported actors on a synthetic market and stitch the ensemble.

use std::path::{Path, PathBuf};

use drl_ensemble::ml::{Activation, DenseLayer, DenseNetwork};
use drl_ensemble::rl::config::{EnsembleConfig, ZeroVariancePolicy};
use drl_ensemble::rl::environment::{
    generate_sample_data, MarketConfig, StockTradingEnvironment, TradingEnv, TradingEnvConfig,
};
use drl_ensemble::rl::training::Checkpointer;
use drl_ensemble::{drl_prediction, drl_prediction_ensemble, AgentKind, AgentSpec, EnsembleError};

const NET_DIM: usize = 8;

fn environment() -> StockTradingEnvironment {
    let market = generate_sample_data(&MarketConfig {
        num_stocks: 2,
        num_steps: 401,
        ..Default::default()
    });
    StockTradingEnvironment::new(market, TradingEnvConfig::default()).unwrap()
}

/// Actor whose raw output is `bias` on every head regardless of state
fn constant_actor(kind: AgentKind, env: &dyn TradingEnv, bias: f64) -> DenseNetwork {
    let out_dim = kind.actor_output_dim(env.action_dim());
    let mut head = DenseLayer::filled(NET_DIM, out_dim, 0.0, Activation::Linear);
    head.bias = vec![bias; out_dim];

    DenseNetwork {
        input_dim: env.state_dim(),
        layers: vec![
            DenseLayer::filled(env.state_dim(), NET_DIM, 0.0, Activation::Relu),
            head,
        ],
        metadata: serde_json::json!({ "agent": kind.as_str() }),
    }
}

fn export(root: &Path, kind: AgentKind, env: &dyn TradingEnv, bias: f64) -> AgentSpec {
    let cwd = root.join(kind.as_str());
    Checkpointer::new(&cwd)
        .save_actor(&constant_actor(kind, env, bias))
        .unwrap();
    AgentSpec { kind, cwd }
}

fn workspace(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_three_agent_ensemble_over_two_windows() {
    let root = workspace("drl_ensemble_e2e_three");
    let mut env = environment();
    let specs = vec![
        export(&root, AgentKind::Ddpg, &env, 1.0),
        export(&root, AgentKind::Ppo, &env, 0.5),
        export(&root, AgentKind::Sac, &env, 0.3),
    ];
    let benchmark = vec![0.0; 401];

    let report = drl_prediction_ensemble(
        &specs,
        NET_DIM,
        &mut env,
        &benchmark,
        &EnsembleConfig::default(),
    )
    .unwrap();

    assert_eq!(report.agents.len(), 3);
    assert!(report.excluded.is_empty());
    assert_eq!(report.seed_agent, AgentKind::Ppo);
    assert_eq!(report.total_assets.len(), 400);
    assert_eq!(report.selections.len(), 1);
    assert_eq!(report.selections[0].chunk, 1);
    assert_eq!(report.selections[0].scores.len(), 3);

    // first window comes from the seed agent's own replay
    let mut fresh = environment();
    let ppo = drl_prediction(&specs[1], NET_DIM, &mut fresh).unwrap();
    assert_eq!(ppo.total_assets.len(), 401);
    assert_eq!(&report.total_assets[..200], &ppo.total_assets[..200]);

    // second window comes from the selected agent's replay
    let selected = &specs[report.selections[0].agent_index];
    let mut fresh = environment();
    let chosen = drl_prediction(selected, NET_DIM, &mut fresh).unwrap();
    assert_eq!(&report.total_assets[200..], &chosen.total_assets[200..400]);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_missing_agent_aborts_or_is_excluded() {
    let root = workspace("drl_ensemble_e2e_missing");
    let mut env = environment();
    let specs = vec![
        export(&root, AgentKind::Td3, &env, 1.0),
        AgentSpec {
            kind: AgentKind::A2c,
            cwd: root.join("never_trained"),
        },
        export(&root, AgentKind::Ppo, &env, 0.5),
    ];
    let benchmark = vec![0.0; 401];

    let err = drl_prediction_ensemble(
        &specs,
        NET_DIM,
        &mut env,
        &benchmark,
        &EnsembleConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, EnsembleError::Load { .. }));

    let config = EnsembleConfig {
        exclude_failed_agents: true,
        ..Default::default()
    };
    let report = drl_prediction_ensemble(&specs, NET_DIM, &mut env, &benchmark, &config).unwrap();
    assert_eq!(report.agents.len(), 2);
    assert_eq!(report.excluded.len(), 1);
    assert_eq!(report.excluded[0].kind, AgentKind::A2c);
    assert_eq!(report.total_assets.len(), 400);

    // selection indices point into the evaluated agents, not the configured specs
    assert_eq!(report.agents[1].kind, AgentKind::Ppo);
    assert_eq!(report.selections.len(), 1);
    let selection = &report.selections[0];
    assert_eq!(selection.scores.len(), report.agents.len());
    assert_eq!(report.agents[selection.agent_index].kind, selection.agent);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_cash_only_agent_has_zero_variance() {
    let root = workspace("drl_ensemble_e2e_cash");
    let mut env = environment();
    let specs = vec![
        export(&root, AgentKind::Ddpg, &env, 1.0),
        export(&root, AgentKind::Td3, &env, -1.0),
    ];
    let benchmark = vec![0.0; 401];

    let err = drl_prediction_ensemble(
        &specs,
        NET_DIM,
        &mut env,
        &benchmark,
        &EnsembleConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        EnsembleError::ZeroVariance { agent: 1, chunk: 0 }
    ));

    let config = EnsembleConfig {
        zero_variance: ZeroVariancePolicy::Skip,
        ..Default::default()
    };
    let report = drl_prediction_ensemble(&specs, NET_DIM, &mut env, &benchmark, &config).unwrap();
    assert_eq!(report.selections[0].agent_index, 0);
    assert_eq!(report.selections[0].scores[1], None);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_short_benchmark_is_configuration_error() {
    let root = workspace("drl_ensemble_e2e_benchmark");
    let mut env = environment();
    let specs = vec![export(&root, AgentKind::Ppo, &env, 0.5)];

    let err = drl_prediction_ensemble(
        &specs,
        NET_DIM,
        &mut env,
        &[0.0; 100],
        &EnsembleConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, EnsembleError::BenchmarkTooShort { .. }));
    assert!(err.is_configuration());

    let _ = std::fs::remove_dir_all(&root);
}
