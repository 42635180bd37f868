//! Windowed Ensemble Selection
//!
//! Chunk `i` of the ensemble follows whichever agent had the best Sharpe
//! ratio against the benchmark over chunk `i - 1`. Chunk 0 has nothing to
//! score against and comes from the seed agent.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::stats::{asset_to_returns, chunks, sharpe_ratio, ScoreError, ZeroAsset};
use crate::error::{EnsembleError, Result};
use crate::rl::config::{EnsembleConfig, ZeroVariancePolicy};

/// The agent picked for one chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkSelection {
    /// Chunk whose asset values were taken
    pub chunk: usize,
    /// Index of the chosen agent
    pub agent_index: usize,
    /// Sharpe ratio of every agent over the previous chunk; `None` for
    /// agents skipped for zero variance under `ZeroVariancePolicy::Skip`
    pub scores: Vec<Option<f64>>,
}

/// Stitched trajectory and the decisions that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleOutcome {
    /// Ensemble total-asset values
    pub total_assets: Vec<f64>,
    /// Agent whose first chunk seeded the ensemble
    pub seed_agent: usize,
    /// One entry per chunk after the first
    pub selections: Vec<ChunkSelection>,
}

/// Stitch agent trajectories chunk by chunk.
///
/// `trajectories` must all have the same length (at least 2). `benchmark`
/// is a return series aligned with the agent returns and must be at least
/// as long as the trajectories; its last element is dropped. Only zero
/// variance is subject to `config.zero_variance`; non-finite returns always
/// fail.
pub fn select_ensemble(
    trajectories: &[Vec<f64>],
    benchmark: &[f64],
    config: &EnsembleConfig,
) -> Result<EnsembleOutcome> {
    let expected_len = validate_inputs(trajectories, benchmark, config)?;
    let seed_agent = config.seed_agent_index(trajectories.len())?;
    let chunk_size = config.chunk_size;

    let returns = trajectories
        .iter()
        .enumerate()
        .map(|(agent, assets)| {
            asset_to_returns(assets)
                .map_err(|ZeroAsset { step }| EnsembleError::DivideByZero { agent, step })
        })
        .collect::<Result<Vec<_>>>()?;

    let return_chunks: Vec<Vec<&[f64]>> = returns.iter().map(|r| chunks(r, chunk_size)).collect();
    let asset_chunks: Vec<Vec<&[f64]>> = trajectories
        .iter()
        .map(|a| chunks(a, chunk_size))
        .collect();
    let base_chunks = chunks(&benchmark[..benchmark.len() - 1], chunk_size);

    let num_chunk = return_chunks[0].len();
    debug!(
        "Selecting over {} chunks of {} steps ({} agents, trajectory length {})",
        num_chunk,
        chunk_size,
        trajectories.len(),
        expected_len
    );

    let mut total_assets = asset_chunks[seed_agent][0].to_vec();
    let mut selections = Vec::with_capacity(num_chunk.saturating_sub(1));

    for chunk in 1..num_chunk {
        let scored = chunk - 1;
        let scores = return_chunks
            .iter()
            .enumerate()
            .map(|(agent, agent_chunks)| {
                match sharpe_ratio(agent_chunks[scored], base_chunks[scored]) {
                    Ok(score) => Ok(Some(score)),
                    Err(ScoreError::ZeroVariance) => match config.zero_variance {
                        ZeroVariancePolicy::Fail => Err(EnsembleError::ZeroVariance {
                            agent,
                            chunk: scored,
                        }),
                        ZeroVariancePolicy::Skip => {
                            warn!(
                                "Agent {} has zero return variance in chunk {}, skipping",
                                agent, scored
                            );
                            Ok(None)
                        }
                    },
                    Err(ScoreError::NonFinite) => Err(EnsembleError::NonFiniteScore {
                        agent,
                        chunk: scored,
                    }),
                    Err(ScoreError::ShortBenchmark { required, actual }) => {
                        Err(EnsembleError::BenchmarkTooShort { required, actual })
                    }
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let agent_index = best_agent(&scores).ok_or(EnsembleError::NoSignal { chunk })?;
        debug!("Chunk {} scores: {:?}", chunk, scores);
        info!("Chunk {}: selected agent {}", chunk, agent_index);

        total_assets.extend_from_slice(asset_chunks[agent_index][chunk]);
        selections.push(ChunkSelection {
            chunk,
            agent_index,
            scores,
        });
    }

    Ok(EnsembleOutcome {
        total_assets,
        seed_agent,
        selections,
    })
}

/// Index of the highest score; ties go to the earliest agent
fn best_agent(scores: &[Option<f64>]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, score) in scores.iter().enumerate() {
        let Some(score) = *score else { continue };
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

fn validate_inputs(
    trajectories: &[Vec<f64>],
    benchmark: &[f64],
    config: &EnsembleConfig,
) -> Result<usize> {
    let Some(first) = trajectories.first() else {
        return Err(EnsembleError::Configuration {
            agent: "-".to_string(),
            reason: "at least one agent trajectory is required".to_string(),
        });
    };

    if config.chunk_size == 0 {
        return Err(EnsembleError::Configuration {
            agent: "-".to_string(),
            reason: "chunk_size must be > 0".to_string(),
        });
    }

    let expected = first.len();
    if expected < 2 {
        return Err(EnsembleError::Configuration {
            agent: "0".to_string(),
            reason: format!("trajectory needs at least 2 values, got {expected}"),
        });
    }

    if let Some((agent, t)) = trajectories
        .iter()
        .enumerate()
        .find(|(_, t)| t.len() != expected)
    {
        return Err(EnsembleError::TrajectoryMismatch {
            agent,
            expected,
            actual: t.len(),
        });
    }

    if benchmark.len() < expected {
        return Err(EnsembleError::BenchmarkTooShort {
            required: expected,
            actual: benchmark.len(),
        });
    }

    // only the first `expected - 1` values are ever scored against
    if let Some(step) = benchmark[..expected - 1]
        .iter()
        .position(|v| !v.is_finite())
    {
        return Err(EnsembleError::NonFiniteBenchmark { step });
    }

    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Trajectory compounding the given per-step returns from 100.0
    fn compound(returns: &[f64]) -> Vec<f64> {
        let mut assets = vec![100.0];
        for r in returns {
            let last = *assets.last().unwrap();
            assets.push(last * (1.0 + r));
        }
        assets
    }

    fn alternating(len: usize, high: f64, low: f64) -> Vec<f64> {
        (0..len).map(|i| if i % 2 == 0 { high } else { low }).collect()
    }

    fn config(chunk_size: usize) -> EnsembleConfig {
        EnsembleConfig {
            chunk_size,
            ..Default::default()
        }
    }

    #[test]
    fn test_three_agents_401_steps() {
        let a = compound(&alternating(400, 0.010, -0.005));
        let b = compound(&alternating(400, 0.020, -0.004));
        let c = compound(&alternating(400, 0.001, -0.001));
        let benchmark = vec![0.0; 401];

        let outcome = select_ensemble(&[a, b.clone(), c], &benchmark, &config(200)).unwrap();

        assert_eq!(outcome.total_assets.len(), 400);
        assert_eq!(outcome.seed_agent, 1);
        assert_eq!(outcome.selections.len(), 1);
        assert_eq!(outcome.selections[0].chunk, 1);
        assert_eq!(outcome.selections[0].agent_index, 1);
        assert_eq!(outcome.total_assets[..], b[..400]);
    }

    #[test]
    fn test_switches_to_previous_chunk_winner() {
        // agent 0 strong in chunk 0, agent 1 strong in chunk 1
        let mut r0 = alternating(10, 0.05, -0.01);
        r0.extend(alternating(10, 0.001, -0.001));
        r0.extend(alternating(10, 0.001, -0.001));
        let mut r1 = alternating(10, 0.001, -0.001);
        r1.extend(alternating(10, 0.05, -0.01));
        r1.extend(alternating(10, 0.001, -0.001));

        let a0 = compound(&r0);
        let a1 = compound(&r1);
        let benchmark = vec![0.0; 40];

        let outcome = select_ensemble(&[a0.clone(), a1.clone()], &benchmark, &config(10)).unwrap();

        let picks: Vec<usize> = outcome.selections.iter().map(|s| s.agent_index).collect();
        assert_eq!(picks, vec![0, 1]);

        let mut expected = a1[0..10].to_vec();
        expected.extend_from_slice(&a0[10..20]);
        expected.extend_from_slice(&a1[20..30]);
        assert_eq!(outcome.total_assets, expected);
    }

    #[test]
    fn test_partial_final_chunk() {
        let a = compound(&alternating(25, 0.01, -0.005));
        let b = compound(&alternating(25, 0.02, -0.001));
        let benchmark = vec![0.0; 26];

        let outcome = select_ensemble(&[a, b], &benchmark, &config(10)).unwrap();

        // 25 returns -> 3 chunks; asset chunks 10 + 10 + 6
        assert_eq!(outcome.selections.len(), 2);
        assert_eq!(outcome.total_assets.len(), 26);
    }

    #[test]
    fn test_longer_benchmark_is_truncated() {
        let a = compound(&alternating(40, 0.01, -0.005));
        let b = compound(&alternating(40, 0.02, -0.001));
        let short = vec![0.0; 41];
        let long: Vec<f64> = (0..500).map(|i| if i < 41 { 0.0 } else { 9.0 }).collect();

        let x = select_ensemble(&[a.clone(), b.clone()], &short, &config(20)).unwrap();
        let y = select_ensemble(&[a, b], &long, &config(20)).unwrap();
        assert_eq!(x, y);
        assert_eq!(y.total_assets.len(), 40);
    }

    #[test]
    fn test_short_benchmark_fails() {
        let a = compound(&alternating(40, 0.01, -0.005));
        let err = select_ensemble(&[a], &[0.0; 40], &config(20)).unwrap_err();
        assert!(matches!(
            err,
            EnsembleError::BenchmarkTooShort {
                required: 41,
                actual: 40
            }
        ));
    }

    #[test]
    fn test_zero_variance_fails_by_default() {
        let flat = compound(&[0.01; 40]);
        let moving = compound(&alternating(40, 0.02, -0.01));

        let err = select_ensemble(&[moving, flat], &[0.0; 41], &config(20)).unwrap_err();
        assert!(matches!(err, EnsembleError::ZeroVariance { agent: 1, chunk: 0 }));
        assert!(err.is_computation());
    }

    #[test]
    fn test_zero_variance_skip_policy() {
        let flat = compound(&[0.01; 40]);
        let moving = compound(&alternating(40, 0.02, -0.01));
        let config = EnsembleConfig {
            chunk_size: 20,
            zero_variance: ZeroVariancePolicy::Skip,
            ..Default::default()
        };

        let outcome = select_ensemble(&[flat.clone(), moving], &[0.0; 41], &config).unwrap();
        assert_eq!(outcome.selections[0].agent_index, 1);
        assert_eq!(outcome.selections[0].scores[0], None);

        let err = select_ensemble(&[flat.clone(), flat], &[0.0; 41], &config).unwrap_err();
        assert!(matches!(err, EnsembleError::NoSignal { chunk: 1 }));
    }

    #[test]
    fn test_nan_benchmark_is_not_zero_variance() {
        let a = compound(&alternating(40, 0.01, -0.005));
        let b = compound(&alternating(40, 0.02, -0.001));
        let mut benchmark = vec![0.0; 41];
        benchmark[3] = f64::NAN;

        for zero_variance in [ZeroVariancePolicy::Fail, ZeroVariancePolicy::Skip] {
            let config = EnsembleConfig {
                chunk_size: 20,
                zero_variance,
                ..Default::default()
            };
            let err = select_ensemble(&[a.clone(), b.clone()], &benchmark, &config).unwrap_err();
            assert!(matches!(err, EnsembleError::NonFiniteBenchmark { step: 3 }));
            assert!(err.is_configuration());
        }

        // the dropped trailing value may be anything
        benchmark[3] = 0.0;
        benchmark[40] = f64::NAN;
        assert!(select_ensemble(&[a, b], &benchmark, &config(20)).is_ok());
    }

    #[test]
    fn test_non_finite_returns_fail_under_skip() {
        let a = compound(&alternating(40, 0.01, -0.005));
        let mut b = compound(&alternating(40, 0.02, -0.001));
        b[5] = f64::INFINITY;
        let config = EnsembleConfig {
            chunk_size: 20,
            zero_variance: ZeroVariancePolicy::Skip,
            ..Default::default()
        };

        let err = select_ensemble(&[a, b], &[0.0; 41], &config).unwrap_err();
        assert!(matches!(err, EnsembleError::NonFiniteScore { agent: 1, chunk: 0 }));
        assert!(err.is_computation());
    }

    #[test]
    fn test_zero_asset_names_agent() {
        let a = vec![100.0, 101.0, 102.0, 103.0];
        let b = vec![100.0, 0.0, 102.0, 103.0];

        let err = select_ensemble(&[a, b], &[0.0; 4], &config(2)).unwrap_err();
        assert!(matches!(err, EnsembleError::DivideByZero { agent: 1, step: 1 }));
        assert!(err.is_computation());
    }

    #[test]
    fn test_tie_picks_earliest_agent() {
        let returns = alternating(40, 0.02, -0.01);
        let a = compound(&returns);
        let b = compound(&returns);
        let c = compound(&alternating(40, 0.001, -0.001));

        let outcome = select_ensemble(&[c, a, b], &[0.0; 41], &config(20)).unwrap();
        assert_eq!(outcome.selections[0].agent_index, 1);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let a = compound(&alternating(60, 0.01, -0.007));
        let b = compound(&alternating(60, 0.015, -0.012));
        let trajectories = vec![a, b];
        let benchmark: Vec<f64> = (0..61).map(|i| (i as f64) * 1e-4).collect();

        let first = select_ensemble(&trajectories, &benchmark, &config(15)).unwrap();
        for _ in 0..5 {
            assert_eq!(select_ensemble(&trajectories, &benchmark, &config(15)).unwrap(), first);
        }
    }

    #[test]
    fn test_mismatched_trajectories() {
        let a = compound(&[0.01, 0.02, -0.01]);
        let b = compound(&[0.01, 0.02]);
        let err = select_ensemble(&[a, b], &[0.0; 10], &config(2)).unwrap_err();
        assert!(matches!(
            err,
            EnsembleError::TrajectoryMismatch {
                agent: 1,
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_rejects_degenerate_inputs() {
        assert!(select_ensemble(&[], &[0.0; 10], &config(2)).is_err());
        assert!(select_ensemble(&[vec![1.0]], &[0.0; 10], &config(2)).is_err());
        assert!(select_ensemble(&[vec![1.0, 2.0]], &[0.0; 10], &config(0)).is_err());
    }

    #[test]
    fn test_best_agent() {
        assert_eq!(best_agent(&[Some(1.0), Some(2.0), Some(2.0)]), Some(1));
        assert_eq!(best_agent(&[None, Some(-1.0)]), Some(1));
        assert_eq!(best_agent(&[None, None]), None);
    }
}
