//! Return-series statistics used for agent scoring and reporting.

/// Standard deviations below this are treated as zero variance
pub const MIN_STD: f64 = 1e-12;

/// A zero asset value at `step` makes the following return undefined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroAsset {
    pub step: usize,
}

/// Why a return window could not be scored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreError {
    /// Fewer benchmark returns than agent returns
    ShortBenchmark { required: usize, actual: usize },
    /// The agent's returns are empty or their std is below `MIN_STD`
    ZeroVariance,
    /// A return, a benchmark value or the ratio itself is NaN or infinite
    NonFinite,
}

/// Simple returns of an asset trajectory: `(a[i] - a[i-1]) / a[i-1]`.
///
/// The result has one element fewer than the trajectory.
pub fn asset_to_returns(assets: &[f64]) -> Result<Vec<f64>, ZeroAsset> {
    assets
        .windows(2)
        .enumerate()
        .map(|(i, w)| {
            if w[0] == 0.0 {
                Err(ZeroAsset { step: i })
            } else {
                Ok((w[1] - w[0]) / w[0])
            }
        })
        .collect()
}

/// Split a series into consecutive chunks of `size`; the last may be shorter
pub fn chunks<T>(series: &[T], size: usize) -> Vec<&[T]> {
    series.chunks(size.max(1)).collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Mean excess return over `base` divided by the std of the agent's returns.
///
/// `base` is truncated to the agent's length and must be at least as long.
/// No annualization.
pub fn sharpe_ratio(agent_returns: &[f64], base_returns: &[f64]) -> Result<f64, ScoreError> {
    if base_returns.len() < agent_returns.len() {
        return Err(ScoreError::ShortBenchmark {
            required: agent_returns.len(),
            actual: base_returns.len(),
        });
    }
    let base = &base_returns[..agent_returns.len()];

    if agent_returns.iter().chain(base).any(|v| !v.is_finite()) {
        return Err(ScoreError::NonFinite);
    }

    let std = std_dev(agent_returns).ok_or(ScoreError::ZeroVariance)?;
    if std < MIN_STD {
        return Err(ScoreError::ZeroVariance);
    }

    let excess: Vec<f64> = agent_returns
        .iter()
        .zip(base)
        .map(|(a, b)| a - b)
        .collect();
    let ratio = mean(&excess).ok_or(ScoreError::ZeroVariance)? / std;
    if ratio.is_finite() {
        Ok(ratio)
    } else {
        Err(ScoreError::NonFinite)
    }
}

/// Largest peak-to-trough decline as a fraction of the peak
pub fn max_drawdown(assets: &[f64]) -> f64 {
    let Some(first) = assets.first() else {
        return 0.0;
    };

    let mut peak = *first;
    let mut max_drawdown = 0.0f64;
    for &value in assets {
        peak = peak.max(value);
        if peak > 0.0 {
            max_drawdown = max_drawdown.max((peak - value) / peak);
        }
    }
    max_drawdown
}

/// Final value over initial value, minus one
pub fn cumulative_return(assets: &[f64]) -> Option<f64> {
    match (assets.first(), assets.last()) {
        (Some(first), Some(last)) if *first != 0.0 => Some(last / first - 1.0),
        _ => None,
    }
}
