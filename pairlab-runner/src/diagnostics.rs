//! Descriptive pair diagnostics.
//!
//! These use the whole sample and are reported alongside a run. They never
//! feed back into the simulation.

use serde::{Deserialize, Serialize};

use pairlab_core::hedge::rolling_beta;
use pairlab_core::stats::correlation;

/// Full-sample statistics of a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairDiagnostics {
    /// Pearson correlation of the two legs' log returns.
    pub return_correlation: f64,
    /// OLS slope of log A on log B over the whole sample.
    pub full_sample_beta: f64,
    /// AR(1) coefficient of the full-sample spread, if estimable.
    pub ar1_phi: Option<f64>,
    /// Mean-reversion half-life in steps; `None` unless 0 < phi < 1.
    pub half_life: Option<f64>,
    /// Dickey-Fuller style t-statistic of the spread; more negative means
    /// stronger evidence of stationarity.
    pub adf_statistic: Option<f64>,
}

impl PairDiagnostics {
    /// Diagnostics from aligned, strictly positive prices.
    pub fn compute(prices_a: &[f64], prices_b: &[f64]) -> Self {
        let n = prices_a.len().min(prices_b.len());
        let log_a: Vec<f64> = prices_a[..n].iter().map(|p| p.ln()).collect();
        let log_b: Vec<f64> = prices_b[..n].iter().map(|p| p.ln()).collect();

        let returns_a: Vec<f64> = log_a.windows(2).map(|w| w[1] - w[0]).collect();
        let returns_b: Vec<f64> = log_b.windows(2).map(|w| w[1] - w[0]).collect();

        let beta = rolling_beta(&log_a, &log_b, n.max(2));
        let spread: Vec<f64> = log_a
            .iter()
            .zip(&log_b)
            .map(|(a, b)| a - beta * b)
            .collect();

        let ar1_phi = ar1_coefficient(&spread);
        Self {
            return_correlation: correlation(&returns_a, &returns_b),
            full_sample_beta: beta,
            ar1_phi,
            half_life: ar1_phi.and_then(half_life),
            adf_statistic: adf_statistic(&spread),
        }
    }
}

/// Least-squares slope of `spread[t]` on `spread[t-1]`.
pub fn ar1_coefficient(spread: &[f64]) -> Option<f64> {
    if spread.len() < 3 {
        return None;
    }
    ols_slope(&spread[..spread.len() - 1], &spread[1..])
}

/// Half-life `-ln(2) / ln(phi)`, defined for 0 < phi < 1.
pub fn half_life(phi: f64) -> Option<f64> {
    if phi > 0.0 && phi < 1.0 {
        Some(-std::f64::consts::LN_2 / phi.ln())
    } else {
        None
    }
}

/// t-statistic of `b` in `Δs[t] = a + b * s[t-1] + e[t]`.
pub fn adf_statistic(spread: &[f64]) -> Option<f64> {
    if spread.len() < 4 {
        return None;
    }
    let lag = &spread[..spread.len() - 1];
    let diff: Vec<f64> = spread.windows(2).map(|w| w[1] - w[0]).collect();
    let m = lag.len() as f64;

    let b = ols_slope(lag, &diff)?;
    let mean_lag = lag.iter().sum::<f64>() / m;
    let mean_diff = diff.iter().sum::<f64>() / m;
    let a = mean_diff - b * mean_lag;

    let sse: f64 = lag
        .iter()
        .zip(&diff)
        .map(|(x, y)| (y - a - b * x).powi(2))
        .sum();
    let sxx: f64 = lag.iter().map(|x| (x - mean_lag).powi(2)).sum();
    let se = (sse / (m - 2.0) / sxx).sqrt();
    if se > 0.0 && se.is_finite() {
        Some(b / se)
    } else {
        None
    }
}

fn ols_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    let m = x.len() as f64;
    let mx = x.iter().sum::<f64>() / m;
    let my = y.iter().sum::<f64>() / m;
    let sxx: f64 = x.iter().map(|v| (v - mx).powi(2)).sum();
    if sxx <= 1e-18 {
        return None;
    }
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    Some(sxy / sxx)
}
