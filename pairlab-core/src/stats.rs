//! Statistics primitives over fixed windows.
//!
//! All functions are total: empty or too-short input returns 0.0 rather than
//! NaN, so callers can apply their own degeneracy fallbacks.

use serde::{Deserialize, Serialize};

/// Variance below this is treated as zero by the estimators built on top.
pub const VARIANCE_EPSILON: f64 = 1e-12;

/// Normalisation used for variance and standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceKind {
    /// Divide by n - 1. Needs at least two points.
    #[default]
    Sample,
    /// Divide by n.
    Population,
}

impl VarianceKind {
    fn denominator(self, n: usize) -> Option<f64> {
        match self {
            VarianceKind::Sample if n >= 2 => Some((n - 1) as f64),
            VarianceKind::Population if n >= 1 => Some(n as f64),
            _ => None,
        }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn variance(values: &[f64], kind: VarianceKind) -> f64 {
    let Some(denom) = kind.denominator(values.len()) else {
        return 0.0;
    };
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / denom
}

pub fn std_dev(values: &[f64], kind: VarianceKind) -> f64 {
    variance(values, kind).sqrt()
}

/// Population covariance of two equally long slices.
///
/// Only the common prefix is used if lengths differ.
pub fn covariance(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mx = mean(xs);
    let my = mean(ys);
    xs.iter()
        .zip(ys)
        .map(|(x, y)| (x - mx) * (y - my))
        .sum::<f64>()
        / n as f64
}

/// Pearson correlation, 0.0 when either side is constant.
pub fn correlation(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    let sx = std_dev(&xs[..n], VarianceKind::Population);
    let sy = std_dev(&ys[..n], VarianceKind::Population);
    if sx * sy < VARIANCE_EPSILON {
        return 0.0;
    }
    covariance(xs, ys) / (sx * sy)
}

/// The trailing `window` elements of `values` (all of them if shorter).
pub fn trailing(values: &[f64], window: usize) -> &[f64] {
    let start = values.len().saturating_sub(window);
    &values[start..]
}
