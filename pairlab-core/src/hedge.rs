//! Rolling hedge ratio: OLS slope of log A on log B over a trailing window.
//!
//! Two estimators share the same contract:
//! - [`rolling_beta`] recomputes the regression from the trailing slice.
//! - [`RollingOls`] keeps running sums over a ring buffer and is O(1) per step.
//!
//! Both fall back to [`FALLBACK_BETA`] when the window variance of B is at or
//! below [`VARIANCE_EPSILON`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::stats::{covariance, mean, trailing, VARIANCE_EPSILON};

pub const FALLBACK_BETA: f64 = 1.0;

/// Which estimator the engine uses for the hedge ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetaMethod {
    #[default]
    Batch,
    Recursive,
}

/// OLS slope of `log_a` on `log_b` over the most recent `window` points.
///
/// Both slices are histories ending at the current step. If they differ in
/// length only the trailing overlap is used.
pub fn rolling_beta(log_a: &[f64], log_b: &[f64], window: usize) -> f64 {
    let n = log_a.len().min(log_b.len()).min(window);
    if n < 2 {
        return FALLBACK_BETA;
    }
    let a = trailing(log_a, n);
    let b = trailing(log_b, n);

    let mb = mean(b);
    let var_b = b.iter().map(|v| (v - mb).powi(2)).sum::<f64>() / n as f64;
    if var_b <= VARIANCE_EPSILON {
        return FALLBACK_BETA;
    }
    covariance(a, b) / var_b
}

/// Incremental rolling OLS over a fixed window.
///
/// Sums are kept relative to an anchor point so cancellation stays small for
/// log prices far from zero. The anchor is reset and the sums rebuilt from the
/// buffer once per window length, which bounds accumulated rounding error.
#[derive(Debug, Clone)]
pub struct RollingOls {
    window: usize,
    buf: VecDeque<(f64, f64)>,
    anchor: (f64, f64),
    sum_a: f64,
    sum_b: f64,
    sum_bb: f64,
    sum_ab: f64,
    since_resync: usize,
}

impl RollingOls {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "RollingOls window must be >= 2");
        Self {
            window,
            buf: VecDeque::with_capacity(window),
            anchor: (0.0, 0.0),
            sum_a: 0.0,
            sum_b: 0.0,
            sum_bb: 0.0,
            sum_ab: 0.0,
            since_resync: 0,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Add the newest (log A, log B) observation, evicting the oldest if full.
    pub fn push(&mut self, log_a: f64, log_b: f64) {
        if self.buf.is_empty() {
            self.anchor = (log_a, log_b);
        }
        if self.buf.len() == self.window {
            if let Some((old_a, old_b)) = self.buf.pop_front() {
                self.remove(old_a, old_b);
            }
        }
        self.buf.push_back((log_a, log_b));
        self.add(log_a, log_b);

        self.since_resync += 1;
        if self.since_resync >= self.window {
            self.resync();
        }
    }

    /// Current slope, or [`FALLBACK_BETA`] on a degenerate window.
    pub fn beta(&self) -> f64 {
        let n = self.buf.len();
        if n < 2 {
            return FALLBACK_BETA;
        }
        let n = n as f64;
        let mean_a = self.sum_a / n;
        let mean_b = self.sum_b / n;
        let var_b = self.sum_bb / n - mean_b * mean_b;
        if var_b <= VARIANCE_EPSILON {
            return FALLBACK_BETA;
        }
        let cov_ab = self.sum_ab / n - mean_a * mean_b;
        cov_ab / var_b
    }

    fn add(&mut self, log_a: f64, log_b: f64) {
        let da = log_a - self.anchor.0;
        let db = log_b - self.anchor.1;
        self.sum_a += da;
        self.sum_b += db;
        self.sum_bb += db * db;
        self.sum_ab += da * db;
    }

    fn remove(&mut self, log_a: f64, log_b: f64) {
        let da = log_a - self.anchor.0;
        let db = log_b - self.anchor.1;
        self.sum_a -= da;
        self.sum_b -= db;
        self.sum_bb -= db * db;
        self.sum_ab -= da * db;
    }

    fn resync(&mut self) {
        self.since_resync = 0;
        let Some(&front) = self.buf.front() else {
            return;
        };
        self.anchor = front;
        self.sum_a = 0.0;
        self.sum_b = 0.0;
        self.sum_bb = 0.0;
        self.sum_ab = 0.0;
        let points: Vec<(f64, f64)> = self.buf.iter().copied().collect();
        for (a, b) in points {
            self.add(a, b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logs(prices: &[f64]) -> Vec<f64> {
        prices.iter().map(|p| p.ln()).collect()
    }

    #[test]
    fn exact_linear_relation_recovers_slope() {
        let b: Vec<f64> = (0..50).map(|i| 4.0 + 0.01 * i as f64).collect();
        let a: Vec<f64> = b.iter().map(|x| 0.3 + 1.7 * x).collect();
        let beta = rolling_beta(&a, &b, 20);
        assert!((beta - 1.7).abs() < 1e-9, "beta = {beta}");
    }

    #[test]
    fn uses_only_trailing_window() {
        // First half slope 1, second half slope 3.
        let b: Vec<f64> = (0..40).map(|i| i as f64 * 0.1).collect();
        let a: Vec<f64> = b
            .iter()
            .enumerate()
            .map(|(i, x)| if i < 20 { *x } else { 3.0 * x })
            .collect();
        assert!((rolling_beta(&a, &b, 20) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn constant_b_falls_back_to_one() {
        let a = logs(&[100.0, 101.0, 99.0, 102.0, 98.0]);
        let b = logs(&[50.0; 5]);
        let beta = rolling_beta(&a, &b, 5);
        assert_eq!(beta, FALLBACK_BETA);
        assert!(beta.is_finite());
    }

    #[test]
    fn single_point_falls_back() {
        assert_eq!(rolling_beta(&[1.0], &[2.0], 10), FALLBACK_BETA);
        assert_eq!(rolling_beta(&[], &[], 10), FALLBACK_BETA);
    }

    #[test]
    fn recursive_matches_batch() {
        let n = 500;
        let b: Vec<f64> = (0..n)
            .map(|i| 4.6 + 0.05 * (i as f64 * 0.13).sin() + 0.0001 * i as f64)
            .collect();
        let a: Vec<f64> = b
            .iter()
            .enumerate()
            .map(|(i, x)| 0.9 * x + 0.01 * (i as f64 * 0.71).cos())
            .collect();

        let window = 30;
        let mut ols = RollingOls::new(window);
        for t in 0..n {
            ols.push(a[t], b[t]);
            let batch = rolling_beta(&a[..=t], &b[..=t], window);
            assert!(
                (ols.beta() - batch).abs() < 1e-9,
                "mismatch at {t}: recursive={}, batch={batch}",
                ols.beta()
            );
        }
    }

    #[test]
    fn recursive_constant_b_falls_back() {
        let mut ols = RollingOls::new(5);
        for i in 0..12 {
            ols.push(4.0 + 0.01 * i as f64, 3.0);
        }
        assert_eq!(ols.beta(), FALLBACK_BETA);
        assert_eq!(ols.len(), 5);
    }
}
