//! Spread and signal generation.
//!
//! Per step t:
//! 1. Estimate beta from the trailing `beta_lookback` log prices.
//! 2. spread_t = logA[t] - beta * logB[t].
//! 3. Rebuild the trailing window of `lookback` spreads with the same beta and
//!    standardize spread_t against it.
//! 4. Classify |z| into a side and a recommended size.
//!
//! Rebuilding the window with one beta keeps z independent of the price
//! level: a beta update shifts every spread in the window alike.
//!
//! The generator is fed one observation at a time and keeps its own bounded
//! history, so it cannot see future prices.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::PairConfig;
use crate::domain::Side;
use crate::hedge::{rolling_beta, BetaMethod, RollingOls};
use crate::stats::{mean, std_dev, trailing, VarianceKind, VARIANCE_EPSILON};

/// Signal emitted for a single step. Freshly built each step, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Index into the aligned price history.
    pub index: usize,
    pub z: f64,
    pub beta: f64,
    pub spread: f64,
    pub spread_mean: f64,
    pub spread_std: f64,
    pub side: Side,
    /// Recommended size in [0, max_position].
    pub size: f64,
}

/// Entry thresholds and sizing used to classify a z-score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub entry_z: f64,
    pub hard_stop_z: f64,
    pub position_slope: f64,
    pub max_position: f64,
}

impl From<&PairConfig> for Thresholds {
    fn from(config: &PairConfig) -> Self {
        Self {
            entry_z: config.entry_z,
            hard_stop_z: config.hard_stop_z,
            position_slope: config.position_slope,
            max_position: config.max_position,
        }
    }
}

/// Map a z-score to a side and size.
///
/// Inside `[entry_z, hard_stop_z)` the side bets on reversion: a high spread
/// (z > 0) is sold (`ShortLong`), a low one bought (`LongShort`). Everything
/// else, including |z| beyond the hard stop, is flat with zero size.
pub fn classify(z: f64, thresholds: &Thresholds) -> (Side, f64) {
    let abs_z = z.abs();
    if abs_z >= thresholds.entry_z && abs_z < thresholds.hard_stop_z {
        let side = if z > 0.0 {
            Side::ShortLong
        } else {
            Side::LongShort
        };
        let size = (abs_z / thresholds.position_slope).clamp(0.0, thresholds.max_position);
        (side, size)
    } else {
        (Side::Flat, 0.0)
    }
}

/// Standardize `value` against `window`. Zero when the window has fewer than
/// two points or no dispersion.
pub fn z_score(value: f64, window: &[f64], kind: VarianceKind) -> (f64, f64, f64) {
    let mu = mean(window);
    if window.len() < 2 {
        return (0.0, mu, 0.0);
    }
    let sigma = std_dev(window, kind);
    if sigma * sigma <= VARIANCE_EPSILON {
        tracing::trace!(sigma, "degenerate spread window, z forced to 0");
        return (0.0, mu, sigma);
    }
    ((value - mu) / sigma, mu, sigma)
}

/// Stateful spread tracker. Feed it one step at a time, in order.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    lookback: usize,
    beta_window: usize,
    variance_kind: VarianceKind,
    thresholds: Thresholds,
    ols: Option<RollingOls>,
    history_a: VecDeque<f64>,
    history_b: VecDeque<f64>,
    spreads: Vec<f64>,
    next_index: usize,
}

impl SignalGenerator {
    pub fn new(config: &PairConfig) -> Self {
        let beta_window = config.beta_window();
        let ols = match config.beta_method {
            BetaMethod::Batch => None,
            BetaMethod::Recursive => Some(RollingOls::new(beta_window.max(2))),
        };
        let capacity = config.lookback.max(beta_window);
        Self {
            lookback: config.lookback,
            beta_window,
            variance_kind: config.variance_kind,
            thresholds: Thresholds::from(config),
            ols,
            history_a: VecDeque::with_capacity(capacity),
            history_b: VecDeque::with_capacity(capacity),
            spreads: Vec::with_capacity(config.lookback),
            next_index: 0,
        }
    }

    /// Number of observations seen so far.
    pub fn observed(&self) -> usize {
        self.next_index
    }

    /// Add the newest pair of log prices and evaluate that step.
    pub fn evaluate(&mut self, log_a: f64, log_b: f64) -> Signal {
        let t = self.next_index;
        self.next_index += 1;

        if self.history_a.len() == self.lookback.max(self.beta_window) {
            self.history_a.pop_front();
            self.history_b.pop_front();
        }
        self.history_a.push_back(log_a);
        self.history_b.push_back(log_b);
        let history_a = self.history_a.make_contiguous();
        let history_b = self.history_b.make_contiguous();

        let beta = match self.ols.as_mut() {
            Some(ols) => {
                ols.push(log_a, log_b);
                ols.beta()
            }
            None => rolling_beta(history_a, history_b, self.beta_window),
        };

        let spread = log_a - beta * log_b;
        self.spreads.clear();
        self.spreads.extend(
            trailing(history_a, self.lookback)
                .iter()
                .zip(trailing(history_b, self.lookback))
                .map(|(a, b)| a - beta * b),
        );

        let (z, spread_mean, spread_std) = z_score(spread, &self.spreads, self.variance_kind);
        let (side, size) = classify(z, &self.thresholds);

        Signal {
            index: t,
            z,
            beta,
            spread,
            spread_mean,
            spread_std,
            side,
            size,
        }
    }
}

/// Signals for every index of a log-price history, each computed from data up
/// to its own index.
pub fn signal_path(log_a: &[f64], log_b: &[f64], config: &PairConfig) -> Vec<Signal> {
    let mut generator = SignalGenerator::new(config);
    log_a
        .iter()
        .zip(log_b)
        .map(|(a, b)| generator.evaluate(*a, *b))
        .collect()
}
