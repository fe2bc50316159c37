//! Volatility-targeting controller.
//!
//! Leverage for step t is decided from the raw returns of the steps before t,
//! so the current return never scales itself.

use std::collections::VecDeque;

use crate::config::PairConfig;
use crate::stats::{std_dev, VarianceKind};

#[derive(Debug, Clone)]
pub struct VolTargeter {
    target: Option<f64>,
    max_leverage: f64,
    periods_per_year: f64,
    variance_kind: VarianceKind,
    lookback: usize,
    window: VecDeque<f64>,
}

impl VolTargeter {
    pub fn new(config: &PairConfig) -> Self {
        Self {
            target: config.vol_target,
            max_leverage: config.max_leverage,
            periods_per_year: config.periods_per_year,
            variance_kind: config.variance_kind,
            lookback: config.vol_lookback,
            window: VecDeque::with_capacity(config.vol_lookback),
        }
    }

    /// Annualized stdev of the trailing raw-return window. Zero with fewer
    /// than two observations.
    pub fn realized_vol(&mut self) -> f64 {
        std_dev(self.window.make_contiguous(), self.variance_kind) * self.periods_per_year.sqrt()
    }

    /// Leverage to apply to the next raw return.
    ///
    /// Without a target this is always 1. With a target it is
    /// `target / realized` clamped to `[0, max_leverage]`, and 0 while the
    /// realized vol is zero.
    pub fn leverage(&mut self) -> f64 {
        let Some(target) = self.target else {
            return 1.0;
        };
        let realized = self.realized_vol();
        if realized <= 0.0 {
            return 0.0;
        }
        (target / realized).clamp(0.0, self.max_leverage)
    }

    /// Record a settled raw return.
    pub fn observe(&mut self, raw_return: f64) {
        if self.window.len() == self.lookback {
            self.window.pop_front();
        }
        self.window.push_back(raw_return);
    }
}
