//! Performance metrics: pure functions that reduce a run to summary scalars.
//!
//! Every metric is a pure function of the levered return path and/or the
//! trade list. Empty input yields 0.0, never NaN.

use serde::{Deserialize, Serialize};

use pairlab_core::domain::{ExitReason, TradeRecord};
use pairlab_core::stats::{mean, std_dev, VarianceKind};
use pairlab_core::StepRecord;

/// Aggregate performance metrics for a single pair backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub cumulative_return: f64,
    pub annualized_return: f64,
    pub annualized_vol: f64,
    pub sharpe: f64,
    /// Positive levered returns over non-zero levered returns.
    pub win_rate: f64,
    /// Trades with positive net return over all trades.
    pub trade_win_rate: f64,
    pub avg_holding_period: f64,
    pub trade_count: usize,
    pub max_drawdown: f64,
    pub hard_stop_count: usize,
    pub total_cost: f64,
    pub avg_leverage: f64,
    /// Share of steps that ended with an open position.
    pub active_fraction: f64,
    pub step_count: usize,
}

impl PerformanceMetrics {
    /// Compute all metrics from the per-step records and closed trades.
    pub fn compute(steps: &[StepRecord], trades: &[TradeRecord], periods_per_year: f64) -> Self {
        let returns: Vec<f64> = steps.iter().map(|s| s.levered_return).collect();
        let leverages: Vec<f64> = steps.iter().map(|s| s.leverage).collect();
        let active = steps.iter().filter(|s| !s.side.is_flat()).count();

        Self {
            cumulative_return: cumulative_return(&returns),
            annualized_return: annualized_return(&returns, periods_per_year),
            annualized_vol: annualized_vol(&returns, periods_per_year),
            sharpe: sharpe_ratio(&returns, periods_per_year),
            win_rate: win_rate(&returns),
            trade_win_rate: trade_win_rate(trades),
            avg_holding_period: avg_holding_period(trades),
            trade_count: trades.len(),
            max_drawdown: max_drawdown(&returns),
            hard_stop_count: hard_stop_count(trades),
            total_cost: steps.iter().map(|s| s.cost).sum(),
            avg_leverage: mean(&leverages),
            active_fraction: fraction(active, steps.len()),
            step_count: steps.len(),
        }
    }

    /// All-zero metrics, used when a run had too little data.
    pub fn empty() -> Self {
        Self::compute(&[], &[], 252.0)
    }
}

// ─── Individual metric functions ────────────────────────────────────

fn fraction(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Compounded return: Π(1 + r) - 1.
pub fn cumulative_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Geometric annualization: (1 + cumulative)^(periods_per_year / n) - 1.
///
/// A path that loses everything (growth <= 0) annualizes to -1.
pub fn annualized_return(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let growth = 1.0 + cumulative_return(returns);
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(periods_per_year / returns.len() as f64) - 1.0
}

/// Sample standard deviation scaled by sqrt(periods_per_year).
pub fn annualized_vol(returns: &[f64], periods_per_year: f64) -> f64 {
    std_dev(returns, VarianceKind::Sample) * periods_per_year.sqrt()
}

/// Annualized return over annualized volatility. 0.0 without dispersion.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    let vol = annualized_vol(returns, periods_per_year);
    if vol < 1e-15 {
        return 0.0;
    }
    annualized_return(returns, periods_per_year) / vol
}

/// Positive returns over non-zero returns.
pub fn win_rate(returns: &[f64]) -> f64 {
    let nonzero = returns.iter().filter(|r| **r != 0.0).count();
    let positive = returns.iter().filter(|r| **r > 0.0).count();
    fraction(positive, nonzero)
}

pub fn trade_win_rate(trades: &[TradeRecord]) -> f64 {
    fraction(trades.iter().filter(|t| t.is_winner()).count(), trades.len())
}

pub fn avg_holding_period(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.holding_period as f64).sum::<f64>() / trades.len() as f64
}

/// Maximum drawdown of the compounded equity path, as a negative fraction
/// (e.g. -0.15 = 15% drawdown). The path starts at 1 before the first return.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;
    for r in returns {
        equity *= 1.0 + r;
        peak = peak.max(equity);
        if peak > 0.0 {
            max_dd = max_dd.min((equity - peak) / peak);
        }
    }
    max_dd
}

pub fn hard_stop_count(trades: &[TradeRecord]) -> usize {
    trades
        .iter()
        .filter(|t| t.exit_reason == ExitReason::HardStop)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairlab_core::domain::Side;

    fn trade(net: f64, holding: usize, reason: ExitReason) -> TradeRecord {
        TradeRecord {
            side: Side::LongShort,
            entry_step: 1,
            exit_step: 1 + holding,
            holding_period: holding,
            entry_z: -1.2,
            exit_z: -0.1,
            exit_reason: reason,
            net_return: net,
            levered_return: net,
        }
    }

    #[test]
    fn empty_input_is_all_zero() {
        let m = PerformanceMetrics::empty();
        assert_eq!(m.cumulative_return, 0.0);
        assert_eq!(m.annualized_return, 0.0);
        assert_eq!(m.annualized_vol, 0.0);
        assert_eq!(m.sharpe, 0.0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.trade_win_rate, 0.0);
        assert_eq!(m.avg_holding_period, 0.0);
        assert_eq!(m.trade_count, 0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.avg_leverage, 0.0);
        assert_eq!(m.active_fraction, 0.0);
    }

    #[test]
    fn cumulative_compounds() {
        let c = cumulative_return(&[0.1, -0.1]);
        assert!((c - (1.1 * 0.9 - 1.0)).abs() < 1e-15);
    }

    #[test]
    fn annualization_is_geometric() {
        // 252 steps of a constant return annualize to the compounded year.
        let returns = vec![0.001; 252];
        let expected = 1.001_f64.powi(252) - 1.0;
        assert!((annualized_return(&returns, 252.0) - expected).abs() < 1e-12);

        // Half a year of the same path annualizes to the square.
        let half = vec![0.001; 126];
        let expected = 1.001_f64.powi(252) - 1.0;
        assert!((annualized_return(&half, 252.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn wiped_out_path_annualizes_to_minus_one() {
        assert_eq!(annualized_return(&[0.1, -1.0, 0.2], 252.0), -1.0);
    }

    #[test]
    fn sharpe_zero_without_dispersion() {
        assert_eq!(sharpe_ratio(&[0.001; 10], 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.01], 252.0), 0.0);
    }

    #[test]
    fn sharpe_sign_follows_return() {
        let up = [0.01, -0.005, 0.012, -0.002, 0.004];
        let down: Vec<f64> = up.iter().map(|r| -r).collect();
        assert!(sharpe_ratio(&up, 252.0) > 0.0);
        assert!(sharpe_ratio(&down, 252.0) < 0.0);
    }

    #[test]
    fn win_rate_ignores_flat_steps() {
        assert!((win_rate(&[0.0, 0.01, 0.0, -0.01, 0.02]) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(win_rate(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn trade_statistics() {
        let trades = vec![
            trade(0.01, 4, ExitReason::ExitBand),
            trade(-0.02, 2, ExitReason::HardStop),
            trade(0.005, 6, ExitReason::EndOfData),
        ];
        assert!((trade_win_rate(&trades) - 2.0 / 3.0).abs() < 1e-12);
        assert!((avg_holding_period(&trades) - 4.0).abs() < 1e-12);
        assert_eq!(hard_stop_count(&trades), 1);
    }

    #[test]
    fn drawdown_from_peak() {
        // Equity 1.1, 0.99, 1.188: drawdown (0.99 - 1.1) / 1.1 = -0.1
        let dd = max_drawdown(&[0.1, -0.1, 0.2]);
        assert!((dd + 0.1).abs() < 1e-12);
        assert_eq!(max_drawdown(&[0.01, 0.02]), 0.0);
    }

    #[test]
    fn first_step_loss_counts_as_drawdown() {
        assert!((max_drawdown(&[-0.05]) + 0.05).abs() < 1e-12);
    }
}
