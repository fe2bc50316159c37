//! Integration tests for the sequential pair engine.
//!
//! Tests:
//! 1. Co-integrated pair: the strategy trades and mostly wins; z ignores price level
//! 2. Trade accounting: trade returns compound their steps' raw returns
//! 3. Degenerate B: beta falls back to 1 everywhere
//! 4. Volatility targeting: leverage warms up from zero and respects the cap
//! 5. Frictionless runs pay nothing

use pairlab_core::data::{cointegrated_pair, independent_walks};
use pairlab_core::domain::{ExitReason, Side};
use pairlab_core::{run_backtest, PairConfig, PairEngine, RunResult};

fn cointegrated_config() -> PairConfig {
    PairConfig {
        beta_lookback: Some(250),
        ..PairConfig::default()
    }
}

fn step_win_rate(result: &RunResult) -> f64 {
    let active: Vec<f64> = result
        .levered_returns()
        .into_iter()
        .filter(|r| *r != 0.0)
        .collect();
    active.iter().filter(|r| **r > 0.0).count() as f64 / active.len() as f64
}

#[test]
fn cointegrated_pair_trades_and_wins() {
    // B tracks half of A from 100, traded with the default thresholds.
    for seed in [1, 2, 3] {
        let pair = cointegrated_pair(2_000, seed);

        let result = run_backtest(&pair.a, &pair.b, &PairConfig::default()).unwrap();
        assert!(result.trades.len() >= 10, "seed {seed}: only {} trades", result.trades.len());
        let winners = result.trades.iter().filter(|t| t.is_winner()).count();
        let trade_win_rate = winners as f64 / result.trades.len() as f64;
        assert!(trade_win_rate > 0.6, "seed {seed}: trade win rate {trade_win_rate}");

        let rate = step_win_rate(&result);
        assert!(rate > 0.5, "seed {seed}: per-step win rate {rate}");
    }
}

#[test]
fn z_score_ignores_price_level() {
    let pair = cointegrated_pair(800, 4);
    let scaled_b: Vec<f64> = pair.b.iter().map(|p| p * 40.0).collect();
    let config = PairConfig::default();

    let base = run_backtest(&pair.a, &pair.b, &config).unwrap();
    let scaled = run_backtest(&pair.a, &scaled_b, &config).unwrap();
    for (x, y) in base.steps.iter().zip(&scaled.steps) {
        assert!((x.signal.z - y.signal.z).abs() < 1e-6, "step {}", x.index);
    }
}

#[test]
fn trade_returns_compound_their_steps() {
    let pair = cointegrated_pair(1_000, 9);
    let config = PairConfig {
        vol_target: Some(0.1),
        ..cointegrated_config()
    };
    let result = run_backtest(&pair.a, &pair.b, &config).unwrap();
    assert!(!result.trades.is_empty());

    for trade in &result.trades {
        let span = result
            .steps
            .iter()
            .filter(|s| s.index >= trade.entry_step && s.index <= trade.exit_step);
        let (net, levered) = span.fold((1.0, 1.0), |(n, l), s| {
            (n * (1.0 + s.raw_return), l * (1.0 + s.levered_return))
        });
        assert!((trade.net_return - (net - 1.0)).abs() < 1e-12);
        assert!((trade.levered_return - (levered - 1.0)).abs() < 1e-12);
        assert_eq!(trade.holding_period, trade.exit_step - trade.entry_step);

        let entry = &result.steps[trade.entry_step - 1];
        assert_eq!(entry.index, trade.entry_step);
        assert_eq!(entry.side, trade.side);
        assert_eq!(entry.signal.z, trade.entry_z);

        let exit = &result.steps[trade.exit_step - 1];
        assert_eq!(exit.side, Side::Flat);
        match trade.exit_reason {
            ExitReason::ExitBand => assert!(trade.exit_z.abs() <= config.exit_z),
            ExitReason::HardStop => assert!(trade.exit_z.abs() >= config.hard_stop_z),
            ExitReason::EndOfData => assert_eq!(trade.exit_step, result.steps.len()),
        }
    }
}

#[test]
fn constant_b_uses_fallback_beta() {
    let a = independent_walks(200, 4).a;
    let b = vec![25.0; a.len()];
    let result = run_backtest(&a, &b, &PairConfig::default()).unwrap();
    assert!(result.steps.iter().all(|s| s.signal.beta == 1.0));
    assert!(result.steps.iter().all(|s| s.raw_return.is_finite()));
}

#[test]
fn vol_targeting_warms_up_and_respects_cap() {
    let pair = cointegrated_pair(800, 21);
    let config = PairConfig {
        vol_target: Some(0.15),
        vol_lookback: 30,
        max_leverage: 3.0,
        ..cointegrated_config()
    };
    let result = run_backtest(&pair.a, &pair.b, &config).unwrap();

    // No prior raw returns on the first step, hence no leverage.
    assert_eq!(result.steps[0].leverage, 0.0);
    assert!(result.leverages().iter().all(|l| (0.0..=3.0).contains(l)));
    assert!(result.leverages().iter().any(|l| *l > 0.0));
    for step in &result.steps {
        assert_eq!(step.levered_return, step.raw_return * step.leverage);
    }
}

#[test]
fn frictionless_runs_pay_nothing() {
    let pair = cointegrated_pair(500, 8);
    let config = PairConfig {
        tc_bps_per_leg: 0.0,
        ..cointegrated_config()
    };
    let result = run_backtest(&pair.a, &pair.b, &config).unwrap();
    assert!(result.steps.iter().all(|s| s.cost == 0.0));
    assert!(result
        .steps
        .iter()
        .all(|s| s.raw_return == s.pair_return));
}

#[test]
fn engine_is_reusable_across_pairs() {
    let engine = PairEngine::new(cointegrated_config()).unwrap();
    let first = cointegrated_pair(300, 1);
    let second = cointegrated_pair(300, 2);

    let r1 = engine.run(&first.a, &first.b).unwrap();
    let _ = engine.run(&second.a, &second.b).unwrap();
    let again = engine.run(&first.a, &first.b).unwrap();
    assert_eq!(r1, again);
}
