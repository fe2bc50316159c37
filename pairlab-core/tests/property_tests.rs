//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Bounds: size in [0, max_position], leverage in [0, max_leverage]
//! 2. Determinism: identical inputs give identical results
//! 3. Cost monotonicity: higher costs never raise cumulative return
//! 4. Hysteresis: z inside (exit_z, entry_z) never changes the state
//! 5. Degenerate variance: constant B pins beta to 1

use proptest::prelude::*;
use pairlab_core::domain::Side;
use pairlab_core::hedge::{rolling_beta, BetaMethod};
use pairlab_core::position::{MachineParams, PositionMachine, Transition};
use pairlab_core::signal::{classify, Signal, Thresholds};
use pairlab_core::stats::VarianceKind;
use pairlab_core::{run_backtest, PairConfig};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_config() -> impl Strategy<Value = PairConfig> {
    (
        (2usize..80, proptest::option::of(2usize..120)),
        (0.5..2.5_f64, 0.0..0.9_f64, 0.1..5.0_f64),
        (0.1..=1.0_f64, 0.5..4.0_f64, 0.0..20.0_f64),
        (proptest::option::of(0.05..0.5_f64), 2usize..60, 0.5..10.0_f64),
        (0.0..=1.0_f64, any::<bool>(), any::<bool>()),
    )
        .prop_map(
            |(
                (lookback, beta_lookback),
                (entry_z, exit_frac, stop_gap),
                (max_position, position_slope, tc_bps_per_leg),
                (vol_target, vol_lookback, max_leverage),
                (size_smoothing, population, recursive),
            )| PairConfig {
                lookback,
                beta_lookback,
                entry_z,
                exit_z: entry_z * exit_frac,
                hard_stop_z: entry_z + stop_gap,
                max_position,
                position_slope,
                tc_bps_per_leg,
                vol_target,
                vol_lookback,
                max_leverage,
                size_smoothing,
                variance_kind: if population {
                    VarianceKind::Population
                } else {
                    VarianceKind::Sample
                },
                beta_method: if recursive {
                    BetaMethod::Recursive
                } else {
                    BetaMethod::Batch
                },
                periods_per_year: 252.0,
            },
        )
}

fn arb_path(len: usize) -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(-0.05..0.05_f64, len).prop_map(|returns| {
        let mut log_price = 50.0_f64.ln();
        returns
            .into_iter()
            .map(|r| {
                log_price += r;
                log_price.exp()
            })
            .collect()
    })
}

fn arb_pair() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (0usize..250).prop_flat_map(|n| (arb_path(n), arb_path(n)))
}

fn cumulative(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

// ── 1. Bounds ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn size_and_leverage_stay_in_bounds(config in arb_config(), (a, b) in arb_pair()) {
        let result = run_backtest(&a, &b, &config).unwrap();
        prop_assert_eq!(result.steps.len(), a.len().saturating_sub(1));
        for step in &result.steps {
            prop_assert!(step.size >= 0.0 && step.size <= config.max_position);
            prop_assert!(step.signal.size >= 0.0 && step.signal.size <= config.max_position);
            prop_assert!(step.leverage >= 0.0 && step.leverage <= config.max_leverage);
            prop_assert!(step.raw_return.is_finite());
            prop_assert!(step.levered_return.is_finite());
            prop_assert!(step.beta.is_finite());
            if step.side == Side::Flat {
                prop_assert_eq!(step.size, 0.0);
            }
        }
        if let Some(last) = result.steps.last() {
            prop_assert_eq!(last.side, Side::Flat);
        }
    }
}

// ── 2. Determinism ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn identical_inputs_identical_results(config in arb_config(), (a, b) in arb_pair()) {
        let r1 = run_backtest(&a, &b, &config).unwrap();
        let r2 = run_backtest(&a, &b, &config).unwrap();
        prop_assert_eq!(r1, r2);
    }
}

// ── 3. Cost monotonicity ─────────────────────────────────────────────

proptest! {
    /// At unit leverage, a higher per-leg cost never raises cumulative return.
    #[test]
    fn higher_costs_never_help(
        config in arb_config(),
        (a, b) in arb_pair(),
        low in 0.0..10.0_f64,
        extra in 0.0..50.0_f64,
    ) {
        let cheap = PairConfig { tc_bps_per_leg: low, vol_target: None, ..config.clone() };
        let dear = PairConfig { tc_bps_per_leg: low + extra, vol_target: None, ..config };

        let r_cheap = run_backtest(&a, &b, &cheap).unwrap();
        let r_dear = run_backtest(&a, &b, &dear).unwrap();

        // Costs do not feed back into positions.
        prop_assert_eq!(r_cheap.trades.len(), r_dear.trades.len());
        for (c, d) in r_cheap.steps.iter().zip(&r_dear.steps) {
            prop_assert!(d.raw_return <= c.raw_return + 1e-15);
        }
        // Compounding is monotone only while no step wipes out the book.
        let (dear_path, cheap_path) = (r_dear.levered_returns(), r_cheap.levered_returns());
        if dear_path.iter().chain(&cheap_path).all(|r| *r > -1.0) {
            prop_assert!(cumulative(&dear_path) <= cumulative(&cheap_path) + 1e-12);
        }
    }
}

// ── 4. Hysteresis ────────────────────────────────────────────────────

proptest! {
    /// A z-path strictly inside (exit_z, entry_z) never flips the side,
    /// whether the machine starts flat or already holds a position.
    #[test]
    fn band_oscillation_never_flips(
        config in arb_config(),
        fractions in proptest::collection::vec((0.01..0.99_f64, any::<bool>()), 1..100),
    ) {
        let thresholds = Thresholds::from(&config);
        let mut flat = PositionMachine::new(MachineParams::from(&config));
        let mut open = PositionMachine::new(MachineParams::from(&config));

        let make = |index: usize, z: f64| {
            let (side, size) = classify(z, &thresholds);
            Signal { index, z, beta: 1.0, spread: 0.0, spread_mean: 0.0, spread_std: 1.0, side, size }
        };
        let opening_z = (config.entry_z + config.hard_stop_z) / 2.0;
        prop_assert!(matches!(open.on_signal(&make(0, opening_z)), Transition::Enter(_)));
        let held_side = open.state().side;

        for (i, (frac, negative)) in fractions.iter().enumerate() {
            let magnitude = config.exit_z + frac * (config.entry_z - config.exit_z);
            let z = if *negative { -magnitude } else { magnitude };
            let signal = make(i + 1, z);
            prop_assert_eq!(flat.on_signal(&signal), Transition::StayFlat);
            prop_assert_eq!(open.on_signal(&signal), Transition::Hold);
            prop_assert_eq!(open.state().side, held_side);
        }
    }
}

// ── 5. Degenerate variance ───────────────────────────────────────────

proptest! {
    #[test]
    fn constant_b_gives_unit_beta(a in arb_path(120), level in 1.0..500.0_f64, window in 2usize..150) {
        let la: Vec<f64> = a.iter().map(|p| p.ln()).collect();
        let lb = vec![level.ln(); la.len()];
        prop_assert_eq!(rolling_beta(&la, &lb, window), 1.0);
    }
}
