//! Sequential backtest loop: a strict left-to-right fold over the history.
//!
//! For each step t in 1..n, in this order:
//! 1. Signal from log prices up to t.
//! 2. State transition (the final step also force-closes an open position).
//! 3. Settle the period (t-1, t]: the position carried in earns the leg
//!    returns, the change of leg targets pays turnover cost. The cost of
//!    opening a position is booked one step later, with the first period the
//!    position is held, so every cost lands on a step with market exposure.
//! 4. Scale the raw return by the leverage decided from earlier returns.
//!
//! Index 0 only seeds the hedge and spread windows; it produces no step.
//! Entries never happen on the final step, so a deferred opening cost is
//! always booked within the run.

use crate::config::PairConfig;
use crate::domain::{align_trailing, Leg, PriceSeries, TradeRecord};
use crate::position::{ClosedPosition, LegTargets, MachineParams, PositionMachine, Transition};
use crate::signal::SignalGenerator;

use super::accounting::{settle_step, CostModel};
use super::state::{EngineError, RunResult, RunStatus, StepRecord};
use super::vol_target::VolTargeter;

/// A validated configuration, ready to run any number of pairs.
///
/// Each call to [`PairEngine::run`] builds fresh state, so one engine can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct PairEngine {
    config: PairConfig,
}

impl PairEngine {
    pub fn new(config: PairConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PairConfig {
        &self.config
    }

    /// Run the backtest over two price histories.
    ///
    /// Histories of different lengths are aligned on their most recent points.
    /// Fewer than two aligned points yields an `InsufficientData` result.
    pub fn run(&self, prices_a: &[f64], prices_b: &[f64]) -> Result<RunResult, EngineError> {
        let (prices_a, prices_b) = align_trailing(prices_a, prices_b);
        let series_a = PriceSeries::new(Leg::A, prices_a.to_vec())?;
        let series_b = PriceSeries::new(Leg::B, prices_b.to_vec())?;

        let n = series_a.len();
        if n < 2 {
            tracing::warn!(points = n, "insufficient data for a pair backtest");
            return Ok(RunResult::insufficient(n));
        }

        let log_a = series_a.to_log();
        let log_b = series_b.to_log();
        let (la, lb) = (log_a.values(), log_b.values());

        let mut generator = SignalGenerator::new(&self.config);
        let mut machine = PositionMachine::new(MachineParams::from(&self.config));
        let mut vol = VolTargeter::new(&self.config);
        let cost_model = CostModel::new(self.config.tc_bps_per_leg);

        generator.evaluate(la[0], lb[0]);

        let mut steps = Vec::with_capacity(n - 1);
        let mut trades = Vec::new();
        let mut prev_targets = LegTargets::FLAT;
        let mut open_trade: Option<OpenTrade> = None;
        let mut opening_cost = 0.0;

        for t in 1..n {
            let is_last = t == n - 1;
            let signal = generator.evaluate(la[t], lb[t]);
            let held = *machine.state();

            // No new position on the final step: it could never be carried.
            let transition = if is_last && held.is_flat() {
                Transition::StayFlat
            } else {
                machine.on_signal(&signal)
            };
            let closed = match transition {
                Transition::Exit(closed) => Some(closed),
                _ if is_last => machine.force_close(t, signal.z),
                _ => None,
            };
            let next = *machine.state();

            let mut pnl = settle_step(
                &cost_model,
                &held,
                &next,
                &prev_targets,
                log_a.log_return(t),
                log_b.log_return(t),
            );
            if matches!(transition, Transition::Enter(_)) {
                opening_cost = pnl.defer_cost();
            } else if !held.is_flat() {
                pnl.charge(std::mem::take(&mut opening_cost));
            }
            let leverage = vol.leverage();
            let levered_return = pnl.raw_return * leverage;
            vol.observe(pnl.raw_return);

            if matches!(transition, Transition::Enter(_)) {
                open_trade = Some(OpenTrade::default());
            }
            if let Some(trade) = open_trade.as_mut() {
                trade.accrue(pnl.raw_return, levered_return);
            }
            if let Some(closed) = closed {
                let trade = open_trade.take().unwrap_or_default();
                trades.push(trade.finish(closed));
            }

            steps.push(StepRecord {
                index: t,
                signal,
                side: next.side,
                size: next.size,
                beta: next.beta,
                pair_return: pnl.pair_return,
                cost: pnl.cost,
                raw_return: pnl.raw_return,
                leverage,
                levered_return,
                targets: pnl.targets,
            });
            prev_targets = pnl.targets;
        }

        tracing::debug!(
            points = n,
            steps = steps.len(),
            trades = trades.len(),
            "pair backtest complete"
        );

        Ok(RunResult {
            status: RunStatus::Completed,
            point_count: n,
            steps,
            trades,
            warnings: Vec::new(),
        })
    }
}

/// Validate `config` and run one backtest.
pub fn run_backtest(
    prices_a: &[f64],
    prices_b: &[f64],
    config: &PairConfig,
) -> Result<RunResult, EngineError> {
    PairEngine::new(config.clone())?.run(prices_a, prices_b)
}

/// Compounded growth of an open trade.
#[derive(Debug, Clone, Copy)]
struct OpenTrade {
    net_growth: f64,
    levered_growth: f64,
}

impl Default for OpenTrade {
    fn default() -> Self {
        Self {
            net_growth: 1.0,
            levered_growth: 1.0,
        }
    }
}

impl OpenTrade {
    fn accrue(&mut self, raw: f64, levered: f64) {
        self.net_growth *= 1.0 + raw;
        self.levered_growth *= 1.0 + levered;
    }

    fn finish(self, closed: ClosedPosition) -> TradeRecord {
        TradeRecord {
            side: closed.side,
            entry_step: closed.entry_index,
            exit_step: closed.exit_index,
            holding_period: closed.holding,
            entry_z: closed.entry_z,
            exit_z: closed.exit_z,
            exit_reason: closed.reason,
            net_return: self.net_growth - 1.0,
            levered_return: self.levered_growth - 1.0,
        }
    }
}
