//! Cost model and per-step PnL accounting.
//!
//! Costs are linear in turnover: every unit of notional traded on either leg
//! pays `tc_bps_per_leg` basis points. Opening, closing and resizing are all
//! charged the same way.

use crate::domain::Side;
use crate::position::{LegTargets, PositionState};

/// Linear per-leg transaction cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    /// Cost per leg in basis points of notional traded.
    pub bps_per_leg: f64,
}

impl CostModel {
    pub fn new(bps_per_leg: f64) -> Self {
        Self { bps_per_leg }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0)
    }

    /// Cost of moving from `prev` to `next`, as a fraction of capital.
    pub fn turnover_cost(&self, prev: &LegTargets, next: &LegTargets) -> f64 {
        next.turnover_from(prev) * self.bps_per_leg / 10_000.0
    }
}

/// Return of a pair position over one period of leg log-returns.
///
/// `LongShort` earns `size * (r_a - beta * r_b)`, `ShortLong` the negative.
pub fn pair_return(position: &PositionState, r_a: f64, r_b: f64) -> f64 {
    match position.side {
        Side::Flat => 0.0,
        Side::LongShort => position.size * (r_a - position.beta * r_b),
        Side::ShortLong => position.size * (position.beta * r_b - r_a),
    }
}

/// Accounting outcome of one step, before leverage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPnl {
    pub pair_return: f64,
    pub cost: f64,
    pub raw_return: f64,
    pub targets: LegTargets,
}

impl StepPnl {
    /// Remove this step's cost and return it, leaving the gross return.
    pub fn defer_cost(&mut self) -> f64 {
        let cost = self.cost;
        self.cost = 0.0;
        self.raw_return = self.pair_return;
        cost
    }

    /// Book an additional cost against this step.
    pub fn charge(&mut self, cost: f64) {
        self.cost += cost;
        self.raw_return -= cost;
    }
}

/// Settle one step.
///
/// `held` is the position carried over `(t-1, t]` and earns the period's
/// returns; `next` is the position after this step's transition, whose leg
/// targets are compared against `prev_targets` to charge turnover.
pub fn settle_step(
    cost_model: &CostModel,
    held: &PositionState,
    next: &PositionState,
    prev_targets: &LegTargets,
    r_a: f64,
    r_b: f64,
) -> StepPnl {
    let gross = pair_return(held, r_a, r_b);
    let targets = next.leg_targets();
    let cost = cost_model.turnover_cost(prev_targets, &targets);
    StepPnl {
        pair_return: gross,
        cost,
        raw_return: gross - cost,
        targets,
    }
}
