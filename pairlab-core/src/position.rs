//! Position state machine with hysteresis and a hard stop.
//!
//! States: `Flat`, `LongShort`, `ShortLong`. Initial and terminal state is
//! `Flat`.
//!
//! - Flat + non-flat signal: enter with the signal's side, size and beta.
//! - Open + |z| >= hard_stop_z: force close (structural-break fail-safe).
//! - Open + |z| <= exit_z: normal close.
//! - Open otherwise: stay on the same side, blend size toward the signal's
//!   size, adopt the signal's beta.
//!
//! Because entry needs |z| >= entry_z and exit needs |z| <= exit_z with
//! entry_z > exit_z, a z-path that stays strictly inside (exit_z, entry_z)
//! never changes the state.

use serde::{Deserialize, Serialize};

use crate::config::PairConfig;
use crate::domain::{ExitReason, Side};
use crate::signal::Signal;

/// Linear interpolation from `current` toward `target`, clamped to `[0, max]`.
///
/// `weight` is the share given to `target`: 0 keeps the current size, 1 jumps
/// straight to the target.
pub fn blend_size(current: f64, target: f64, weight: f64, max: f64) -> f64 {
    ((1.0 - weight) * current + weight * target).clamp(0.0, max)
}

/// Notional exposure per leg, as a fraction of capital.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LegTargets {
    pub a: f64,
    pub b: f64,
}

impl LegTargets {
    pub const FLAT: LegTargets = LegTargets { a: 0.0, b: 0.0 };

    /// Sum of absolute changes across both legs.
    pub fn turnover_from(&self, prev: &LegTargets) -> f64 {
        (self.a - prev.a).abs() + (self.b - prev.b).abs()
    }
}

/// Mutable, per-run position state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub side: Side,
    pub size: f64,
    pub beta: f64,
    /// Steps carried since entry.
    pub holding: usize,
    pub entry_index: usize,
    pub entry_z: f64,
}

impl Default for PositionState {
    fn default() -> Self {
        Self::flat()
    }
}

impl PositionState {
    pub fn flat() -> Self {
        Self {
            side: Side::Flat,
            size: 0.0,
            beta: 1.0,
            holding: 0,
            entry_index: 0,
            entry_z: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.side.is_flat()
    }

    /// Leg targets implied by this state: A = ±size, B = ∓size·beta.
    pub fn leg_targets(&self) -> LegTargets {
        let sign = self.side.leg_sign();
        if sign == 0.0 {
            return LegTargets::FLAT;
        }
        LegTargets {
            a: sign * self.size,
            b: -sign * self.size * self.beta,
        }
    }
}

/// Summary of a position at the moment it was closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedPosition {
    pub side: Side,
    pub entry_index: usize,
    pub exit_index: usize,
    pub holding: usize,
    pub entry_z: f64,
    pub exit_z: f64,
    pub reason: ExitReason,
}

/// What happened to the position on one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    StayFlat,
    Enter(Side),
    Hold,
    Exit(ClosedPosition),
}

/// Thresholds and sizing the state machine depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineParams {
    pub exit_z: f64,
    pub hard_stop_z: f64,
    pub max_position: f64,
    pub size_smoothing: f64,
}

impl From<&PairConfig> for MachineParams {
    fn from(config: &PairConfig) -> Self {
        Self {
            exit_z: config.exit_z,
            hard_stop_z: config.hard_stop_z,
            max_position: config.max_position,
            size_smoothing: config.size_smoothing,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PositionMachine {
    params: MachineParams,
    state: PositionState,
    trades_closed: usize,
}

impl PositionMachine {
    pub fn new(params: MachineParams) -> Self {
        Self {
            params,
            state: PositionState::flat(),
            trades_closed: 0,
        }
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn trades_closed(&self) -> usize {
        self.trades_closed
    }

    /// Apply one fresh signal.
    pub fn on_signal(&mut self, signal: &Signal) -> Transition {
        match self.state.side {
            Side::Flat => match signal.side {
                Side::Flat => Transition::StayFlat,
                side @ (Side::LongShort | Side::ShortLong) => {
                    self.state = PositionState {
                        side,
                        size: signal.size.clamp(0.0, self.params.max_position),
                        beta: signal.beta,
                        holding: 0,
                        entry_index: signal.index,
                        entry_z: signal.z,
                    };
                    tracing::debug!(
                        index = signal.index,
                        %side,
                        z = signal.z,
                        size = self.state.size,
                        "enter"
                    );
                    Transition::Enter(side)
                }
            },
            Side::LongShort | Side::ShortLong => {
                self.state.holding += 1;
                let abs_z = signal.z.abs();
                if abs_z >= self.params.hard_stop_z {
                    Transition::Exit(self.close(signal.index, signal.z, ExitReason::HardStop))
                } else if abs_z <= self.params.exit_z {
                    Transition::Exit(self.close(signal.index, signal.z, ExitReason::ExitBand))
                } else {
                    self.state.size = blend_size(
                        self.state.size,
                        signal.size,
                        self.params.size_smoothing,
                        self.params.max_position,
                    );
                    self.state.beta = signal.beta;
                    Transition::Hold
                }
            }
        }
    }

    /// Close whatever is open at the end of the history.
    ///
    /// Does not advance the holding counter; call after `on_signal` for the
    /// final step.
    pub fn force_close(&mut self, index: usize, z: f64) -> Option<ClosedPosition> {
        if self.state.is_flat() {
            return None;
        }
        Some(self.close(index, z, ExitReason::EndOfData))
    }

    fn close(&mut self, index: usize, z: f64, reason: ExitReason) -> ClosedPosition {
        let closed = ClosedPosition {
            side: self.state.side,
            entry_index: self.state.entry_index,
            exit_index: index,
            holding: index.saturating_sub(self.state.entry_index),
            entry_z: self.state.entry_z,
            exit_z: z,
            reason,
        };
        tracing::debug!(
            index,
            side = %closed.side,
            z,
            holding = closed.holding,
            ?reason,
            "exit"
        );
        self.state = PositionState::flat();
        self.trades_closed += 1;
        closed
    }
}
