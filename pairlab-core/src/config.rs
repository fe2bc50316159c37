//! Strategy parameters for a single pair backtest.
//!
//! `PairConfig` is plain data: callers build it (or deserialize it from the
//! `[strategy]` table of a config file) and pass it by reference. Nothing in
//! the engine keeps a global default. Validation happens once, before the
//! first step, via [`PairConfig::validate`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hedge::BetaMethod;
use crate::stats::VarianceKind;

/// Configuration violations, reported at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be >= 2 (got {value})")]
    WindowTooShort { name: &'static str, value: usize },
    #[error("entry_z ({entry_z}) must exceed exit_z ({exit_z})")]
    NoHysteresis { entry_z: f64, exit_z: f64 },
    #[error("exit_z must be >= 0 (got {0})")]
    NegativeExitZ(f64),
    #[error("hard_stop_z ({hard_stop_z}) must exceed entry_z ({entry_z})")]
    HardStopInsideEntry { entry_z: f64, hard_stop_z: f64 },
    #[error("max_position must be in (0, 1] (got {0})")]
    MaxPositionOutOfRange(f64),
    #[error("position_slope must be > 0 (got {0})")]
    NonPositiveSlope(f64),
    #[error("tc_bps_per_leg must be finite and >= 0 (got {0})")]
    InvalidCost(f64),
    #[error("vol_target must be finite and > 0 when set (got {0})")]
    InvalidVolTarget(f64),
    #[error("max_leverage must be finite and > 0 (got {0})")]
    InvalidMaxLeverage(f64),
    #[error("size_smoothing must be in [0, 1] (got {0})")]
    SmoothingOutOfRange(f64),
    #[error("periods_per_year must be finite and > 0 (got {0})")]
    InvalidPeriodsPerYear(f64),
    #[error("{name} must be finite (got {value})")]
    NonFinite { name: &'static str, value: f64 },
}

/// Parameters of the spread strategy, the state machine, costs and sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairConfig {
    /// Z-score window length (spread history).
    pub lookback: usize,
    /// Hedge-ratio regression window. `None` means "same as `lookback`".
    pub beta_lookback: Option<usize>,
    pub entry_z: f64,
    pub exit_z: f64,
    pub hard_stop_z: f64,
    pub max_position: f64,
    /// |z| per unit of position size.
    pub position_slope: f64,
    /// Linear cost per leg, in basis points of notional turnover.
    pub tc_bps_per_leg: f64,
    /// Annualized volatility target. `None` disables leverage scaling.
    pub vol_target: Option<f64>,
    pub vol_lookback: usize,
    pub max_leverage: f64,
    /// Weight given to the fresh signal size when resizing an open position.
    pub size_smoothing: f64,
    /// Normalisation for the z-score and realized-vol windows.
    pub variance_kind: VarianceKind,
    pub beta_method: BetaMethod,
    pub periods_per_year: f64,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            lookback: 60,
            beta_lookback: None,
            entry_z: 1.0,
            exit_z: 0.2,
            hard_stop_z: 3.5,
            max_position: 1.0,
            position_slope: 2.0,
            tc_bps_per_leg: 1.0,
            vol_target: None,
            vol_lookback: 60,
            max_leverage: 5.0,
            size_smoothing: 0.5,
            variance_kind: VarianceKind::Sample,
            beta_method: BetaMethod::Batch,
            periods_per_year: 252.0,
        }
    }
}

impl PairConfig {
    /// Effective hedge-ratio window.
    pub fn beta_window(&self) -> usize {
        self.beta_lookback.unwrap_or(self.lookback)
    }

    /// Per-leg cost as a fraction of notional.
    pub fn tc_fraction(&self) -> f64 {
        self.tc_bps_per_leg / 10_000.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("lookback", self.lookback),
            ("beta_lookback", self.beta_window()),
            ("vol_lookback", self.vol_lookback),
        ] {
            if value < 2 {
                return Err(ConfigError::WindowTooShort { name, value });
            }
        }

        for (name, value) in [
            ("entry_z", self.entry_z),
            ("exit_z", self.exit_z),
            ("hard_stop_z", self.hard_stop_z),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
        }
        if self.exit_z < 0.0 {
            return Err(ConfigError::NegativeExitZ(self.exit_z));
        }
        if self.entry_z <= self.exit_z {
            return Err(ConfigError::NoHysteresis {
                entry_z: self.entry_z,
                exit_z: self.exit_z,
            });
        }
        if self.hard_stop_z <= self.entry_z {
            return Err(ConfigError::HardStopInsideEntry {
                entry_z: self.entry_z,
                hard_stop_z: self.hard_stop_z,
            });
        }

        if !(self.max_position > 0.0 && self.max_position <= 1.0) {
            return Err(ConfigError::MaxPositionOutOfRange(self.max_position));
        }
        if !(self.position_slope > 0.0 && self.position_slope.is_finite()) {
            return Err(ConfigError::NonPositiveSlope(self.position_slope));
        }
        if !(self.tc_bps_per_leg >= 0.0 && self.tc_bps_per_leg.is_finite()) {
            return Err(ConfigError::InvalidCost(self.tc_bps_per_leg));
        }
        if let Some(target) = self.vol_target {
            if !(target > 0.0 && target.is_finite()) {
                return Err(ConfigError::InvalidVolTarget(target));
            }
        }
        if !(self.max_leverage > 0.0 && self.max_leverage.is_finite()) {
            return Err(ConfigError::InvalidMaxLeverage(self.max_leverage));
        }
        if !(0.0..=1.0).contains(&self.size_smoothing) {
            return Err(ConfigError::SmoothingOutOfRange(self.size_smoothing));
        }
        if !(self.periods_per_year > 0.0 && self.periods_per_year.is_finite()) {
            return Err(ConfigError::InvalidPeriodsPerYear(self.periods_per_year));
        }
        Ok(())
    }
}
