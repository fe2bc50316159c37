//! A completed pair trade, entry to exit.

use serde::{Deserialize, Serialize};

use super::side::Side;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// |z| fell to or below the exit threshold.
    ExitBand,
    /// |z| reached the hard-stop threshold.
    HardStop,
    /// Still open on the last step of the history.
    EndOfData,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::ExitBand => "exit_band",
            ExitReason::HardStop => "hard_stop",
            ExitReason::EndOfData => "end_of_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub side: Side,
    pub entry_step: usize,
    pub exit_step: usize,
    /// Steps the position was carried: `exit_step - entry_step`.
    pub holding_period: usize,
    pub entry_z: f64,
    pub exit_z: f64,
    pub exit_reason: ExitReason,
    /// Compounded unlevered return from the entry step through the exit step,
    /// after transaction costs.
    pub net_return: f64,
    /// Same, after volatility-targeting leverage.
    pub levered_return: f64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_return > 0.0
    }
}
