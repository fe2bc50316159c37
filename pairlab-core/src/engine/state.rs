//! Engine errors, per-step records and the run result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::{SeriesError, Side, TradeRecord};
use crate::position::LegTargets;
use crate::signal::Signal;

/// Structurally invalid input or configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid prices: {0}")]
    Series(#[from] SeriesError),
}

/// Outcome of a run. Insufficient data is reported, not raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    InsufficientData { points: usize },
}

/// Everything recorded for one simulated step. Appended, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Index into the aligned price history (1..n).
    pub index: usize,
    pub signal: Signal,
    /// Position after this step's transition.
    pub side: Side,
    pub size: f64,
    pub beta: f64,
    pub pair_return: f64,
    /// Cost booked on this step. Opening costs land on the step after entry.
    pub cost: f64,
    pub raw_return: f64,
    pub leverage: f64,
    pub levered_return: f64,
    pub targets: LegTargets,
}

/// Result of a complete engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    /// Aligned price points consumed.
    pub point_count: usize,
    pub steps: Vec<StepRecord>,
    pub trades: Vec<TradeRecord>,
    pub warnings: Vec<String>,
}

impl RunResult {
    pub fn insufficient(points: usize) -> Self {
        Self {
            status: RunStatus::InsufficientData { points },
            point_count: points,
            steps: Vec::new(),
            trades: Vec::new(),
            warnings: vec![format!(
                "insufficient data: {points} aligned price point(s), need at least 2"
            )],
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn raw_returns(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.raw_return).collect()
    }

    pub fn levered_returns(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.levered_return).collect()
    }

    pub fn leverages(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.leverage).collect()
    }

    /// The signal of the last simulated step, if any.
    pub fn last_signal(&self) -> Option<&Signal> {
        self.steps.last().map(|s| &s.signal)
    }
}
