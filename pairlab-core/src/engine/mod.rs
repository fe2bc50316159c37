//! Backtest engine: the sequential per-step fold and its supporting pieces.
//!
//! The engine consumes two validated price histories and, for each step,
//! runs the chain:
//!
//! 1. Signal: hedge ratio, spread, z-score, side and size
//! 2. Position state transition
//! 3. PnL and turnover cost for the period
//! 4. Volatility-targeted leverage

pub mod accounting;
pub mod loop_runner;
pub mod state;
pub mod vol_target;

pub use accounting::{pair_return, settle_step, CostModel, StepPnl};
pub use loop_runner::{run_backtest, PairEngine};
pub use state::{EngineError, RunResult, RunStatus, StepRecord};
pub use vol_target::VolTargeter;
