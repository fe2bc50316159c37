//! PairLab Core: engine for pairs statistical-arbitrage backtests.
//!
//! This crate contains the simulation itself:
//! - Domain types (price series, sides, trade records)
//! - Window statistics and the rolling hedge-ratio estimator
//! - Spread z-score signal generation
//! - Position state machine with hysteresis and a hard stop
//! - Cost-aware per-step accounting and volatility targeting
//! - The sequential, look-ahead-free backtest loop
//! - Deterministic synthetic pairs for tests and demos

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod hedge;
pub mod position;
pub mod signal;
pub mod stats;
pub mod summary;

pub use config::{ConfigError, PairConfig};
pub use engine::{run_backtest, EngineError, PairEngine, RunResult, RunStatus, StepRecord};
pub use signal::Signal;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: config, signal and result types are Send + Sync,
    /// so runs can fan out across worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PairConfig>();
        require_sync::<PairConfig>();
        require_send::<PairEngine>();
        require_sync::<PairEngine>();
        require_send::<RunResult>();
        require_sync::<RunResult>();
        require_send::<StepRecord>();
        require_sync::<StepRecord>();
        require_send::<Signal>();
        require_sync::<Signal>();
        require_send::<EngineError>();
        require_sync::<EngineError>();

        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();

        require_send::<signal::SignalGenerator>();
        require_send::<position::PositionMachine>();
        require_send::<engine::VolTargeter>();
        require_send::<hedge::RollingOls>();
        require_send::<data::SyntheticPair>();
        require_sync::<data::SyntheticPair>();
    }

    /// Architecture contract: the signal generator sees one observation at a time.
    ///
    /// `evaluate` takes the newest pair of log prices and no position state, so
    /// signals cannot depend on the portfolio or the future.
    #[test]
    fn signal_generator_takes_only_history() {
        fn _check(gen: &mut signal::SignalGenerator, a: f64, b: f64) -> Signal {
            gen.evaluate(a, b)
        }
    }
}
