//! PairLab Runner: backtest orchestration on top of `pairlab-core`.
//!
//! This crate provides:
//! - TOML run configs naming a pair and its price files
//! - CSV price loading and date alignment
//! - Single runs with metrics, pair diagnostics and run fingerprints
//! - Parallel batch runs and parameter sweeps
//! - JSON/CSV artifact export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod diagnostics;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use batch::{mean_sharpe, run_batch, PairJob};
pub use config::{BacktestConfig, ConfigError, PairSection};
pub use data_loader::{load_pair, LoadError, LoadedPair};
pub use diagnostics::PairDiagnostics;
pub use export::{load_artifacts, save_artifacts};
pub use metrics::PerformanceMetrics;
pub use runner::{
    latest_signal, run_from_config, run_pair, BacktestResult, RunError, SCHEMA_VERSION,
};
pub use sweep::{ParamGrid, ParamSweep, SweepResults};
