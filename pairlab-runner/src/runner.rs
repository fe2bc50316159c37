//! Backtest runner: wires together price loading, the engine, metrics and
//! diagnostics.
//!
//! Entry points:
//! - `run_from_config()`: loads both legs from disk, then runs. Used by the CLI.
//! - `run_pair()`: takes pre-loaded prices. Used by batch runs and sweeps.
//! - `latest_signal()`: only the most recent signal, without simulating.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pairlab_core::domain::{align_trailing, Leg, PriceSeries, TradeRecord};
use pairlab_core::fingerprint::{config_hash, run_id};
use pairlab_core::signal::signal_path;
use pairlab_core::summary::trade_template;
use pairlab_core::{EngineError, PairConfig, PairEngine, RunStatus, Signal, StepRecord};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_pair, LoadError, LoadedPair};
use crate::diagnostics::PairDiagnostics;
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("failed to fingerprint config: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single pair backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub status: RunStatus,
    pub label_a: String,
    pub label_b: String,
    pub run_id: String,
    pub config_hash: String,
    pub dataset_hash: String,
    pub config: PairConfig,
    pub point_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub metrics: PerformanceMetrics,
    pub diagnostics: PairDiagnostics,
    /// Signal of the final step, if any step ran.
    pub latest_signal: Option<Signal>,
    /// Trade template for the final signal, e.g. "Long KO / Short 0.87×PEP".
    pub trade_template: String,
    pub trades: Vec<TradeRecord>,
    pub steps: Vec<StepRecord>,
    pub warnings: Vec<String>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn pair_name(&self) -> String {
        format!("{}/{}", self.label_a, self.label_b)
    }

    pub fn levered_returns(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.levered_return).collect()
    }

    /// Compounded equity path starting from 1 before the first step.
    pub fn equity_curve(&self) -> Vec<f64> {
        let mut equity = 1.0;
        std::iter::once(1.0)
            .chain(self.steps.iter().map(|s| {
                equity *= 1.0 + s.levered_return;
                equity
            }))
            .collect()
    }
}

/// Load the pair named in `config` from disk and run it.
pub fn run_from_config(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let data = load_pair(&config.pair.prices_a, &config.pair.prices_b)?;
    run_pair(&config.pair.label_a, &config.pair.label_b, &data, &config.strategy)
}

/// Run a backtest on pre-loaded, aligned prices. No I/O.
pub fn run_pair(
    label_a: &str,
    label_b: &str,
    data: &LoadedPair,
    config: &PairConfig,
) -> Result<BacktestResult, RunError> {
    let engine = PairEngine::new(config.clone())?;
    let run = engine.run(&data.a, &data.b)?;

    let metrics = match run.status {
        RunStatus::Completed => {
            PerformanceMetrics::compute(&run.steps, &run.trades, config.periods_per_year)
        }
        RunStatus::InsufficientData { .. } => PerformanceMetrics::empty(),
    };
    let diagnostics = PairDiagnostics::compute(&data.a, &data.b);
    let latest_signal = run.last_signal().copied();
    let template = latest_signal
        .map(|s| trade_template(&s, label_a, label_b))
        .unwrap_or_else(|| "Flat".to_string());

    let config_hash = config_hash(config)?;
    let run_id = run_id(&config_hash, &data.dataset_hash);

    let mut warnings = data.warnings.clone();
    warnings.extend(run.warnings);

    tracing::info!(
        pair = %format!("{label_a}/{label_b}"),
        points = run.point_count,
        trades = metrics.trade_count,
        cumulative = metrics.cumulative_return,
        sharpe = metrics.sharpe,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        status: run.status,
        label_a: label_a.to_string(),
        label_b: label_b.to_string(),
        run_id,
        config_hash,
        dataset_hash: data.dataset_hash.clone(),
        config: config.clone(),
        point_count: run.point_count,
        start_date: data.first_date(),
        end_date: data.last_date(),
        metrics,
        diagnostics,
        latest_signal,
        trade_template: template,
        trades: run.trades,
        steps: run.steps,
        warnings,
    })
}

/// The signal for the most recent point of a pair history.
///
/// Computes the same signal path the engine would, without simulating
/// positions. `None` for an empty history.
pub fn latest_signal(
    prices_a: &[f64],
    prices_b: &[f64],
    config: &PairConfig,
) -> Result<Option<Signal>, RunError> {
    config.validate().map_err(EngineError::from)?;
    let (a, b) = align_trailing(prices_a, prices_b);
    let log_a = PriceSeries::new(Leg::A, a.to_vec()).map_err(EngineError::from)?.to_log();
    let log_b = PriceSeries::new(Leg::B, b.to_vec()).map_err(EngineError::from)?.to_log();
    Ok(signal_path(log_a.values(), log_b.values(), config).pop())
}
