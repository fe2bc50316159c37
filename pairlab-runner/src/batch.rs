//! Batch runs: many independent pairs under one strategy config.
//!
//! Each job owns its own engine state, so pairs run in parallel with rayon
//! and results come back in job order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use pairlab_core::PairConfig;

use crate::data_loader::LoadedPair;
use crate::runner::{run_pair, BacktestResult, RunError};

/// One pair to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairJob {
    pub label_a: String,
    pub label_b: String,
    pub data: LoadedPair,
}

impl PairJob {
    pub fn new(label_a: impl Into<String>, label_b: impl Into<String>, data: LoadedPair) -> Self {
        Self {
            label_a: label_a.into(),
            label_b: label_b.into(),
            data,
        }
    }
}

/// Run every job with the same config. Fails on the first error.
pub fn run_batch(jobs: &[PairJob], config: &PairConfig) -> Result<Vec<BacktestResult>, RunError> {
    tracing::info!(pairs = jobs.len(), "starting batch");
    jobs.par_iter()
        .map(|job| run_pair(&job.label_a, &job.label_b, &job.data, config))
        .collect()
}

/// Mean Sharpe ratio across results, 0.0 when empty.
pub fn mean_sharpe(results: &[BacktestResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.metrics.sharpe).sum::<f64>() / results.len() as f64
}
