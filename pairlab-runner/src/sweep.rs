//! Parameter sweep over a grid of strategy settings for one pair.

use std::collections::HashMap;

use rayon::prelude::*;

use pairlab_core::PairConfig;

use crate::data_loader::LoadedPair;
use crate::runner::{run_pair, BacktestResult, RunError};

/// Values to try for each swept parameter. Everything else comes from the
/// base config.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub lookbacks: Vec<usize>,
    pub entry_zs: Vec<f64>,
    pub exit_zs: Vec<f64>,
}

impl ParamGrid {
    /// Lookbacks 20, 40, 60, 120; entry 1.0 to 2.0; exit 0.0 to 0.5.
    pub fn standard() -> Self {
        Self {
            lookbacks: vec![20, 40, 60, 120],
            entry_zs: vec![1.0, 1.5, 2.0],
            exit_zs: vec![0.0, 0.2, 0.5],
        }
    }

    /// Number of grid points, including combinations later skipped as invalid.
    pub fn size(&self) -> usize {
        self.lookbacks.len() * self.entry_zs.len() * self.exit_zs.len()
    }

    /// All valid configurations in the grid.
    ///
    /// Combinations that fail validation against the base config (for
    /// example exit_z >= entry_z) are skipped.
    pub fn generate_configs(&self, base: &PairConfig) -> Vec<PairConfig> {
        let mut configs = Vec::new();
        for &lookback in &self.lookbacks {
            for &entry_z in &self.entry_zs {
                for &exit_z in &self.exit_zs {
                    let config = PairConfig {
                        lookback,
                        entry_z,
                        exit_z,
                        ..base.clone()
                    };
                    if config.validate().is_ok() {
                        configs.push(config);
                    }
                }
            }
        }
        configs
    }
}

/// Parameter sweep executor, optionally parallel.
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every configuration in `grid` against the same pair.
    pub fn sweep(
        &self,
        grid: &ParamGrid,
        base: &PairConfig,
        label_a: &str,
        label_b: &str,
        data: &LoadedPair,
    ) -> Result<SweepResults, RunError> {
        let configs = grid.generate_configs(base);
        tracing::info!(
            configs = configs.len(),
            skipped = grid.size() - configs.len(),
            parallel = self.parallel,
            "starting sweep"
        );

        let results: Vec<BacktestResult> = if self.parallel {
            configs
                .par_iter()
                .map(|config| run_pair(label_a, label_b, data, config))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            configs
                .iter()
                .map(|config| run_pair(label_a, label_b, data, config))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(SweepResults::new(results))
    }
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug)]
pub struct SweepResults {
    results: Vec<BacktestResult>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(results: Vec<BacktestResult>) -> Self {
        let by_run_id = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();
        Self { results, by_run_id }
    }

    pub fn all(&self) -> &[BacktestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, run_id: &str) -> Option<&BacktestResult> {
        self.by_run_id.get(run_id).map(|&i| &self.results[i])
    }

    /// Results sorted by Sharpe ratio, best first.
    pub fn sorted_by_sharpe(&self) -> Vec<&BacktestResult> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        sorted.sort_by(|a, b| b.metrics.sharpe.total_cmp(&a.metrics.sharpe));
        sorted
    }

    pub fn top_n(&self, n: usize) -> Vec<&BacktestResult> {
        self.sorted_by_sharpe().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&BacktestResult> {
        self.sorted_by_sharpe().into_iter().next()
    }
}
