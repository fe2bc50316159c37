//! Artifact export: JSON result, per-step CSV and trade CSV.
//!
//! The JSON artifact carries a `schema_version`. Versions newer than this
//! build understands are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use pairlab_core::domain::TradeRecord;
use pairlab_core::StepRecord;

use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Per-step position trace and return path.
///
/// Columns: index, z, beta, spread, signal_side, side, size, target_a,
/// target_b, pair_return, cost, raw_return, leverage, levered_return
pub fn export_steps_csv(steps: &[StepRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "index",
        "z",
        "beta",
        "spread",
        "signal_side",
        "side",
        "size",
        "target_a",
        "target_b",
        "pair_return",
        "cost",
        "raw_return",
        "leverage",
        "levered_return",
    ])?;

    for s in steps {
        wtr.write_record([
            s.index.to_string(),
            format!("{:.6}", s.signal.z),
            format!("{:.6}", s.beta),
            format!("{:.8}", s.signal.spread),
            s.signal.side.as_str().to_string(),
            s.side.as_str().to_string(),
            format!("{:.6}", s.size),
            format!("{:.6}", s.targets.a),
            format!("{:.6}", s.targets.b),
            format!("{:.10}", s.pair_return),
            format!("{:.10}", s.cost),
            format!("{:.10}", s.raw_return),
            format!("{:.6}", s.leverage),
            format!("{:.10}", s.levered_return),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Trade list.
///
/// Columns: side, entry_step, exit_step, holding_period, entry_z, exit_z,
/// exit_reason, net_return, levered_return
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "side",
        "entry_step",
        "exit_step",
        "holding_period",
        "entry_z",
        "exit_z",
        "exit_reason",
        "net_return",
        "levered_return",
    ])?;

    for t in trades {
        wtr.write_record([
            t.side.as_str().to_string(),
            t.entry_step.to_string(),
            t.exit_step.to_string(),
            t.holding_period.to_string(),
            format!("{:.6}", t.entry_z),
            format!("{:.6}", t.exit_z),
            t.exit_reason.as_str().to_string(),
            format!("{:.10}", t.net_return),
            format!("{:.10}", t.levered_return),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single run.
///
/// Creates `{label_a}_{label_b}_{run_id prefix}/` under `output_dir`
/// containing:
/// - `result.json`: the full `BacktestResult`
/// - `steps.csv`: per-step trace
/// - `trades.csv`: closed trades
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = result.run_id.chars().take(12).collect();
    let dirname = format!(
        "{}_{}_{}",
        path_safe(&result.label_a),
        path_safe(&result.label_b),
        prefix
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let write = |name: &str, content: String| -> Result<()> {
        let path = run_dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))
    };
    write("result.json", export_json(result)?)?;
    write("steps.csv", export_steps_csv(&result.steps)?)?;
    write("trades.csv", export_trades_csv(&result.trades)?)?;

    tracing::info!(dir = %run_dir.display(), "saved artifacts");
    Ok(run_dir)
}

/// Replace anything but ASCII letters, digits, `-`, `_` and `.` with `_`, so a
/// label like `BRK/B` stays one path component.
fn path_safe(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Load `result.json` from an artifact directory.
pub fn load_artifacts(run_dir: &Path) -> Result<BacktestResult> {
    let path = run_dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::LoadedPair;
    use crate::runner::run_pair;
    use pairlab_core::data::cointegrated_pair;
    use pairlab_core::PairConfig;

    fn sample_result() -> BacktestResult {
        let pair = cointegrated_pair(400, 3);
        let data = LoadedPair::from_prices(&pair.a, &pair.b);
        let config = PairConfig {
            beta_lookback: Some(200),
            ..PairConfig::default()
        };
        run_pair("KO", "PEP", &data, &config).unwrap()
    }

    #[test]
    fn json_round_trip() {
        let result = sample_result();
        let json = export_json(&result).unwrap();
        assert!(json.contains("\"schema_version\": 1"));
        let back = import_json(&json).unwrap();
        assert_eq!(back.run_id, result.run_id);
        assert_eq!(back.trades.len(), result.trades.len());
        assert_eq!(back.steps.len(), result.steps.len());
        assert_eq!(back.config, result.config);
        assert_eq!(back.status, result.status);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut result = sample_result();
        result.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&result).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn missing_schema_version_defaults_to_current() {
        let result = sample_result();
        let mut value: serde_json::Value = serde_json::to_value(&result).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let back = import_json(&value.to_string()).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn csv_row_counts() {
        let result = sample_result();
        let steps = export_steps_csv(&result.steps).unwrap();
        assert_eq!(steps.lines().count(), result.steps.len() + 1);
        assert!(steps.starts_with("index,z,beta,spread"));

        let trades = export_trades_csv(&result.trades).unwrap();
        assert_eq!(trades.lines().count(), result.trades.len() + 1);
        assert!(trades.starts_with("side,entry_step"));
    }

    #[test]
    fn artifacts_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let result = sample_result();
        let run_dir = save_artifacts(&result, dir.path()).unwrap();

        assert!(run_dir.join("result.json").exists());
        assert!(run_dir.join("steps.csv").exists());
        assert!(run_dir.join("trades.csv").exists());
        assert!(run_dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("KO_PEP_"));

        let back = load_artifacts(&run_dir).unwrap();
        assert_eq!(back.run_id, result.run_id);
    }

    #[test]
    fn labels_cannot_escape_the_output_dir() {
        assert_eq!(path_safe("BRK/B"), "BRK_B");
        assert_eq!(path_safe("../x"), ".._x");
        assert_eq!(path_safe("KO"), "KO");

        let dir = tempfile::tempdir().unwrap();
        let mut result = sample_result();
        result.label_a = "BRK/B".to_string();
        result.label_b = "../x".to_string();
        let run_dir = save_artifacts(&result, dir.path()).unwrap();

        assert_eq!(run_dir.parent(), Some(dir.path()));
        assert!(run_dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("BRK_B_.._x_"));
        assert!(run_dir.join("result.json").exists());
    }
}
