//! PairLab CLI: pairs backtests from config files or synthetic data.
//!
//! Commands:
//! - `run`: backtest the pair named in a TOML config and save artifacts
//! - `synthetic`: backtest a generated pair (co-integrated or independent)
//! - `signal`: print the current signal and trade template for a pair
//! - `sweep`: run the standard parameter grid and print the best settings

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use pairlab_core::data::{cointegrated_pair, independent_walks};
use pairlab_core::summary::trade_template;
use pairlab_core::PairConfig;
use pairlab_runner::{
    latest_signal, load_pair, run_from_config, run_pair, save_artifacts, BacktestConfig,
    BacktestResult, LoadedPair, ParamGrid, ParamSweep,
};

#[derive(Parser)]
#[command(name = "pairlab", about = "PairLab CLI: pairs stat-arb backtesting engine")]
struct Cli {
    /// Emit logs as JSON lines instead of plain text.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest the pair described by a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for result artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the summary only; do not write artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Backtest a generated pair with the default strategy.
    Synthetic {
        #[arg(long, value_enum, default_value_t = SyntheticKind::Cointegrated)]
        kind: SyntheticKind,

        /// Number of price points per leg.
        #[arg(long, default_value_t = 2000)]
        points: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Optional TOML file with a `[strategy]` table (or a bare strategy table).
        #[arg(long)]
        strategy: Option<PathBuf>,

        /// Output directory for result artifacts. Nothing is saved if omitted.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the latest signal and its trade template.
    Signal {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
    /// Sweep lookback and entry/exit thresholds for one pair.
    Sweep {
        /// Path to a TOML config file. Its strategy is the base of the grid.
        #[arg(long)]
        config: PathBuf,

        /// How many of the best configurations to print.
        #[arg(long, default_value_t = 5)]
        top: usize,

        /// Run grid points one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SyntheticKind {
    /// B tracks A with a mean-reverting deviation.
    Cointegrated,
    /// Two unrelated random walks.
    Independent,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            no_save,
        } => run_cmd(&config, &output_dir, no_save),
        Commands::Synthetic {
            kind,
            points,
            seed,
            strategy,
            output_dir,
        } => synthetic_cmd(kind, points, seed, strategy.as_deref(), output_dir.as_deref()),
        Commands::Signal { config } => signal_cmd(&config),
        Commands::Sweep {
            config,
            top,
            sequential,
        } => sweep_cmd(&config, top, sequential),
    }
}

/// Logs go to stderr so stdout stays clean for the summary. `RUST_LOG`
/// overrides the default `info` level.
fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run_cmd(config_path: &Path, output_dir: &Path, no_save: bool) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)?;
    let result = run_from_config(&config)
        .with_context(|| format!("backtest failed for {}", config.pair.name()))?;

    print_summary(&result);

    if !no_save {
        let run_dir = save_artifacts(&result, output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn synthetic_cmd(
    kind: SyntheticKind,
    points: usize,
    seed: u64,
    strategy: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let strategy = match strategy {
        Some(path) => load_strategy(path)?,
        None => PairConfig::default(),
    };
    let (pair, label_a, label_b) = match kind {
        SyntheticKind::Cointegrated => (cointegrated_pair(points, seed), "SYN_A", "SYN_B"),
        SyntheticKind::Independent => (independent_walks(points, seed), "RW_A", "RW_B"),
    };
    let data = LoadedPair::from_prices(&pair.a, &pair.b);
    let result = run_pair(label_a, label_b, &data, &strategy)?;

    print_summary(&result);
    println!();
    println!("WARNING: Results based on SYNTHETIC data (seed {seed})");

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

/// Accepts either a full run config or a file holding only strategy keys.
fn load_strategy(path: &Path) -> Result<PairConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut table: toml::Table = content
        .parse()
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let strategy = match table.remove("strategy") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => bail!("[strategy] in {} must be a table", path.display()),
        None => table,
    };
    let config: PairConfig = toml::Value::Table(strategy)
        .try_into()
        .with_context(|| format!("invalid strategy in {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn signal_cmd(config_path: &Path) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)?;
    config.validate()?;
    let data = load_pair(&config.pair.prices_a, &config.pair.prices_b)?;
    let Some(signal) = latest_signal(&data.a, &data.b, &config.strategy)? else {
        bail!("no aligned prices for {}", config.pair.name());
    };

    let as_of = data
        .last_date()
        .map(|d| d.to_string())
        .unwrap_or_else(|| format!("point {}", signal.index));
    println!("Pair:      {}", config.pair.name());
    println!("As of:     {as_of}");
    println!("Beta:      {:.4}", signal.beta);
    println!("Spread:    {:.6}", signal.spread);
    println!("Z-score:   {:+.3}", signal.z);
    println!("Size:      {:.3}", signal.size);
    println!(
        "Trade:     {}",
        trade_template(&signal, &config.pair.label_a, &config.pair.label_b)
    );
    Ok(())
}

fn sweep_cmd(config_path: &Path, top: usize, sequential: bool) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)?;
    config.validate()?;
    let data = load_pair(&config.pair.prices_a, &config.pair.prices_b)?;

    let grid = ParamGrid::standard();
    let results = ParamSweep::new().with_parallelism(!sequential).sweep(
        &grid,
        &config.strategy,
        &config.pair.label_a,
        &config.pair.label_b,
        &data,
    )?;
    if results.is_empty() {
        bail!("no valid configurations in the sweep grid");
    }

    println!();
    println!("=== Sweep: {} ({} configs) ===", config.pair.name(), results.len());
    println!(
        "{:>4} {:>8} {:>7} {:>6} {:>8} {:>9} {:>7} {:>9}",
        "rank", "lookback", "entry_z", "exit_z", "sharpe", "return", "trades", "win_rate"
    );
    for (rank, r) in results.top_n(top).iter().enumerate() {
        println!(
            "{:>4} {:>8} {:>7.2} {:>6.2} {:>8.3} {:>8.2}% {:>7} {:>8.1}%",
            rank + 1,
            r.config.lookback,
            r.config.entry_z,
            r.config.exit_z,
            r.metrics.sharpe,
            r.metrics.cumulative_return * 100.0,
            r.metrics.trade_count,
            r.metrics.trade_win_rate * 100.0,
        );
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Pair:           {}", result.pair_name());
    match (result.start_date, result.end_date) {
        (Some(start), Some(end)) => println!("Period:         {start} to {end}"),
        _ => println!("Period:         {} points (undated)", result.point_count),
    }
    println!("Run ID:         {}", &result.run_id[..result.run_id.len().min(16)]);
    println!("Trades:         {}", m.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", m.cumulative_return * 100.0);
    println!("Annual Return:  {:.2}%", m.annualized_return * 100.0);
    println!("Annual Vol:     {:.2}%", m.annualized_vol * 100.0);
    println!("Sharpe:         {:.3}", m.sharpe);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Trade Win Rate: {:.1}%", m.trade_win_rate * 100.0);
    println!("Avg Holding:    {:.1} steps", m.avg_holding_period);
    println!("Hard Stops:     {}", m.hard_stop_count);
    println!("Total Cost:     {:.4}%", m.total_cost * 100.0);
    println!("Avg Leverage:   {:.2}x", m.avg_leverage);
    println!();
    println!("--- Pair ---");
    let d = &result.diagnostics;
    println!("Return Corr:    {:.3}", d.return_correlation);
    println!("Full Beta:      {:.4}", d.full_sample_beta);
    if let Some(hl) = d.half_life {
        println!("Half-life:      {hl:.1} steps");
    }
    if let Some(adf) = d.adf_statistic {
        println!("ADF stat:       {adf:.2}");
    }
    if let Some(signal) = &result.latest_signal {
        println!("Latest z:       {:+.3}", signal.z);
    }
    println!("Trade:          {}", result.trade_template);
    for warn in &result.warnings {
        println!("WARNING: {warn}");
    }
}
