//! SMC CLI: analyze, rolling and scan commands.
//!
//! Commands:
//! - `analyze`: score one CSV file (or a synthetic series) and print the result
//! - `rolling`: per-bar scores over a trailing window
//! - `scan`: analyze many CSV files in parallel and print one row per file

mod loader;
mod report;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use smc_core::data::random_walk;
use smc_core::domain::Bar;
use smc_core::fingerprint::{config_hash, dataset_hash};
use smc_core::{analyze, rolling_scores, SmcConfig};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use loader::{load_csv, LoadedBars};
use report::{AnalyzeReport, ScanRow};

#[derive(Parser)]
#[command(name = "smc", about = "SMC CLI: Smart Money Concepts scoring for OHLCV data")]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the bars come from: a CSV file or a seeded random walk.
#[derive(clap::Args)]
struct InputArgs {
    /// CSV file with timestamp,open,high,low,close,volume columns.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Generate this many synthetic bars instead of reading a file.
    #[arg(long)]
    synthetic: Option<usize>,

    /// Seed for --synthetic.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one series.
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Analyze only the last N bars.
        #[arg(long)]
        tail: Option<usize>,

        /// Print every detected swing, order block, FVG and structure event.
        #[arg(long, default_value_t = false)]
        events: bool,

        /// Emit a JSON report instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Score every bar using only the trailing window ending at it.
    Rolling {
        #[command(flatten)]
        input: InputArgs,

        /// Bars in each trailing window.
        #[arg(long, default_value_t = 100)]
        window: usize,

        /// Emit JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Analyze many CSV files in parallel.
    Scan {
        /// CSV files to analyze.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Analyze only the last N bars of each file.
        #[arg(long)]
        tail: Option<usize>,

        /// Emit JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            input,
            tail,
            events,
            json,
        } => run_analyze_cmd(&input, tail, events, json),
        Commands::Rolling {
            input,
            window,
            json,
        } => run_rolling_cmd(&input, window, json),
        Commands::Scan {
            files,
            config,
            tail,
            json,
        } => run_scan_cmd(&files, config.as_deref(), tail, json),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SmcConfig> {
    match path {
        Some(path) => {
            let config = SmcConfig::load(path)?;
            info!(path = %path.display(), "loaded config");
            Ok(config)
        }
        None => Ok(SmcConfig::default()),
    }
}

fn load_input(args: &InputArgs) -> Result<LoadedBars> {
    match (&args.input, args.synthetic) {
        (Some(_), Some(_)) => bail!("--input and --synthetic are mutually exclusive"),
        (None, None) => bail!("provide --input <file> or --synthetic <bars>"),
        (Some(path), None) => {
            load_csv(path).with_context(|| format!("loading {}", path.display()))
        }
        (None, Some(n)) => Ok(LoadedBars {
            source: format!("synthetic(n={n}, seed={})", args.seed),
            bars: random_walk(n, args.seed),
            insane_rows: 0,
        }),
    }
}

fn tail_slice(bars: &[Bar], tail: Option<usize>) -> &[Bar] {
    match tail {
        Some(n) if n < bars.len() => &bars[bars.len() - n..],
        _ => bars,
    }
}

fn run_analyze_cmd(input: &InputArgs, tail: Option<usize>, events: bool, json: bool) -> Result<()> {
    let config = load_config(input.config.as_deref())?;
    let loaded = load_input(input)?;
    let bars = tail_slice(&loaded.bars, tail);

    let analysis = analyze(bars, &config)?;
    if !analysis.is_complete() {
        warn!(
            bars = bars.len(),
            required = config.min_bars(),
            "series too short for the swing window"
        );
    }

    if json {
        let report = AnalyzeReport {
            source: &loaded.source,
            bars: bars.len(),
            config_hash: config_hash(&config),
            dataset_hash: dataset_hash(bars),
            interpretation: analysis.result.interpretation(),
            status: analysis.status,
            result: &analysis.result,
            analysis: events.then_some(&analysis),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    report::print_summary(&loaded.source, bars, &analysis, loaded.insane_rows);
    if events {
        report::print_events(bars, &analysis);
    }
    Ok(())
}

fn run_rolling_cmd(input: &InputArgs, window: usize, json: bool) -> Result<()> {
    let config = load_config(input.config.as_deref())?;
    let loaded = load_input(input)?;

    let scores = rolling_scores(&loaded.bars, &config, window)?;
    info!(
        source = %loaded.source,
        bars = loaded.bars.len(),
        window,
        "rolling scores computed"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&scores)?);
    } else {
        report::print_rolling(&loaded.bars, &scores);
    }
    Ok(())
}

fn run_scan_cmd(files: &[PathBuf], config: Option<&Path>, tail: Option<usize>, json: bool) -> Result<()> {
    let config = load_config(config)?;
    config.validate()?;

    // Each file is independent; a failure on one is reported in its row.
    let rows: Vec<ScanRow> = files
        .par_iter()
        .map(|path| scan_one(path, &config, tail))
        .collect();

    let failed = rows.iter().filter(|r| r.error.is_some()).count();
    info!(files = rows.len(), failed, "scan complete");

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        report::print_scan(&rows);
    }

    if failed > 0 {
        eprintln!("{failed} file(s) failed.");
        std::process::exit(1);
    }
    Ok(())
}

fn scan_one(path: &Path, config: &SmcConfig, tail: Option<usize>) -> ScanRow {
    let source = path.display().to_string();
    let loaded = match load_csv(path) {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!(source = %source, error = %e, "skipping file");
            return ScanRow {
                source,
                bars: 0,
                result: None,
                error: Some(e.to_string()),
            };
        }
    };

    let bars = tail_slice(&loaded.bars, tail);
    match analyze(bars, config) {
        Ok(analysis) => ScanRow {
            source,
            bars: bars.len(),
            result: Some(analysis.result),
            error: None,
        },
        Err(e) => ScanRow {
            source,
            bars: bars.len(),
            result: None,
            error: Some(e.to_string()),
        },
    }
}
