//! CloudLab CLI — signal generation and backtest commands.
//!
//! Commands:
//! - `signals` — compute indicators and the ten pattern columns for a bar CSV
//! - `run` — execute a backtest from a TOML config and a minute feed
//! - `show` — print the breakdown of a saved run

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cloudlab_core::domain::{PatternId, Timeframe};
use cloudlab_core::indicators::IndicatorParams;
use cloudlab_core::patterns::Trigger;
use cloudlab_runner::runner::run_single_backtest;
use cloudlab_runner::{
    export_json, export_signals_csv, generate_signals, load_artifacts, load_bars_csv,
    render_breakdown, resample, save_artifacts, BacktestConfig,
};

#[derive(Parser)]
#[command(
    name = "cloudlab",
    about = "CloudLab CLI — trend-cloud pattern signals and intraday backtests"
)]
struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute indicator and pattern columns for a bar CSV.
    Signals {
        /// Input CSV with timestamp,open,high,low,close columns.
        #[arg(long)]
        bars: PathBuf,

        /// Resample the input to this timeframe first (e.g. 5min, 1h).
        #[arg(long)]
        timeframe: Option<Timeframe>,

        /// When a pattern emits: on the first bar of a condition, or on every bar.
        #[arg(long, value_enum, default_value_t = TriggerArg::Onset)]
        trigger: TriggerArg,

        /// First day included (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day included (YYYY-MM-DD).
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,
    },
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// One-minute bar CSV used to resolve exits.
        #[arg(long)]
        minutes: PathBuf,

        /// Signal bar CSV. Defaults to resampling the minute feed.
        #[arg(long)]
        bars: Option<PathBuf>,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the full result JSON instead of the breakdown table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the breakdown of a saved run directory.
    Show {
        /// Run directory containing result.json.
        dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TriggerArg {
    Onset,
    Level,
}

impl From<TriggerArg> for Trigger {
    fn from(arg: TriggerArg) -> Self {
        match arg {
            TriggerArg::Onset => Trigger::Onset,
            TriggerArg::Level => Trigger::Level,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match cli.command {
        Commands::Signals {
            bars,
            timeframe,
            trigger,
            start,
            end,
            out,
        } => run_signals_cmd(&bars, timeframe, trigger.into(), start, end, &out),
        Commands::Run {
            config,
            minutes,
            bars,
            output_dir,
            json,
        } => run_backtest_cmd(&config, &minutes, bars.as_deref(), &output_dir, json),
        Commands::Show { dir } => {
            let result = load_artifacts(&dir)?;
            print!("{}", render_breakdown(&result));
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays clean for tables and JSON.
fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn run_signals_cmd(
    bars_path: &Path,
    timeframe: Option<Timeframe>,
    trigger: Trigger,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    out: &Path,
) -> Result<()> {
    let range = match (start, end) {
        (None, None) => None,
        (start, end) => Some((
            start.unwrap_or(NaiveDate::MIN).and_time(chrono::NaiveTime::MIN),
            end.unwrap_or(NaiveDate::MAX)
                .and_hms_opt(23, 59, 59)
                .context("invalid end date")?,
        )),
    };

    let mut series = load_bars_csv(bars_path, range)
        .with_context(|| format!("failed to load {}", bars_path.display()))?;
    if let Some(tf) = timeframe {
        series = resample(&series, tf)?;
        info!(timeframe = %tf, bars = series.len(), "resampled input");
    }

    let params = IndicatorParams::default();
    let (frames, table) = generate_signals(&series, &params, trigger);
    let csv = export_signals_csv(series.bars(), &frames, &table)?;
    std::fs::write(out, csv).with_context(|| format!("failed to write {}", out.display()))?;

    println!("Bars:    {}", series.len());
    println!("Warm-up: {} bars", params.warmup_bars());
    println!();
    println!("{:<3} {:<30} {:>8}", "#", "Pattern", "Signals");
    println!("{}", "-".repeat(43));
    for id in PatternId::all() {
        println!("{:<3} {:<30} {:>8}", id.index(), id.name(), table.count(id));
    }
    println!();
    println!("Signals written to: {}", out.display());
    Ok(())
}

fn run_backtest_cmd(
    config_path: &Path,
    minutes: &Path,
    bars: Option<&Path>,
    output_dir: &Path,
    json: bool,
) -> Result<()> {
    let config = BacktestConfig::load(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    info!(name = %config.backtest.name, run_id = %config.run_id(), "starting backtest");

    let result = run_single_backtest(&config, minutes, bars)?;

    if json {
        println!("{}", export_json(&result)?);
    } else {
        print!("{}", render_breakdown(&result));
    }

    let run_dir = save_artifacts(&result, output_dir)?;
    info!(dir = %run_dir.display(), "artifacts saved");
    if !json {
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}
