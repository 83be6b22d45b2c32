//! CloudLab Runner — backtest orchestration, metrics and artifact export.
//!
//! This crate builds on `cloudlab-core` to provide:
//! - TOML run configuration with validation and a content-hash run id
//! - CSV bar loading and epoch-aligned resampling
//! - Single-backtest runner (patterns fan out over rayon)
//! - Per-pattern performance metrics and run totals
//! - CSV/JSON export of signals, trades and summaries

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, RunId};
pub use data_loader::{load_bars_csv, read_bars_csv, resample, LoadError};
pub use export::{
    export_json, export_signals_csv, export_summary_csv, export_trades_csv, import_json,
    load_artifacts, render_breakdown, save_artifacts,
};
pub use metrics::{PatternSummary, RunTotals};
pub use runner::{
    generate_signals, run_backtest_from_data, run_single_backtest, BacktestResult, RunError,
    SCHEMA_VERSION,
};
