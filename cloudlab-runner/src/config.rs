//! Serializable backtest configuration, loaded from TOML.
//!
//! ```toml
//! [backtest]
//! name = "5min_full_backtest"
//! symbol = "NIFTY"
//! timeframe = "5min"
//! start_date = "2024-01-01"
//! end_date = "2025-06-30"
//!
//! [indicators]   # optional
//! [signals]      # optional
//! ```

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cloudlab_core::backtest::SimulatorConfig;
use cloudlab_core::domain::Timeframe;
use cloudlab_core::indicators::IndicatorParams;
use cloudlab_core::patterns::Trigger;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub indicators: IndicatorParams,
    #[serde(default)]
    pub signals: SignalSection,
}

/// `[backtest]`: run identity, date range, sizing and exit rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    /// Subdirectory name for this run's output.
    #[serde(default = "default_name")]
    pub name: String,
    pub symbol: String,
    /// Signal bar size.
    #[serde(default = "default_timeframe")]
    pub timeframe: Timeframe,
    /// First day included (inclusive).
    pub start_date: NaiveDate,
    /// Last day included (inclusive).
    pub end_date: NaiveDate,
    #[serde(default = "default_capital")]
    pub initial_capital: f64,
    /// Fraction of capital per trade.
    #[serde(default = "default_position_size")]
    pub position_size: f64,
    /// Fixed units per trade; overrides `position_size`.
    #[serde(default)]
    pub quantity: Option<f64>,
    /// Fraction of notional charged per leg.
    #[serde(default)]
    pub transaction_cost: f64,
    #[serde(default = "default_stop_loss")]
    pub stop_loss_pct: f64,
    #[serde(default = "default_take_profit")]
    pub take_profit_pct: f64,
    #[serde(default = "default_max_holding")]
    pub max_holding_minutes: i64,
}

/// `[signals]`: how predicates turn into emitted signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSection {
    #[serde(default)]
    pub trigger: Trigger,
}

fn default_name() -> String {
    "backtest".into()
}
fn default_timeframe() -> Timeframe {
    Timeframe::ONE_MINUTE
}
fn default_capital() -> f64 {
    100_000.0
}
fn default_position_size() -> f64 {
    0.1
}
fn default_stop_loss() -> f64 {
    0.01
}
fn default_take_profit() -> f64 {
    0.015
}
fn default_max_holding() -> i64 {
    60
}

/// One year of minutes.
pub const MAX_HOLDING_MINUTES: i64 = 525_600;

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl BacktestConfig {
    /// Read, parse and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.backtest;
        let invalid = |field, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };

        if b.symbol.trim().is_empty() {
            return invalid("symbol", "must not be empty");
        }
        if b.name.trim().is_empty() {
            return invalid("name", "must not be empty");
        }
        if b.start_date > b.end_date {
            return invalid("start_date", "must not be after end_date");
        }
        if !positive(b.initial_capital) {
            return invalid("initial_capital", "must be positive");
        }
        if !positive(b.position_size) || b.position_size > 1.0 {
            return invalid("position_size", "must be in (0, 1]");
        }
        if let Some(q) = b.quantity {
            if !positive(q) {
                return invalid("quantity", "must be positive");
            }
        }
        if !(0.0..1.0).contains(&b.transaction_cost) {
            return invalid("transaction_cost", "must be in [0, 1)");
        }
        if !positive(b.stop_loss_pct) {
            return invalid("stop_loss_pct", "must be positive");
        }
        if !positive(b.take_profit_pct) {
            return invalid("take_profit_pct", "must be positive");
        }
        if b.max_holding_minutes <= 0 {
            return invalid("max_holding_minutes", "must be positive");
        }
        if b.max_holding_minutes > MAX_HOLDING_MINUTES {
            return invalid("max_holding_minutes", "must be at most 525600 (one year)");
        }

        let p = &self.indicators;
        for (field, value) in [
            ("conversion_period", p.conversion_period),
            ("base_period", p.base_period),
            ("span_b_period", p.span_b_period),
            ("displacement", p.displacement),
            ("strength_period", p.strength_period),
        ] {
            if value == 0 {
                return invalid(field, "must be at least 1");
            }
        }
        Ok(())
    }

    /// Exit and sizing parameters for the trade simulator.
    pub fn simulator_config(&self) -> SimulatorConfig {
        let b = &self.backtest;
        SimulatorConfig {
            stop_loss_pct: b.stop_loss_pct,
            take_profit_pct: b.take_profit_pct,
            max_holding_minutes: b.max_holding_minutes,
            initial_capital: b.initial_capital,
            position_size: b.position_size,
            quantity: b.quantity,
            transaction_cost: b.transaction_cost,
        }
    }

    /// Inclusive timestamp range covering the configured dates.
    pub fn time_range(&self) -> (NaiveDateTime, NaiveDateTime) {
        let start = self.backtest.start_date.and_time(NaiveTime::MIN);
        let end = self
            .backtest
            .end_date
            .and_hms_opt(23, 59, 59)
            .unwrap_or_else(|| self.backtest.end_date.and_time(NaiveTime::MIN));
        (start, end)
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share the same RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
