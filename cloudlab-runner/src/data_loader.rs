//! Bar loading and resampling for the runner.
//!
//! Bars come from CSV files with a `timestamp,open,high,low,close` header
//! (`datetime` is accepted as an alias for the time column; extra columns
//! are ignored). Rows are filtered to the requested range and validated into
//! a `PriceSeries`, so malformed or out-of-order input fails here rather than
//! inside the indicator math.

use std::io::Read;
use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use cloudlab_core::domain::{Bar, BarError, PriceSeries, Timeframe};

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unparseable timestamp '{value}'")]
    Timestamp { row: usize, value: String },
    #[error("malformed bar: {0}")]
    Bar(#[from] BarError),
}

#[derive(Debug, Deserialize)]
struct CsvBar {
    #[serde(alias = "datetime")]
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Read bars from any CSV source, keeping rows inside the inclusive `range`.
pub fn read_bars_csv<R: Read>(
    reader: R,
    range: Option<(NaiveDateTime, NaiveDateTime)>,
) -> Result<PriceSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    let mut dropped = 0usize;

    for (row, record) in rdr.deserialize::<CsvBar>().enumerate() {
        let record = record?;
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| LoadError::Timestamp {
            row: row + 1,
            value: record.timestamp.clone(),
        })?;
        if let Some((start, end)) = range {
            if timestamp < start || timestamp > end {
                dropped += 1;
                continue;
            }
        }
        bars.push(Bar::new(timestamp, record.open, record.high, record.low, record.close));
    }

    debug!(kept = bars.len(), dropped, "parsed bar CSV");
    Ok(PriceSeries::new(bars)?)
}

/// Load bars from a CSV file, keeping rows inside the inclusive `range`.
pub fn load_bars_csv(
    path: &Path,
    range: Option<(NaiveDateTime, NaiveDateTime)>,
) -> Result<PriceSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_bars_csv(file, range)
}

fn unix_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Start of the epoch-aligned bucket containing `ts`.
fn bucket_start(ts: NaiveDateTime, timeframe: Timeframe) -> NaiveDateTime {
    let epoch = unix_epoch();
    let width = i64::from(timeframe.minutes()) * 60;
    let secs = (ts - epoch).num_seconds();
    epoch + Duration::seconds(secs.div_euclid(width) * width)
}

/// Aggregate bars into `timeframe` buckets aligned to the Unix epoch.
///
/// open = first, high = max, low = min, close = last. Buckets with no input
/// bars are dropped, never filled.
pub fn resample(series: &PriceSeries, timeframe: Timeframe) -> Result<PriceSeries, LoadError> {
    let mut out: Vec<Bar> = Vec::new();
    for bar in series {
        let start = bucket_start(bar.timestamp, timeframe);
        match out.last_mut() {
            Some(current) if current.timestamp == start => {
                current.high = current.high.max(bar.high);
                current.low = current.low.min(bar.low);
                current.close = bar.close;
            }
            _ => out.push(Bar::new(start, bar.open, bar.high, bar.low, bar.close)),
        }
    }
    Ok(PriceSeries::new(out)?)
}
