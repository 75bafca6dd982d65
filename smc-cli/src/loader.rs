//! CSV bar loading.
//!
//! Expected columns: `timestamp,open,high,low,close,volume`. Header names are
//! matched case-insensitively, and the time column may also be called `date`,
//! `time` or `datetime`. Rows must be in strictly increasing
//! time order. OHLC sanity is not enforced; insane rows are counted and
//! reported so the caller can decide whether to trust the result.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use smc_core::domain::Bar;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Epoch values above this are taken as milliseconds.
const MILLIS_CUTOFF: i64 = 100_000_000_000;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("{source_name} row {row}: {source}")]
    Row {
        source_name: String,
        row: usize,
        source: csv::Error,
    },

    #[error("{source_name} row {row}: unrecognized timestamp '{value}'")]
    Timestamp {
        source_name: String,
        row: usize,
        value: String,
    },

    #[error("{source_name} row {row}: timestamp {timestamp} is not after the previous bar")]
    OutOfOrder {
        source_name: String,
        row: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Bars read from one source, plus data quality counters.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub source: String,
    pub bars: Vec<Bar>,
    pub insane_rows: usize,
}

/// Field names match the lower-cased header.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "date", alias = "time", alias = "datetime")]
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub fn load_csv(path: &Path) -> Result<LoadedBars, LoadError> {
    let source = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| LoadError::Open {
        path: source.clone(),
        source: csv::Error::from(e),
    })?;
    read_bars(file, &source)
}

pub fn read_bars<R: Read>(reader: R, source: &str) -> Result<LoadedBars, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| LoadError::Row {
            source_name: source.to_string(),
            row: 1,
            source: e,
        })?
        .iter()
        .map(str::to_lowercase)
        .collect::<csv::StringRecord>();
    csv_reader.set_headers(headers);

    let mut bars: Vec<Bar> = Vec::new();
    let mut insane_rows = 0;

    for (i, record) in csv_reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1.
        let row = i + 2;
        let record = record.map_err(|e| LoadError::Row {
            source_name: source.to_string(),
            row,
            source: e,
        })?;

        let timestamp =
            parse_timestamp(&record.timestamp).ok_or_else(|| LoadError::Timestamp {
                source_name: source.to_string(),
                row,
                value: record.timestamp.clone(),
            })?;

        if let Some(prev) = bars.last() {
            if timestamp <= prev.timestamp {
                return Err(LoadError::OutOfOrder {
                    source_name: source.to_string(),
                    row,
                    timestamp,
                });
            }
        }

        let bar = Bar {
            timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        };
        if !bar.is_sane() {
            insane_rows += 1;
        }
        bars.push(bar);
    }

    if insane_rows > 0 {
        warn!(source, insane_rows, "bars violate OHLC invariants; results may be meaningless");
    }
    debug!(source, bars = bars.len(), "loaded bars");

    Ok(LoadedBars {
        source: source.to_string(),
        bars,
        insane_rows,
    })
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`, or integer epoch
/// seconds / milliseconds.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(epoch) = value.parse::<i64>() {
        return if epoch.abs() >= MILLIS_CUTOFF {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
