//! CSV price/indicator table adapter.
//!
//! Expects a header row. `timestamp` is required; `symbol` is optional and
//! its absence yields a single-series table. Every other column is numeric;
//! blank cells and `NaN` are missing values.

use crate::domain::error::SignalbookError;
use crate::domain::frame::{PriceFrame, SymbolFrame};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const SYMBOL_COLUMN: &str = "symbol";

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub struct CsvAdapter {
    path: PathBuf,
}

/// Rows collected for one symbol before sorting.
struct PendingGroup {
    rows: Vec<(NaiveDateTime, Vec<f64>)>,
}

impl CsvAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<PriceFrame, SignalbookError> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            SignalbookError::data(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let default_symbol = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("series")
            .to_string();
        read_frame(file, &default_symbol)
    }
}

/// Parse a table from any reader. `default_symbol` labels a single series.
pub fn read_frame<R: Read>(reader: R, default_symbol: &str) -> Result<PriceFrame, SignalbookError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| SignalbookError::data(format!("CSV header error: {}", e)))?
        .clone();

    let ts_idx = headers
        .iter()
        .position(|h| h == TIMESTAMP_COLUMN)
        .ok_or_else(|| SignalbookError::data("missing timestamp column"))?;
    let symbol_idx = headers.iter().position(|h| h == SYMBOL_COLUMN);

    let value_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != ts_idx && Some(*i) != symbol_idx)
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut order: Vec<String> = Vec::new();
    let mut pending: HashMap<String, PendingGroup> = HashMap::new();

    for (line, result) in rdr.records().enumerate() {
        let record =
            result.map_err(|e| SignalbookError::data(format!("CSV parse error: {}", e)))?;
        // Header is line 1.
        let line = line + 2;

        let ts_str = record
            .get(ts_idx)
            .ok_or_else(|| SignalbookError::data(format!("line {line}: missing timestamp")))?;
        let timestamp = parse_timestamp(ts_str).ok_or_else(|| {
            SignalbookError::data(format!("line {line}: invalid timestamp '{ts_str}'"))
        })?;

        let symbol = match symbol_idx {
            Some(i) => match record.get(i) {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => return Err(SignalbookError::data(format!("line {line}: missing symbol"))),
            },
            None => default_symbol.to_string(),
        };

        let mut values = Vec::with_capacity(value_columns.len());
        for (i, name) in &value_columns {
            values.push(parse_value(record.get(*i).unwrap_or(""), name, line)?);
        }

        if !pending.contains_key(&symbol) {
            order.push(symbol.clone());
        }
        pending
            .entry(symbol)
            .or_insert_with(|| PendingGroup { rows: Vec::new() })
            .rows
            .push((timestamp, values));
    }

    let mut groups = Vec::with_capacity(order.len());
    for symbol in order {
        let Some(mut group) = pending.remove(&symbol) else {
            continue;
        };
        group.rows.sort_by_key(|(ts, _)| *ts);
        debug!(symbol = %symbol, rows = group.rows.len(), "loaded symbol group");
        groups.push(build_group(symbol, group, &value_columns)?);
    }

    if symbol_idx.is_some() {
        PriceFrame::grouped(groups)
    } else {
        match groups.pop() {
            Some(series) => Ok(PriceFrame::single(series)),
            None => Ok(PriceFrame::single(SymbolFrame::new(default_symbol, Vec::new())?)),
        }
    }
}

fn build_group(
    symbol: String,
    group: PendingGroup,
    value_columns: &[(usize, String)],
) -> Result<SymbolFrame, SignalbookError> {
    let timestamps: Vec<NaiveDateTime> = group.rows.iter().map(|(ts, _)| *ts).collect();
    let mut frame = SymbolFrame::new(symbol, timestamps)?;
    for (col, (_, name)) in value_columns.iter().enumerate() {
        let values = group.rows.iter().map(|(_, row)| row[col]).collect();
        frame.set_column(name.clone(), values)?;
    }
    Ok(frame)
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_value(s: &str, column: &str, line: usize) -> Result<f64, SignalbookError> {
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    s.parse().map_err(|_| {
        SignalbookError::data(format!("line {line}: invalid {column} value '{s}'"))
    })
}
