//! In-memory price/indicator table grouped by symbol.
//!
//! Each `SymbolFrame` is one symbol's ordered rows: strictly increasing
//! timestamps plus any number of named `f64` columns of the same length.
//! `NaN` marks a missing value.

use crate::domain::error::SignalbookError;
use crate::ports::table_port::TimeSeriesTable;
use chrono::NaiveDateTime;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolFrame {
    symbol: String,
    timestamps: Vec<NaiveDateTime>,
    columns: HashMap<String, Vec<f64>>,
}

impl SymbolFrame {
    pub fn new(
        symbol: impl Into<String>,
        timestamps: Vec<NaiveDateTime>,
    ) -> Result<Self, SignalbookError> {
        let symbol = symbol.into();
        if let Some(pair) = timestamps.windows(2).find(|w| w[0] >= w[1]) {
            return Err(SignalbookError::data(format!(
                "timestamps for {symbol} must be strictly increasing ({} then {})",
                pair[0], pair[1]
            )));
        }
        Ok(Self {
            symbol,
            timestamps,
            columns: HashMap::new(),
        })
    }

    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, SignalbookError> {
        self.set_column(name, values)?;
        Ok(self)
    }

    /// Insert or replace a column. Its length must match the row count.
    pub fn set_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), SignalbookError> {
        let name = name.into();
        if values.len() != self.timestamps.len() {
            return Err(SignalbookError::data(format!(
                "column {name} for {} has {} values, expected {}",
                self.symbol,
                values.len(),
                self.timestamps.len()
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn row_count(&self) -> usize {
        self.timestamps.len()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Column names, sorted.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.columns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceFrame {
    multi_index: bool,
    groups: Vec<SymbolFrame>,
    index: HashMap<String, usize>,
}

impl PriceFrame {
    /// A table keyed by (symbol, timestamp). Groups keep the given order.
    pub fn grouped(groups: Vec<SymbolFrame>) -> Result<Self, SignalbookError> {
        let mut index = HashMap::with_capacity(groups.len());
        for (i, group) in groups.iter().enumerate() {
            if index.insert(group.symbol.clone(), i).is_some() {
                return Err(SignalbookError::data(format!(
                    "duplicate symbol group {}",
                    group.symbol
                )));
            }
        }
        Ok(Self {
            multi_index: true,
            groups,
            index,
        })
    }

    /// A single series keyed by timestamp only.
    pub fn single(series: SymbolFrame) -> Self {
        let index = HashMap::from([(series.symbol.clone(), 0)]);
        Self {
            multi_index: false,
            groups: vec![series],
            index,
        }
    }

    pub fn groups(&self) -> &[SymbolFrame] {
        &self.groups
    }

    pub fn group(&self, symbol: &str) -> Option<&SymbolFrame> {
        self.index.get(symbol).map(|&i| &self.groups[i])
    }

    pub fn column(&self, symbol: &str, name: &str) -> Option<&[f64]> {
        self.group(symbol).and_then(|g| g.column(name))
    }

    pub fn add_column(
        &mut self,
        symbol: &str,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), SignalbookError> {
        let i = *self
            .index
            .get(symbol)
            .ok_or_else(|| SignalbookError::data(format!("unknown symbol {symbol}")))?;
        self.groups[i].set_column(name, values)
    }

    pub fn row_count(&self) -> usize {
        self.groups.iter().map(SymbolFrame::row_count).sum()
    }
}

impl TimeSeriesTable for PriceFrame {
    fn is_multi_index(&self) -> bool {
        self.multi_index
    }

    fn symbols(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.symbol.as_str()).collect()
    }

    fn timestamps(&self, symbol: &str) -> &[NaiveDateTime] {
        self.group(symbol).map(SymbolFrame::timestamps).unwrap_or(&[])
    }

    fn value(&self, symbol: &str, column: &str, row: usize) -> f64 {
        self.column(symbol, column)
            .and_then(|values| values.get(row).copied())
            .unwrap_or(f64::NAN)
    }

    fn has_column(&self, symbol: &str, column: &str) -> bool {
        self.column(symbol, column).is_some()
    }
}
