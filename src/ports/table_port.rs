//! Time-series table port.
//!
//! The evaluator only needs to walk symbol groups in order and read a named
//! numeric column per row. Missing data is reported as `NaN`.

use chrono::NaiveDateTime;

pub trait TimeSeriesTable {
    /// `true` when rows are keyed by (symbol, timestamp), `false` for a single series.
    fn is_multi_index(&self) -> bool;

    /// Symbols in table order.
    fn symbols(&self) -> Vec<&str>;

    /// Ordered timestamps for `symbol`; empty when the symbol is unknown.
    fn timestamps(&self, symbol: &str) -> &[NaiveDateTime];

    /// Value of `column` at `row` for `symbol`, or `NaN` when absent.
    fn value(&self, symbol: &str, column: &str, row: usize) -> f64;

    fn has_column(&self, symbol: &str, column: &str) -> bool;
}
