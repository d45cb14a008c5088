//! Pluggable column indicators.
//!
//! An indicator turns one source column into a new column, per symbol
//! group. Indicators run before evaluation and write into the table; the
//! evaluator only ever reads finished columns.

pub mod lr_proj;

use crate::domain::error::SignalbookError;
use crate::domain::frame::PriceFrame;
use tracing::debug;

pub trait ColumnIndicator {
    /// Name of the column this indicator produces.
    fn column_name(&self) -> &str;

    /// Name of the column it reads.
    fn source_column(&self) -> &str;

    /// Output has the same length as `source`; `NaN` where undefined.
    fn compute(&self, source: &[f64]) -> Vec<f64>;
}

/// Compute `indicator` for every symbol group and add the result to `frame`.
pub fn apply_indicator(
    frame: &mut PriceFrame,
    indicator: &dyn ColumnIndicator,
) -> Result<(), SignalbookError> {
    let mut computed = Vec::with_capacity(frame.groups().len());
    for group in frame.groups() {
        let source = group.column(indicator.source_column()).ok_or_else(|| {
            SignalbookError::data(format!(
                "indicator {} needs column {} which {} does not have",
                indicator.column_name(),
                indicator.source_column(),
                group.symbol()
            ))
        })?;
        computed.push((group.symbol().to_string(), indicator.compute(source)));
    }

    for (symbol, values) in computed {
        frame.add_column(&symbol, indicator.column_name(), values)?;
    }
    debug!(column = indicator.column_name(), "indicator applied");
    Ok(())
}
