//! Linear regression projection.
//!
//! Fits a least-squares line through the trailing `period` values and
//! reports the fitted value at the most recent bar.
//! Warmup: first (period - 1) rows are NaN. A window holding any NaN is NaN.

use crate::domain::error::SignalbookError;
use crate::domain::indicator::ColumnIndicator;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegressionProjection {
    column_name: String,
    source: String,
    period: usize,
}

impl LinearRegressionProjection {
    pub fn new(
        column_name: impl Into<String>,
        source: impl Into<String>,
        period: usize,
    ) -> Result<Self, SignalbookError> {
        let column_name = column_name.into();
        if period < 2 {
            return Err(SignalbookError::invalid_config(format!(
                "lr_proj {column_name}: period must be at least 2, got {period}"
            )));
        }
        if column_name.trim().is_empty() {
            return Err(SignalbookError::invalid_config("lr_proj column name must not be empty"));
        }
        Ok(Self {
            column_name,
            source: source.into(),
            period,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl ColumnIndicator for LinearRegressionProjection {
    fn column_name(&self) -> &str {
        &self.column_name
    }

    fn source_column(&self) -> &str {
        &self.source
    }

    fn compute(&self, source: &[f64]) -> Vec<f64> {
        let n = self.period;
        if n > source.len() {
            return vec![f64::NAN; source.len()];
        }
        // x = 0..n-1 is the same for every window. f64 throughout: usize
        // products overflow for large periods.
        let nf = n as f64;
        let sum_x = nf * (nf - 1.0) / 2.0;
        let sum_xx = (nf - 1.0) * nf * (2.0 * nf - 1.0) / 6.0;
        let denom = nf * sum_xx - sum_x * sum_x;

        (0..source.len())
            .map(|i| {
                if i + 1 < n {
                    return f64::NAN;
                }
                let window = &source[i + 1 - n..=i];
                let (sum_y, sum_xy) = window
                    .iter()
                    .enumerate()
                    .fold((0.0, 0.0), |(sy, sxy), (x, &y)| (sy + y, sxy + x as f64 * y));
                let slope = (nf * sum_xy - sum_x * sum_y) / denom;
                let intercept = (sum_y - slope * sum_x) / nf;
                intercept + slope * (nf - 1.0)
            })
            .collect()
    }
}
