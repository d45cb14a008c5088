//! Verdict report port trait.

use crate::domain::error::SignalbookError;
use crate::domain::evaluator::{SignalReport, VerdictRecord};
use std::io::Write;

/// Port for writing evaluation verdicts.
pub trait ReportPort {
    fn write_records(
        &self,
        records: &[VerdictRecord<'_>],
        out: &mut dyn Write,
    ) -> Result<(), SignalbookError>;

    /// Every (symbol, timestamp, rule) verdict, or only each symbol's final row.
    fn write(
        &self,
        report: &SignalReport,
        latest_only: bool,
        out: &mut dyn Write,
    ) -> Result<(), SignalbookError> {
        self.write_records(&report.records(latest_only), out)
    }
}
