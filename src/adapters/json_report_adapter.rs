//! JSON verdict report adapter.

use crate::domain::error::SignalbookError;
use crate::domain::evaluator::VerdictRecord;
use crate::ports::report_port::ReportPort;
use std::io::Write;

pub struct JsonReportAdapter;

impl ReportPort for JsonReportAdapter {
    fn write_records(
        &self,
        records: &[VerdictRecord<'_>],
        out: &mut dyn Write,
    ) -> Result<(), SignalbookError> {
        serde_json::to_writer_pretty(&mut *out, records)?;
        writeln!(out)?;
        Ok(())
    }
}
