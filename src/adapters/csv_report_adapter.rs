//! CSV verdict report adapter.
//!
//! One line per (symbol, timestamp, rule) with `true`/`false`/`indeterminate`
//! in the buy and sell columns.

use crate::domain::error::SignalbookError;
use crate::domain::evaluator::VerdictRecord;
use crate::ports::report_port::ReportPort;
use std::io::Write;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvReportAdapter;

impl ReportPort for CsvReportAdapter {
    fn write_records(
        &self,
        records: &[VerdictRecord<'_>],
        out: &mut dyn Write,
    ) -> Result<(), SignalbookError> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(["symbol", "timestamp", "rule", "buy", "sell"])
            .map_err(csv_error)?;
        for record in records {
            let timestamp = record.timestamp.format(TIMESTAMP_FORMAT).to_string();
            wtr.write_record([
                record.symbol,
                timestamp.as_str(),
                record.rule,
                record.buy.as_str(),
                record.sell.as_str(),
            ])
            .map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn csv_error(e: csv::Error) -> SignalbookError {
    SignalbookError::data(format!("CSV write error: {}", e))
}
