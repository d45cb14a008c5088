#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use signalbook::domain::frame::{PriceFrame, SymbolFrame};
use signalbook::domain::registry::{SignalRegistry, ThresholdParams};
use std::io::Write;

pub fn ts(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(16, 0, 0)
        .unwrap()
}

/// One symbol with consecutive daily rows starting 2024-01-01.
pub fn symbol_frame(symbol: &str, columns: Vec<(&str, Vec<f64>)>) -> SymbolFrame {
    let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
    let mut frame = SymbolFrame::new(symbol, (1..=rows as u32).map(ts).collect()).unwrap();
    for (name, values) in columns {
        frame = frame.with_column(name, values).unwrap();
    }
    frame
}

pub fn grouped(frames: Vec<SymbolFrame>) -> PriceFrame {
    PriceFrame::grouped(frames).unwrap()
}

/// TSF threshold with a buy max-guard plus an A-vs-B comparison.
pub fn sample_registry() -> SignalRegistry {
    let mut registry = SignalRegistry::new();
    registry
        .register_threshold(
            "TSF",
            ThresholdParams::new(10.0, 2.0, ">", "<").with_buy_max(20.0, ">"),
        )
        .unwrap();
    registry.register_comparison("A", "B", ">", "<").unwrap();
    registry
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
