//! Signal evaluation engine.
//!
//! Evaluates every registered rule against every row of every symbol group.
//!
//! # Evaluation Semantics
//!
//! - Threshold: `buy = buy_operator(v, buy)`; when a buy max-guard is set and
//!   `buy_max_operator(v, buy_max)` holds, the buy is forced to `false`.
//!   The sell side is symmetric.
//! - Comparison: `buy = buy_operator(a, b)`, `sell = sell_operator(a, b)`
//! - Missing or NaN input yields `Indeterminate`, never `false`
//! - Buy and sell may both fire on one row; no arbitration happens here
//! - Rows and rules are independent: no carry-over between rows, no rule
//!   reads another rule's verdict

use crate::domain::registry::SignalRegistry;
use crate::domain::rel_op::Verdict;
use crate::domain::signal_rule::{ComparisonRule, SignalRule, ThresholdRule};
use crate::ports::table_port::TimeSeriesTable;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SignalState {
    pub buy: Verdict,
    pub sell: Verdict,
}

impl SignalState {
    pub const INDETERMINATE: SignalState = SignalState {
        buy: Verdict::Indeterminate,
        sell: Verdict::Indeterminate,
    };

    /// Both sides fired on the same row.
    pub fn is_contradictory(&self) -> bool {
        self.buy.is_true() && self.sell.is_true()
    }
}

/// Evaluate one rule at one row of one symbol.
pub fn evaluate_rule(
    rule: &SignalRule,
    table: &dyn TimeSeriesTable,
    symbol: &str,
    row: usize,
) -> SignalState {
    match rule {
        SignalRule::Threshold(t) => {
            evaluate_threshold(t, table.value(symbol, &t.indicator_name, row))
        }
        SignalRule::Comparison(c) => evaluate_comparison(
            c,
            table.value(symbol, &c.indicator_a, row),
            table.value(symbol, &c.indicator_b, row),
        ),
    }
}

pub fn evaluate_threshold(rule: &ThresholdRule, value: f64) -> SignalState {
    let mut buy = rule.buy_operator.compare(value, rule.buy);
    if let Some(guard) = &rule.buy_max {
        buy = buy.suppressed_by(guard.operator.compare(value, guard.cutoff));
    }

    let mut sell = rule.sell_operator.compare(value, rule.sell);
    if let Some(guard) = &rule.sell_max {
        sell = sell.suppressed_by(guard.operator.compare(value, guard.cutoff));
    }

    SignalState { buy, sell }
}

pub fn evaluate_comparison(rule: &ComparisonRule, a: f64, b: f64) -> SignalState {
    SignalState {
        buy: rule.buy_operator.compare(a, b),
        sell: rule.sell_operator.compare(a, b),
    }
}

/// Verdicts for one symbol: `states[row][rule]`, rules in registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolVerdicts {
    pub symbol: String,
    pub timestamps: Vec<NaiveDateTime>,
    pub states: Vec<Vec<SignalState>>,
}

/// One flattened (symbol, timestamp, rule) entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VerdictRecord<'a> {
    pub symbol: &'a str,
    pub timestamp: NaiveDateTime,
    pub rule: &'a str,
    pub buy: Verdict,
    pub sell: Verdict,
}

/// All rule verdicts for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowVerdicts<'a> {
    pub symbol: &'a str,
    pub timestamp: NaiveDateTime,
    pub signals: Vec<(&'a str, SignalState)>,
}

impl<'a> RowVerdicts<'a> {
    pub fn into_records(self) -> impl Iterator<Item = VerdictRecord<'a>> {
        let RowVerdicts {
            symbol,
            timestamp,
            signals,
        } = self;
        signals.into_iter().map(move |(rule, state)| VerdictRecord {
            symbol,
            timestamp,
            rule,
            buy: state.buy,
            sell: state.sell,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalReport {
    pub multi_index: bool,
    pub rule_keys: Vec<String>,
    pub symbols: Vec<SymbolVerdicts>,
}

impl SignalReport {
    pub fn symbol(&self, symbol: &str) -> Option<&SymbolVerdicts> {
        self.symbols.iter().find(|s| s.symbol == symbol)
    }

    pub fn lookup(&self, symbol: &str, timestamp: NaiveDateTime, key: &str) -> Option<SignalState> {
        let verdicts = self.symbol(symbol)?;
        let row = verdicts.timestamps.binary_search(&timestamp).ok()?;
        let rule = self.rule_keys.iter().position(|k| k == key)?;
        Some(verdicts.states[row][rule])
    }

    /// The final row of every non-empty symbol.
    pub fn latest(&self) -> Vec<RowVerdicts<'_>> {
        self.symbols
            .iter()
            .filter_map(|s| {
                let row = s.timestamps.len().checked_sub(1)?;
                Some(self.row(s, row))
            })
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = RowVerdicts<'_>> + '_ {
        self.symbols
            .iter()
            .flat_map(move |s| (0..s.timestamps.len()).map(move |row| self.row(s, row)))
    }

    pub fn iter(&self) -> impl Iterator<Item = VerdictRecord<'_>> + '_ {
        self.rows().flat_map(RowVerdicts::into_records)
    }

    /// Flattened records of every row, or of each symbol's final row only.
    pub fn records(&self, latest_only: bool) -> Vec<VerdictRecord<'_>> {
        if latest_only {
            self.latest()
                .into_iter()
                .flat_map(RowVerdicts::into_records)
                .collect()
        } else {
            self.iter().collect()
        }
    }

    pub fn len(&self) -> usize {
        self.symbols
            .iter()
            .map(|s| s.timestamps.len() * self.rule_keys.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn row<'a>(&'a self, verdicts: &'a SymbolVerdicts, row: usize) -> RowVerdicts<'a> {
        RowVerdicts {
            symbol: &verdicts.symbol,
            timestamp: verdicts.timestamps[row],
            signals: self
                .rule_keys
                .iter()
                .map(String::as_str)
                .zip(verdicts.states[row].iter().copied())
                .collect(),
        }
    }
}

/// Evaluates a fixed rule list against tables.
///
/// Borrowing the rule list rather than the registry lets callers snapshot the
/// rules once and share them across threads while the registry stays free.
pub struct SignalEvaluator<'r> {
    rules: &'r [(String, SignalRule)],
}

impl<'r> SignalEvaluator<'r> {
    pub fn new(registry: &'r SignalRegistry) -> Self {
        Self {
            rules: registry.entries(),
        }
    }

    pub fn from_rules(rules: &'r [(String, SignalRule)]) -> Self {
        Self { rules }
    }

    pub fn evaluate(&self, table: &dyn TimeSeriesTable) -> SignalReport {
        let symbols = table
            .symbols()
            .into_iter()
            .map(|symbol| self.evaluate_symbol(table, symbol))
            .collect();
        SignalReport {
            multi_index: table.is_multi_index(),
            rule_keys: self.rules.iter().map(|(k, _)| k.clone()).collect(),
            symbols,
        }
    }

    pub fn evaluate_symbol(&self, table: &dyn TimeSeriesTable, symbol: &str) -> SymbolVerdicts {
        for (key, rule) in self.rules {
            for column in rule.columns() {
                if !table.has_column(symbol, column) {
                    warn!(
                        symbol,
                        rule = %key,
                        column,
                        "column missing; verdicts will be indeterminate"
                    );
                }
            }
        }

        let timestamps = table.timestamps(symbol).to_vec();
        let states: Vec<Vec<SignalState>> = (0..timestamps.len())
            .map(|row| {
                self.rules
                    .iter()
                    .map(|(_, rule)| evaluate_rule(rule, table, symbol, row))
                    .collect()
            })
            .collect();

        debug!(symbol, rows = timestamps.len(), rules = self.rules.len(), "evaluated symbol");

        SymbolVerdicts {
            symbol: symbol.to_string(),
            timestamps,
            states,
        }
    }
}
