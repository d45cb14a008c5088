//! Signal rule data structures.
//!
//! - `ThresholdRule`: one indicator against static buy/sell cutoffs, with an
//!   optional max-guard per side that invalidates an otherwise-qualifying signal
//! - `ComparisonRule`: one indicator against another
//! - `SignalRule`: the tagged union stored in the registry
//!
//! Rules are pure configuration; they never hold indicator values.

use crate::domain::rel_op::RelOp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used to derive a comparison rule's registry key.
pub const COMPARISON_SEPARATOR: &str = "_comp_";

/// Registry key for a comparison of `indicator_a` against `indicator_b`.
/// Order matters: `(A, B)` and `(B, A)` are different rules.
pub fn comparison_key(indicator_a: &str, indicator_b: &str) -> String {
    format!("{indicator_a}{COMPARISON_SEPARATOR}{indicator_b}")
}

/// Secondary cutoff: when `operator(value, cutoff)` holds the signal is suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaxGuard {
    pub cutoff: f64,
    pub operator: RelOp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub indicator_name: String,
    pub buy: f64,
    pub sell: f64,
    pub buy_operator: RelOp,
    pub sell_operator: RelOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_max: Option<MaxGuard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_max: Option<MaxGuard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRule {
    pub indicator_a: String,
    pub indicator_b: String,
    pub buy_operator: RelOp,
    pub sell_operator: RelOp,
}

impl ComparisonRule {
    pub fn key(&self) -> String {
        comparison_key(&self.indicator_a, &self.indicator_b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalRule {
    Threshold(ThresholdRule),
    Comparison(ComparisonRule),
}

impl SignalRule {
    /// Column names this rule reads from the table.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            SignalRule::Threshold(t) => vec![t.indicator_name.as_str()],
            SignalRule::Comparison(c) => vec![c.indicator_a.as_str(), c.indicator_b.as_str()],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SignalRule::Threshold(_) => "threshold",
            SignalRule::Comparison(_) => "comparison",
        }
    }
}

impl fmt::Display for SignalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalRule::Threshold(t) => {
                write!(f, "buy {} {} {}", t.indicator_name, t.buy_operator, t.buy)?;
                if let Some(g) = &t.buy_max {
                    write!(f, " unless {} {}", g.operator, g.cutoff)?;
                }
                write!(f, "; sell {} {} {}", t.indicator_name, t.sell_operator, t.sell)?;
                if let Some(g) = &t.sell_max {
                    write!(f, " unless {} {}", g.operator, g.cutoff)?;
                }
                Ok(())
            }
            SignalRule::Comparison(c) => write!(
                f,
                "buy {a} {} {b}; sell {a} {} {b}",
                c.buy_operator,
                c.sell_operator,
                a = c.indicator_a,
                b = c.indicator_b
            ),
        }
    }
}
