//! Relational operators and three-valued verdicts.
//!
//! Operators are a closed set. The external surface uses symbolic tokens
//! (`">"`, `"<="`, ...) which map 1:1 onto [`RelOp`]; anything else is
//! rejected when parsed. Comparisons involving a missing (NaN) value produce
//! [`Verdict::Indeterminate`] for every operator.

use crate::domain::error::SignalbookError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl RelOp {
    pub const ALL: [RelOp; 6] = [
        RelOp::Gt,
        RelOp::Lt,
        RelOp::Ge,
        RelOp::Le,
        RelOp::Eq,
        RelOp::Ne,
    ];

    pub fn token(self) -> &'static str {
        match self {
            RelOp::Gt => ">",
            RelOp::Lt => "<",
            RelOp::Ge => ">=",
            RelOp::Le => "<=",
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
        }
    }

    /// Apply `a <op> b`. NaN on either side yields `Indeterminate`.
    pub fn compare(self, a: f64, b: f64) -> Verdict {
        if a.is_nan() || b.is_nan() {
            return Verdict::Indeterminate;
        }
        let holds = match self {
            RelOp::Gt => a > b,
            RelOp::Lt => a < b,
            RelOp::Ge => a >= b,
            RelOp::Le => a <= b,
            RelOp::Eq => a == b,
            RelOp::Ne => a != b,
        };
        Verdict::from(holds)
    }
}

impl FromStr for RelOp {
    type Err = SignalbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        RelOp::ALL
            .into_iter()
            .find(|op| op.token() == token)
            .ok_or_else(|| {
                SignalbookError::invalid_config(format!("unknown operator token '{token}'"))
            })
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Outcome of one comparison: fired, not fired, or undecidable because data
/// was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    True,
    False,
    Indeterminate,
}

impl Verdict {
    pub fn is_true(self) -> bool {
        self == Verdict::True
    }

    pub fn is_indeterminate(self) -> bool {
        self == Verdict::Indeterminate
    }

    /// Force a qualifying verdict to `False` when `guard` holds.
    pub fn suppressed_by(self, guard: Verdict) -> Verdict {
        match (self, guard) {
            (Verdict::Indeterminate, _) | (_, Verdict::Indeterminate) => Verdict::Indeterminate,
            (Verdict::True, Verdict::True) => Verdict::False,
            (v, _) => v,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::True => "true",
            Verdict::False => "false",
            Verdict::Indeterminate => "indeterminate",
        }
    }
}

impl From<bool> for Verdict {
    fn from(value: bool) -> Self {
        if value { Verdict::True } else { Verdict::False }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
