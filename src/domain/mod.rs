//! Core domain types and logic.

pub mod rel_op;
pub mod signal_rule;
pub mod registry;
pub mod frame;
pub mod evaluator;
pub mod indicator;
pub mod config_validation;
pub mod error;
