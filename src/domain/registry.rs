//! Signal rule registry.
//!
//! Owns rules keyed by name in registration order. Re-registering a key
//! replaces the rule in place and keeps its original position. Every
//! registration is validated in full before the registry is touched, so a
//! failed call leaves it unchanged.

use crate::domain::error::SignalbookError;
use crate::domain::rel_op::RelOp;
use crate::domain::signal_rule::{ComparisonRule, MaxGuard, SignalRule, ThresholdRule};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Raw threshold registration as it arrives from the configuration surface.
/// Operators are still tokens here; they are parsed during registration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdParams<'a> {
    pub buy: f64,
    pub sell: f64,
    pub buy_operator: &'a str,
    pub sell_operator: &'a str,
    pub buy_max: Option<f64>,
    pub sell_max: Option<f64>,
    pub buy_max_operator: Option<&'a str>,
    pub sell_max_operator: Option<&'a str>,
}

impl<'a> ThresholdParams<'a> {
    pub fn new(buy: f64, sell: f64, buy_operator: &'a str, sell_operator: &'a str) -> Self {
        Self {
            buy,
            sell,
            buy_operator,
            sell_operator,
            buy_max: None,
            sell_max: None,
            buy_max_operator: None,
            sell_max_operator: None,
        }
    }

    pub fn with_buy_max(mut self, cutoff: f64, operator: &'a str) -> Self {
        self.buy_max = Some(cutoff);
        self.buy_max_operator = Some(operator);
        self
    }

    pub fn with_sell_max(mut self, cutoff: f64, operator: &'a str) -> Self {
        self.sell_max = Some(cutoff);
        self.sell_max_operator = Some(operator);
        self
    }
}

/// Result of [`SignalRegistry::get_signal`].
#[derive(Debug, Clone, PartialEq)]
pub enum SignalLookup<'a> {
    One(&'a SignalRule),
    All(Vec<(&'a str, &'a SignalRule)>),
}

/// Serializable form of a registry: rules in registration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub rules: Vec<SignalRule>,
}

#[derive(Debug, Clone, Default)]
pub struct SignalRegistry {
    entries: Vec<(String, SignalRule)>,
    index: HashMap<String, usize>,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a threshold rule on indicator `name`.
    pub fn register_threshold(
        &mut self,
        name: &str,
        params: ThresholdParams<'_>,
    ) -> Result<(), SignalbookError> {
        let rule = build_threshold(name, &params)?;
        self.insert(name.to_string(), SignalRule::Threshold(rule));
        Ok(())
    }

    /// Register (or replace) a comparison rule. Returns the derived key.
    pub fn register_comparison(
        &mut self,
        indicator_a: &str,
        indicator_b: &str,
        buy_operator: &str,
        sell_operator: &str,
    ) -> Result<String, SignalbookError> {
        require_name(indicator_a, "indicator_a")?;
        require_name(indicator_b, "indicator_b")?;
        let rule = ComparisonRule {
            indicator_a: indicator_a.to_string(),
            indicator_b: indicator_b.to_string(),
            buy_operator: buy_operator.parse()?,
            sell_operator: sell_operator.parse()?,
        };
        let key = rule.key();
        self.insert(key.clone(), SignalRule::Comparison(rule));
        Ok(key)
    }

    /// Register an already-typed rule under its natural key.
    pub fn register_rule(&mut self, rule: SignalRule) -> Result<String, SignalbookError> {
        let key = match &rule {
            SignalRule::Threshold(t) => {
                require_name(&t.indicator_name, "indicator_name")?;
                require_finite(t.buy, "buy")?;
                require_finite(t.sell, "sell")?;
                if let Some(guard) = &t.buy_max {
                    require_finite(guard.cutoff, "buy_max")?;
                }
                if let Some(guard) = &t.sell_max {
                    require_finite(guard.cutoff, "sell_max")?;
                }
                t.indicator_name.clone()
            }
            SignalRule::Comparison(c) => {
                require_name(&c.indicator_a, "indicator_a")?;
                require_name(&c.indicator_b, "indicator_b")?;
                c.key()
            }
        };
        self.insert(key.clone(), rule);
        Ok(key)
    }

    pub fn get(&self, key: &str) -> Option<&SignalRule> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// A single rule when `name` is given, the whole registry otherwise.
    /// Returns `None` when a named rule was never registered.
    pub fn get_signal(&self, name: Option<&str>) -> Option<SignalLookup<'_>> {
        match name {
            Some(key) => self.get(key).map(SignalLookup::One),
            None => Some(SignalLookup::All(self.list_all().collect())),
        }
    }

    pub fn list_all(&self) -> impl Iterator<Item = (&str, &SignalRule)> + '_ {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }

    /// Rules in registration order, borrowed.
    pub fn entries(&self) -> &[(String, SignalRule)] {
        &self.entries
    }

    /// Owned copy of the rule list, for evaluation without holding the registry.
    pub fn snapshot_rules(&self) -> Vec<(String, SignalRule)> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            rules: self.entries.iter().map(|(_, r)| r.clone()).collect(),
        }
    }

    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Result<Self, SignalbookError> {
        let mut registry = Self::new();
        for rule in snapshot.rules {
            registry.register_rule(rule)?;
        }
        Ok(registry)
    }

    pub fn to_json(&self) -> Result<String, SignalbookError> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    pub fn from_json(json: &str) -> Result<Self, SignalbookError> {
        let snapshot: RegistrySnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    fn insert(&mut self, key: String, rule: SignalRule) {
        match self.index.get(&key) {
            Some(&i) => {
                debug!(key = %key, kind = rule.kind(), "overwriting signal rule");
                self.entries[i].1 = rule;
            }
            None => {
                debug!(key = %key, kind = rule.kind(), "registering signal rule");
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, rule));
            }
        }
    }
}

fn build_threshold(
    name: &str,
    params: &ThresholdParams<'_>,
) -> Result<ThresholdRule, SignalbookError> {
    require_name(name, "indicator name")?;
    require_finite(params.buy, "buy")?;
    require_finite(params.sell, "sell")?;

    let buy_operator: RelOp = params.buy_operator.parse()?;
    let sell_operator: RelOp = params.sell_operator.parse()?;
    let buy_max = build_guard(name, "buy_max", params.buy_max, params.buy_max_operator)?;
    let sell_max = build_guard(name, "sell_max", params.sell_max, params.sell_max_operator)?;

    Ok(ThresholdRule {
        indicator_name: name.to_string(),
        buy: params.buy,
        sell: params.sell,
        buy_operator,
        sell_operator,
        buy_max,
        sell_max,
    })
}

fn build_guard(
    name: &str,
    field: &str,
    cutoff: Option<f64>,
    operator: Option<&str>,
) -> Result<Option<MaxGuard>, SignalbookError> {
    match (cutoff, operator) {
        (Some(cutoff), Some(token)) => {
            require_finite(cutoff, field)?;
            Ok(Some(MaxGuard {
                cutoff,
                operator: token.parse()?,
            }))
        }
        (Some(_), None) => Err(SignalbookError::invalid_config(format!(
            "{field} set without {field}_operator on '{name}'"
        ))),
        (None, Some(token)) => {
            // Still reject garbage tokens; a lone operator simply has nothing to guard.
            token.parse::<RelOp>()?;
            warn!(rule = %name, field, "max operator given without a cutoff; ignoring");
            Ok(None)
        }
        (None, None) => Ok(None),
    }
}

fn require_name(value: &str, what: &str) -> Result<(), SignalbookError> {
    if value.trim().is_empty() {
        return Err(SignalbookError::invalid_config(format!("{what} must not be empty")));
    }
    Ok(())
}

fn require_finite(value: f64, what: &str) -> Result<(), SignalbookError> {
    if !value.is_finite() {
        return Err(SignalbookError::invalid_config(format!(
            "{what} must be a finite number, got {value}"
        )));
    }
    Ok(())
}
