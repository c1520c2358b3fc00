// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Context Merger
//!
//! Reconciles the divergent context copies a parallel group produces back
//! into a single context. Each branch started from the same pre-fork
//! original; the merger extracts what each branch *contributed* relative to
//! that original and folds the contributions together, in branch completion
//! order.
//!
//! ## Default Merge Rules
//!
//! Result values are [`serde_json::Value`]; by default the applicable rule
//! is chosen from the incoming value's type:
//!
//! | Incoming value | Rule |
//! |----------------|------|
//! | sequence | items beyond the original's length are the branch's contribution and are appended; an original that exists but is not a sequence is replaced |
//! | number (same numeric category as the original: integer with integer, real with real) | the positive difference against the original is added; zero or negative differences are ignored |
//! | mapping | shallow key-wise update into the merged mapping; nested mappings are overwritten, not recursed |
//! | anything else | replace; among concurrent writers the last completion wins |
//!
//! These defaults correspond to the three common concurrent aggregation
//! patterns: accumulating lists of produced items, summing counters of work
//! done, and populating disjoint fields of a shared mapping.
//!
//! ## Per-Key Overrides
//!
//! A [`MergeStrategy`] can be pinned per result key to force one rule
//! regardless of value types, for keys whose aggregation the application
//! knows better than type dispatch does.
//!
//! ## Errors
//!
//! Each branch contributes the suffix of its error sequence beyond the
//! original's length; suffixes are appended in completion order.

use std::collections::HashMap;

use serde_json::{Number, Value};

use crate::core::context::TaskContext;

/// Reconciliation rule applied to one result key during a parallel join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Choose the rule from the incoming value's type (the default).
    Auto,
    /// Last completed writer wins.
    Replace,
    /// Force the sequence rule.
    Append,
    /// Force the numeric increment rule.
    Accumulate,
    /// Force the shallow mapping update rule.
    Update,
}

/// Merges the result mappings and error sequences of parallel branch
/// contexts back into the pre-fork original.
#[derive(Debug, Clone, Default)]
pub struct ContextMerger {
    strategies: HashMap<String, MergeStrategy>,
}

impl ContextMerger {
    /// Creates a merger using type-directed rules for every key
    pub fn new() -> Self {
        ContextMerger::default()
    }

    /// Pins the merge rule for a specific result key
    pub fn with_strategy(mut self, key: impl Into<String>, strategy: MergeStrategy) -> Self {
        self.strategies.insert(key.into(), strategy);
        self
    }

    /// Merges branch contexts into a copy of the pre-fork original.
    ///
    /// Branches must be supplied in completion order; the replace rule is
    /// sensitive to it. The returned context shares the original's progress
    /// tracker handle.
    pub fn merge<C>(&self, original: &TaskContext<C>, branches: Vec<TaskContext<C>>) -> TaskContext<C>
    where
        C: Clone,
    {
        let mut merged = original.clone();
        let base_error_count = original.errors().len();

        for branch in &branches {
            for (key, incoming) in branch.results() {
                let strategy = self.strategies.get(key).copied().unwrap_or(MergeStrategy::Auto);
                let next = merge_value(
                    strategy,
                    original.results().get(key),
                    merged.results().get(key),
                    incoming,
                );
                if let Some(next) = next {
                    merged.results_mut().insert(key.clone(), next);
                }
            }

            for error in branch.errors().iter().skip(base_error_count) {
                merged.record_error(error.clone());
            }
        }

        merged
    }
}

/// Applies one merge rule to a single key.
///
/// `base` is the original's value, `current` the merged value so far,
/// `incoming` the branch's value. Returns `None` when the merged value
/// should be left untouched (a numeric contribution of zero or less).
fn merge_value(
    strategy: MergeStrategy,
    base: Option<&Value>,
    current: Option<&Value>,
    incoming: &Value,
) -> Option<Value> {
    match strategy {
        MergeStrategy::Auto => match incoming {
            Value::Array(_) => Some(merge_sequence(base, current, incoming)),
            Value::Number(_) => merge_numeric(base, current, incoming),
            Value::Object(_) => Some(merge_mapping(base, current, incoming)),
            _ => Some(incoming.clone()),
        },
        MergeStrategy::Replace => Some(incoming.clone()),
        MergeStrategy::Append => Some(merge_sequence(base, current, incoming)),
        MergeStrategy::Accumulate => merge_numeric(base, current, incoming),
        MergeStrategy::Update => Some(merge_mapping(base, current, incoming)),
    }
}

/// Sequence rule: the items beyond the original's length are the branch's
/// contribution; they are appended to the merged sequence, which starts
/// from the original's items. A missing original counts as empty, so the
/// whole incoming sequence is the contribution; a non-sequence original is
/// replaced.
fn merge_sequence(base: Option<&Value>, current: Option<&Value>, incoming: &Value) -> Value {
    let incoming_items = match incoming {
        Value::Array(items) => items,
        _ => return incoming.clone(),
    };
    let base_items: &[Value] = match base {
        Some(Value::Array(items)) => items,
        None => &[],
        Some(_) => return incoming.clone(),
    };

    let contribution = incoming_items.get(base_items.len()..).unwrap_or(&[]);
    let mut target = match current {
        Some(Value::Array(items)) => items.clone(),
        _ => base_items.to_vec(),
    };
    target.extend(contribution.iter().cloned());
    Value::Array(target)
}

/// Numeric rule: when the original exists and shares the incoming value's
/// numeric category, the positive difference is the branch's contribution
/// and is added to the merged value. Zero or negative contributions leave
/// the merged value untouched. A missing or category-mismatched original
/// falls back to replacement.
fn merge_numeric(base: Option<&Value>, current: Option<&Value>, incoming: &Value) -> Option<Value> {
    match (incoming, base) {
        (Value::Number(new), Some(Value::Number(orig))) if same_category(orig, new) => {
            accumulate(orig, current, new)
        }
        _ => Some(incoming.clone()),
    }
}

/// Mapping rule: shallow key-wise update into the merged mapping,
/// initialized from the original mapping when present. Nested mappings are
/// overwritten wholesale.
fn merge_mapping(base: Option<&Value>, current: Option<&Value>, incoming: &Value) -> Value {
    let incoming_map = match incoming {
        Value::Object(map) => map,
        _ => return incoming.clone(),
    };

    let mut target = match current {
        Some(Value::Object(map)) => map.clone(),
        _ => match base {
            Some(Value::Object(map)) => map.clone(),
            _ => serde_json::Map::new(),
        },
    };
    for (key, value) in incoming_map {
        target.insert(key.clone(), value.clone());
    }
    Value::Object(target)
}

/// Integers merge with integers and reals with reals; mixing categories
/// disables the increment rule.
fn same_category(a: &Number, b: &Number) -> bool {
    let a_integer = a.is_i64() || a.is_u64();
    let b_integer = b.is_i64() || b.is_u64();
    a_integer == b_integer
}

fn accumulate(orig: &Number, current: Option<&Value>, incoming: &Number) -> Option<Value> {
    if let (Some(orig_i), Some(new_i)) = (orig.as_i64(), incoming.as_i64()) {
        let increment = new_i.saturating_sub(orig_i);
        if increment <= 0 {
            return None;
        }
        let running = match current {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(orig_i),
            _ => orig_i,
        };
        return Some(Value::from(running.saturating_add(increment)));
    }

    // Integer values outside the i64 range and reals both merge in f64.
    let orig_f = orig.as_f64().unwrap_or(0.0);
    let new_f = incoming.as_f64().unwrap_or(0.0);
    let increment = new_f - orig_f;
    if increment <= 0.0 {
        return None;
    }
    let running = match current {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(orig_f),
        _ => orig_f,
    };
    Some(Value::from(running + increment))
}
