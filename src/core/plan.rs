// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Plan
//!
//! A plan is the ordered sequence of positions a pipeline walks: each
//! position is either a single serial step or a group of steps joined
//! concurrently. Nested groups are unrepresentable; a group holds steps
//! only.
//!
//! Plan invariants (non-empty, unique step ids; non-empty descriptions) are
//! validated once at pipeline construction so that a malformed plan can
//! never reach `run`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::core::step::PipelineStep;
use crate::error::PipelineError;

/// A single position in a pipeline plan.
pub enum PlanEntry<C> {
    /// A step executed on the controlling task, in plan order.
    Serial(Arc<dyn PipelineStep<C>>),
    /// Steps executed concurrently on isolated context copies and joined
    /// under the configured success policy.
    Parallel(Vec<Arc<dyn PipelineStep<C>>>),
}

/// An ordered sequence of plan entries.
pub type Plan<C> = Vec<PlanEntry<C>>;

impl<C> PlanEntry<C> {
    /// Wraps a step as a serial plan entry
    pub fn serial(step: impl PipelineStep<C> + 'static) -> Self {
        PlanEntry::Serial(Arc::new(step))
    }

    /// Wraps a sequence of steps as a parallel group entry
    pub fn parallel<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn PipelineStep<C>>>,
    {
        PlanEntry::Parallel(steps.into_iter().collect())
    }

    /// Iterates the steps at this entry, in declaration order
    ///
    /// A serial entry yields its single step; a group yields its members.
    pub fn steps(&self) -> std::slice::Iter<'_, Arc<dyn PipelineStep<C>>> {
        match self {
            PlanEntry::Serial(step) => std::slice::from_ref(step).iter(),
            PlanEntry::Parallel(steps) => steps.iter(),
        }
    }

    /// Display name of this entry for observer callbacks and status
    /// reporting
    ///
    /// Serial entries report their step id; groups report a synthesized
    /// `parallel_group_<index>` name.
    pub fn display_name(&self, index: usize) -> String {
        match self {
            PlanEntry::Serial(step) => step.step_id().to_string(),
            PlanEntry::Parallel(_) => format!("parallel_group_{}", index),
        }
    }
}

impl<C> Clone for PlanEntry<C> {
    fn clone(&self) -> Self {
        match self {
            PlanEntry::Serial(step) => PlanEntry::Serial(Arc::clone(step)),
            PlanEntry::Parallel(steps) => PlanEntry::Parallel(steps.iter().map(Arc::clone).collect()),
        }
    }
}

impl<C> fmt::Debug for PlanEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanEntry::Serial(step) => f.debug_tuple("Serial").field(&step.step_id()).finish(),
            PlanEntry::Parallel(steps) => {
                let ids: Vec<&str> = steps.iter().map(|step| step.step_id()).collect();
                f.debug_tuple("Parallel").field(&ids).finish()
            }
        }
    }
}

/// Validates the structural invariants of a plan.
///
/// Checks that every step id is non-empty and unique across the whole plan,
/// and that every description is non-empty. The progress weight table
/// depends on distinct step ids, so a malformed plan is rejected before a
/// pipeline can be constructed from it.
pub(crate) fn validate_plan<C>(plan: &[PlanEntry<C>]) -> Result<(), PipelineError> {
    let mut seen: HashSet<&str> = HashSet::new();

    for (index, entry) in plan.iter().enumerate() {
        for step in entry.steps() {
            let step_id = step.step_id();
            if step_id.is_empty() {
                return Err(PipelineError::invalid_plan(format!(
                    "step at plan entry {} has an empty step id",
                    index
                )));
            }
            if step.description().is_empty() {
                return Err(PipelineError::invalid_plan(format!(
                    "step '{}' has an empty description",
                    step_id
                )));
            }
            if !seen.insert(step_id) {
                return Err(PipelineError::invalid_plan(format!("duplicate step id '{}'", step_id)));
            }
        }
    }

    Ok(())
}
