// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Error Types
//!
//! This module provides the error enum for the task pipeline engine. It
//! covers the two moments a pipeline can fail: while a plan is being
//! validated at construction, and while a plan is being executed.
//!
//! ## Overview
//!
//! The error system follows these principles:
//!
//! - **Specific**: Each variant represents a distinct failure mode with its
//!   origin (step id, group name) attached
//! - **Cloneable**: Every failure is recorded in the context's error sequence
//!   *and* propagated to the caller, so errors must be cheap to duplicate
//! - **Composable**: A parallel group failure aggregates the underlying
//!   per-step failures it was joined from
//!
//! ## Error Categories
//!
//! - **Plan errors**: structural invariant violations detected before `run`
//!   is callable (duplicate or empty step ids, empty descriptions)
//! - **Step errors**: a user step's `run` returned an error
//! - **Parallel errors**: a group's success policy was not met, or the group
//!   deadline elapsed before all workers reported
//! - **Internal errors**: abnormal worker termination (a panic or a lost
//!   outcome channel)

use std::time::Duration;

use thiserror::Error;

/// Errors raised while constructing or executing a task pipeline.
///
/// Each variant carries enough context to locate the failure: step failures
/// name the originating step, group failures name the group and aggregate the
/// per-step failures that caused the join to fail.
///
/// ## Design Principles
///
/// - **Specific**: Each error type represents a specific failure mode
/// - **Actionable**: Error messages provide enough context for debugging
/// - **Categorized**: Errors are grouped by type for systematic handling
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The plan violates a structural invariant. Raised at pipeline
    /// construction, never during `run`.
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    /// A step's `run` returned an error. Carries the originating step id and
    /// the underlying failure message.
    #[error("Step '{step_id}' failed: {message}")]
    StepFailed {
        /// Identity of the step that failed.
        step_id: String,
        /// Rendered message of the underlying failure.
        message: String,
    },

    /// A parallel group did not satisfy its success policy at the join.
    #[error("Parallel group '{group}' failed: {} step failure(s)", .failures.len())]
    GroupFailed {
        /// Synthesized group name (`parallel_group_<index>`).
        group: String,
        /// Per-step failures collected in completion order.
        failures: Vec<PipelineError>,
    },

    /// A parallel group's deadline elapsed before every worker reported an
    /// outcome. Unfinished workers are abandoned, not cancelled.
    #[error("Parallel group '{group}' timed out after {limit_ms} ms")]
    GroupTimeout {
        /// Synthesized group name (`parallel_group_<index>`).
        group: String,
        /// Configured group deadline in milliseconds.
        limit_ms: u64,
    },

    /// Abnormal execution failure that is not attributable to a step's own
    /// error path, such as a panicked worker.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Creates a new plan invariant violation error
    pub fn invalid_plan(msg: impl Into<String>) -> Self {
        Self::InvalidPlan(msg.into())
    }

    /// Creates a new step failure carrying the originating step id
    pub fn step_failed(step_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StepFailed {
            step_id: step_id.into(),
            message: message.into(),
        }
    }

    /// Creates a new group failure from the per-step failures collected at
    /// the join
    pub fn group_failed(group: impl Into<String>, failures: Vec<PipelineError>) -> Self {
        Self::GroupFailed {
            group: group.into(),
            failures,
        }
    }

    /// Creates a new group timeout error for the given deadline
    pub fn group_timeout(group: impl Into<String>, limit: Duration) -> Self {
        Self::GroupTimeout {
            group: group.into(),
            limit_ms: limit.as_millis() as u64,
        }
    }

    /// Creates a new internal error
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Checks if the error is a parallel group failure (policy or deadline)
    pub fn is_group_failure(&self) -> bool {
        matches!(self, PipelineError::GroupFailed { .. } | PipelineError::GroupTimeout { .. })
    }

    /// Gets the id of the originating step, if this is a step failure
    pub fn step_id(&self) -> Option<&str> {
        match self {
            PipelineError::StepFailed { step_id, .. } => Some(step_id),
            _ => None,
        }
    }

    /// Gets the name of the originating group, if this is a group failure
    pub fn group(&self) -> Option<&str> {
        match self {
            PipelineError::GroupFailed { group, .. } | PipelineError::GroupTimeout { group, .. } => Some(group),
            _ => None,
        }
    }

    /// Gets the underlying per-step failures of a group failure
    ///
    /// Returns an empty slice for every other variant.
    pub fn group_failures(&self) -> &[PipelineError] {
        match self {
            PipelineError::GroupFailed { failures, .. } => failures,
            _ => &[],
        }
    }

    /// Gets the error category
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::InvalidPlan(_) => "plan",
            PipelineError::StepFailed { .. } => "step",
            PipelineError::GroupFailed { .. } => "parallel",
            PipelineError::GroupTimeout { .. } => "timeout",
            PipelineError::Internal(_) => "internal",
        }
    }
}
