// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Step Contract
//!
//! This module defines the capability trait implemented by user work units.
//! A step is the only extension point of the engine: everything the pipeline
//! executes is an implementation of [`PipelineStep`].
//!
//! ## Contract
//!
//! The engine guarantees to every step:
//!
//! - `run` is invoked exactly once per plan position (no retry)
//! - `context.current_step_id()` equals `step_id()` at entry
//! - for parallel groups, the passed context is an isolated copy sharing
//!   only the progress tracker with its siblings
//!
//! The engine expects from every step:
//!
//! - a stable, non-empty `step_id`, unique within the plan
//! - a non-empty, human-readable `description`
//! - progress reports through [`TaskContext::update_step_progress`] stay in
//!   `[0, 100]` (out-of-range values are clamped)
//!
//! [`TaskContext::update_step_progress`]: crate::core::context::TaskContext::update_step_progress

use std::time::Duration;

use async_trait::async_trait;

use crate::core::context::TaskContext;
use crate::error::PipelineError;

/// A user-defined unit of work executed by the pipeline.
///
/// Implementations mutate the context's result mapping and error sequence,
/// and may report intra-step progress at any granularity. A step that cannot
/// complete returns an error; whether that error stops the pipeline is
/// decided by [`critical`](Self::critical) and the pipeline's failure
/// policy.
///
/// Steps enter plans as `Arc<dyn PipelineStep<C>>` and must therefore be
/// thread-safe: parallel groups move them onto worker tasks.
#[async_trait]
pub trait PipelineStep<C>: Send + Sync {
    /// Stable identity of this step, unique within a single plan. Must be
    /// non-empty; validated at pipeline construction.
    fn step_id(&self) -> &str;

    /// Human-readable description of what this step does. Must be
    /// non-empty.
    fn description(&self) -> &str;

    /// Performs the work against the context.
    ///
    /// The step may mutate results and errors, and may call
    /// `context.update_step_progress` any number of times. When `run`
    /// returns an error, the executor discards the step's context mutations
    /// and records the failure; see
    /// [`TaskExecutor`](crate::executors::TaskExecutor).
    async fn run(&self, context: &mut TaskContext<C>) -> Result<(), PipelineError>;

    /// Whether a failure of this step propagates to the plan walk.
    ///
    /// Non-critical failures are captured into the context's error sequence
    /// and swallowed; the walk continues regardless of the pipeline's
    /// failure policy.
    fn critical(&self) -> bool {
        true
    }

    /// Advisory per-step deadline. Declared for planning and display
    /// purposes; the executors do not enforce it.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Advisory retry budget. Declared for planning and display purposes;
    /// the executors invoke `run` exactly once per plan position.
    fn retries(&self) -> u32 {
        0
    }
}
