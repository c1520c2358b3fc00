// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Task Executor
//!
//! Runs a single pipeline step with failure routing. The executor is the
//! layer that turns a step's error into the configured outcome: captured
//! and swallowed for non-critical steps, captured and propagated for
//! critical ones.
//!
//! ## Failure Semantics
//!
//! The context is checkpointed before the step runs. When the step fails,
//! the checkpoint is restored, so half-written result mutations never
//! survive a failed step; the captured failure is then appended to the
//! restored context's error sequence. A successful step's mutations are
//! kept as-is.

use tracing::{debug, warn, Instrument};

use crate::core::context::TaskContext;
use crate::core::step::PipelineStep;
use crate::error::PipelineError;

/// Executes individual pipeline steps with criticality-based failure
/// routing.
///
/// Stateless; a single instance serves both the serial plan walk and every
/// parallel worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskExecutor;

impl TaskExecutor {
    /// Creates a task executor
    pub fn new() -> Self {
        TaskExecutor
    }

    /// Runs a single step against the context.
    ///
    /// On success the step's context mutations are kept. On failure the
    /// context is restored to its pre-step state, the failure is recorded as
    /// a [`PipelineError::StepFailed`] carrying the step's id, and the
    /// failure is returned iff the step is critical.
    pub async fn execute<C>(
        &self,
        step: &dyn PipelineStep<C>,
        context: &mut TaskContext<C>,
    ) -> Result<(), PipelineError>
    where
        C: Clone + Send,
    {
        context.begin_step(step.step_id());
        let checkpoint = context.clone();
        let span = context.span().clone();

        debug!(step_id = %step.step_id(), description = %step.description(), "executing step");

        match step.run(context).instrument(span).await {
            Ok(()) => Ok(()),
            Err(source) => {
                let failure = PipelineError::step_failed(step.step_id(), source.to_string());
                *context = checkpoint;
                context.record_error(failure.clone());

                if step.critical() {
                    warn!(step_id = %step.step_id(), error = %failure, "critical step failed");
                    Err(failure)
                } else {
                    warn!(step_id = %step.step_id(), error = %failure, "non-critical step failed, continuing");
                    Ok(())
                }
            }
        }
    }
}
