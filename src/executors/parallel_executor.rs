// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Parallel Executor
//!
//! Runs a group of steps concurrently on isolated context copies and joins
//! their outcomes under a configurable success policy.
//!
//! ## Execution Model
//!
//! Every group member receives its own copy of the pre-fork context; the
//! only state shared between siblings is the progress tracker handle. A
//! member observes the pre-fork results at start and cannot see sibling
//! mutations; divergence is reconciled by the [`ContextMerger`] after the
//! join, in completion order.
//!
//! Workers are detached Tokio tasks, optionally gated by a semaphore when
//! `max_workers` bounds the group. Outcomes are collected over a channel as
//! they complete.
//!
//! ## Join Policy
//!
//! - `And`: the group succeeds iff every outcome is a success
//! - `Or`: the group succeeds if at least one outcome is a success
//!
//! A non-critical step failure is swallowed by the task executor inside the
//! worker, so it counts as a success at the join; only critical failures
//! participate in the policy.
//!
//! ## Deadline
//!
//! The optional group deadline is enforced at the join: when it elapses
//! before every worker has reported, the group fails with a timeout.
//! Unfinished workers are *abandoned*, not cancelled; they run to
//! completion on the runtime and their outcomes are discarded along with
//! their context copies.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;
use tracing::{debug, warn, Instrument};

use crate::core::config::{LogicOperator, ParallelConfig};
use crate::core::context::TaskContext;
use crate::core::step::PipelineStep;
use crate::error::PipelineError;
use crate::executors::context_merger::ContextMerger;
use crate::executors::task_executor::TaskExecutor;

/// Outcome of one branch, reported over the collection channel.
struct BranchOutcome<C> {
    step_id: String,
    context: TaskContext<C>,
    result: Result<(), PipelineError>,
}

/// Executes parallel step groups with configurable join logic and context
/// merging.
#[derive(Debug, Clone, Default)]
pub struct ParallelExecutor {
    task_executor: TaskExecutor,
    merger: ContextMerger,
}

impl ParallelExecutor {
    /// Creates a parallel executor with type-directed merge rules
    pub fn new() -> Self {
        ParallelExecutor::default()
    }

    /// Replaces the context merger, e.g. to install per-key merge
    /// strategies
    pub fn with_merger(mut self, merger: ContextMerger) -> Self {
        self.merger = merger;
        self
    }

    /// Runs a group of steps concurrently and merges the surviving
    /// contexts.
    ///
    /// On group success the caller's context is replaced by the merged
    /// context; failures captured by branches that did not participate in
    /// the merge (an `Or` join tolerates them) are re-recorded so they are
    /// not lost with the discarded copies. On group failure the group error
    /// is recorded on the caller's context and returned.
    pub async fn execute<C>(
        &self,
        steps: &[Arc<dyn PipelineStep<C>>],
        context: &mut TaskContext<C>,
        config: &ParallelConfig,
        group: &str,
    ) -> Result<(), PipelineError>
    where
        C: Clone + Send + Sync + 'static,
    {
        if steps.is_empty() {
            return Ok(());
        }

        let original = context.clone();
        let deadline = config.timeout.map(|limit| Instant::now() + limit);
        let gate = config.max_workers.map(|count| Arc::new(Semaphore::new(count.max(1))));
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<BranchOutcome<C>>(steps.len());

        debug!(
            group,
            steps = steps.len(),
            operator = ?config.operator,
            max_workers = config.max_workers,
            "dispatching parallel group"
        );

        for step in steps {
            let mut branch = original.clone();
            branch.begin_step(step.step_id());

            let step = Arc::clone(step);
            let task_executor = self.task_executor;
            let gate = gate.clone();
            let outcomes = outcome_tx.clone();
            let span = branch.span().clone();

            tokio::spawn(
                async move {
                    let _permit = match gate {
                        Some(semaphore) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };
                    let result = task_executor.execute(step.as_ref(), &mut branch).await;
                    let _ = outcomes
                        .send(BranchOutcome {
                            step_id: step.step_id().to_string(),
                            context: branch,
                            result,
                        })
                        .await;
                }
                .instrument(span),
            );
        }
        drop(outcome_tx);

        let mut completed: Vec<TaskContext<C>> = Vec::with_capacity(steps.len());
        let mut failures: Vec<PipelineError> = Vec::new();

        while completed.len() + failures.len() < steps.len() {
            let received = match deadline {
                Some(at) => match tokio::time::timeout_at(at, outcome_rx.recv()).await {
                    Ok(message) => message,
                    Err(_) => {
                        let limit = config.timeout.unwrap_or_default();
                        let timeout = PipelineError::group_timeout(group, limit);
                        warn!(group, error = %timeout, "group deadline elapsed, abandoning unfinished workers");
                        context.record_error(timeout.clone());
                        return Err(timeout);
                    }
                },
                None => outcome_rx.recv().await,
            };

            match received {
                Some(outcome) => match outcome.result {
                    Ok(()) => completed.push(outcome.context),
                    Err(error) => {
                        debug!(group, step_id = %outcome.step_id, "parallel step failed");
                        failures.push(error);
                    }
                },
                None => {
                    // A worker died without reporting (panic). The channel is
                    // closed, so every missing outcome is lost.
                    let observed = completed.len() + failures.len();
                    for _ in observed..steps.len() {
                        failures.push(PipelineError::internal_error(format!(
                            "worker in '{}' terminated before reporting an outcome",
                            group
                        )));
                    }
                    break;
                }
            }
        }

        let succeeded = match config.operator {
            LogicOperator::And => failures.is_empty(),
            LogicOperator::Or => !completed.is_empty(),
        };

        if !succeeded {
            let failure = PipelineError::group_failed(group, failures);
            warn!(group, error = %failure, "parallel group failed");
            context.record_error(failure.clone());
            return Err(failure);
        }

        let mut merged = self.merger.merge(&original, completed);
        // An Or join can succeed with failed branches; their captured
        // failures would otherwise vanish with the discarded copies.
        for failure in failures {
            merged.record_error(failure);
        }
        *context = merged;

        debug!(group, "parallel group merged");
        Ok(())
    }
}
