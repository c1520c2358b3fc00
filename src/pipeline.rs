// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Orchestrator
//!
//! The `Pipeline` walks a validated plan position by position: serial steps
//! are dispatched to the [`TaskExecutor`], parallel groups to the
//! [`ParallelExecutor`]. After every successfully processed position the
//! pipeline force-completes the position's step(s) to 100% on the shared
//! progress tracker and notifies the installed observer, so overall
//! progress is deterministic for a successful walk even when steps never
//! self-report.
//!
//! ## Failure Policy
//!
//! A propagated failure (a critical step failure or a group failure) either
//! terminates the walk (`fail_fast`, the default) or is accumulated on the
//! context while the walk continues. Executors record every captured
//! failure on the context before it reaches the pipeline, so the policy
//! switch only decides between re-raising and continuing; it never changes
//! what lands in the context's error sequence.
//!
//! ## Live Status
//!
//! The pipeline may be shared across tasks (behind an `Arc`) while `run`
//! executes; [`status`](Pipeline::status), [`is_running`](Pipeline::is_running)
//! and [`current_step`](Pipeline::current_step) are safe from any thread.
//! Running-state and position are atomic reads; tracker reads return copied
//! snapshots.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::config::PipelineConfig;
use crate::core::context::TaskContext;
use crate::core::plan::{validate_plan, Plan, PlanEntry};
use crate::core::progress::{ProgressTracker, StepProgress};
use crate::core::step::PipelineStep;
use crate::error::PipelineError;
use crate::executors::parallel_executor::ParallelExecutor;
use crate::executors::task_executor::TaskExecutor;

/// Callback invoked after each successfully processed plan position with
/// `(position index, plan length, step or group name, overall percent)`.
pub type ProgressObserver = dyn Fn(usize, usize, &str, f64) + Send + Sync;

/// Sentinel for "no position executing".
const IDLE: usize = usize::MAX;

/// Snapshot of a pipeline's live execution state.
#[derive(Debug, Clone)]
pub struct PipelineStatus {
    /// Overall progress in `[0, 100]`.
    pub overall_progress: f64,
    /// Name of the position currently executing (step id or
    /// `parallel_group_<i>`), `None` when idle or done.
    pub current_step: Option<String>,
    /// Whether `run` is executing right now.
    pub is_running: bool,
    /// Copied per-step progress details.
    pub step_details: HashMap<String, StepProgress>,
}

/// Top-level pipeline orchestrator.
///
/// Owns the validated plan, the execution configuration, the shared
/// progress tracker, and the optional progress observer. A pipeline is
/// reusable: `run` may be called repeatedly with fresh contexts, and the
/// instance may be queried for live status from other threads while a run
/// is in flight.
pub struct Pipeline<C> {
    plan: Plan<C>,
    config: PipelineConfig,
    observer: Option<Box<ProgressObserver>>,
    task_executor: TaskExecutor,
    parallel_executor: ParallelExecutor,
    progress_tracker: Arc<ProgressTracker>,
    running: AtomicBool,
    current_entry: AtomicUsize,
}

impl<C> Pipeline<C>
where
    C: Clone + Send + Sync + 'static,
{
    /// Creates a pipeline with the default configuration
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidPlan`] when the plan violates a
    /// structural invariant (empty or duplicate step ids, empty
    /// descriptions).
    pub fn new(plan: Plan<C>) -> Result<Self, PipelineError> {
        Self::with_config(plan, PipelineConfig::default())
    }

    /// Creates a pipeline with an explicit configuration
    pub fn with_config(plan: Plan<C>, config: PipelineConfig) -> Result<Self, PipelineError> {
        validate_plan(&plan)?;
        let progress_tracker = Arc::new(ProgressTracker::new(&plan));

        Ok(Pipeline {
            plan,
            config,
            observer: None,
            task_executor: TaskExecutor::new(),
            parallel_executor: ParallelExecutor::new(),
            progress_tracker,
            running: AtomicBool::new(false),
            current_entry: AtomicUsize::new(IDLE),
        })
    }

    /// Installs a progress observer
    ///
    /// The observer is invoked on the controlling task, exactly once after
    /// each successfully processed plan position; it should not block for
    /// long.
    pub fn with_observer(mut self, observer: impl Fn(usize, usize, &str, f64) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Replaces the parallel executor, e.g. to install per-key merge
    /// strategies
    pub fn with_parallel_executor(mut self, executor: ParallelExecutor) -> Self {
        self.parallel_executor = executor;
        self
    }

    /// Executes the plan against the context.
    ///
    /// The context is mutated in place: results of successful steps and
    /// every captured failure are observable on it afterwards, whether or
    /// not `run` returns an error. An empty plan returns immediately
    /// without touching the context or the observer.
    ///
    /// # Errors
    ///
    /// Under `fail_fast` (the default), the first propagated failure (a
    /// critical step failure or a parallel group failure) terminates the
    /// walk and is returned; a matching entry is already present in the
    /// context's error sequence. With `fail_fast` disabled, failures are
    /// accumulated and `run` returns `Ok`.
    pub async fn run(&self, context: &mut TaskContext<C>) -> Result<(), PipelineError> {
        self.running.store(true, Ordering::SeqCst);
        context.attach_tracker(Arc::clone(&self.progress_tracker));
        info!(positions = self.plan.len(), "pipeline started");

        let outcome = self.walk_plan(context).await;

        self.current_entry.store(IDLE, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);

        match &outcome {
            Ok(()) => info!("pipeline completed"),
            Err(error) => warn!(%error, "pipeline terminated"),
        }
        outcome
    }

    async fn walk_plan(&self, context: &mut TaskContext<C>) -> Result<(), PipelineError> {
        for (index, entry) in self.plan.iter().enumerate() {
            self.current_entry.store(index, Ordering::SeqCst);
            let name = entry.display_name(index);

            let result = match entry {
                PlanEntry::Serial(step) => self.task_executor.execute(step.as_ref(), context).await,
                PlanEntry::Parallel(steps) => {
                    self.parallel_executor
                        .execute(steps, context, &self.config.parallel, &name)
                        .await
                }
            };

            match result {
                Ok(()) => {
                    // Force-complete the position so overall progress is
                    // deterministic even for steps that never self-report.
                    for step in entry.steps() {
                        self.progress_tracker.update_step_progress(step.step_id(), 100.0);
                    }
                    if let Some(observer) = &self.observer {
                        observer(index, self.plan.len(), &name, self.progress_tracker.overall_progress());
                    }
                }
                Err(error) => {
                    if self.config.fail_fast {
                        return Err(error);
                    }
                    debug!(position = index, %error, "position failed, continuing");
                }
            }
        }

        Ok(())
    }

    /// Returns a snapshot of the pipeline's live state
    ///
    /// Safe to call from any thread while `run` executes on another.
    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            overall_progress: self.progress_tracker.overall_progress(),
            current_step: self.current_step(),
            is_running: self.is_running(),
            step_details: self.progress_tracker.step_details(),
        }
    }

    /// Checks whether `run` is executing right now
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Gets the name of the position currently executing
    ///
    /// Serial positions report their step id, groups their synthesized
    /// `parallel_group_<i>` name. `None` when idle or done.
    pub fn current_step(&self) -> Option<String> {
        let index = self.current_entry.load(Ordering::SeqCst);
        if index == IDLE {
            return None;
        }
        self.plan.get(index).map(|entry| entry.display_name(index))
    }

    /// Gets the plan this pipeline executes
    pub fn plan(&self) -> &Plan<C> {
        &self.plan
    }

    /// Gets the execution configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Gets the shared progress tracker
    ///
    /// The same instance is installed on every context copy of a run.
    pub fn progress_tracker(&self) -> &Arc<ProgressTracker> {
        &self.progress_tracker
    }
}

impl<C> fmt::Debug for Pipeline<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("plan", &self.plan)
            .field("config", &self.config)
            .field("is_running", &self.running.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
