// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Task Pipeline
//!
//! A generic task pipeline engine: a declarative plan of user-supplied work
//! units is executed against a shared typed context, with serial positions
//! and concurrently joined parallel groups, live weighted progress
//! reporting, error accumulation under a configurable failure policy, and
//! type-directed merging of divergent context mutations from concurrent
//! branches.
//!
//! ## Architecture
//!
//! The engine is organized in three layers:
//!
//! - **Core types** ([`core`]): the [`PipelineStep`] capability trait, the
//!   [`PlanEntry`] plan model, the generic [`TaskContext`], the execution
//!   [`PipelineConfig`], and the shared [`ProgressTracker`]
//! - **Executors** ([`executors`]): [`TaskExecutor`] for single steps,
//!   [`ParallelExecutor`] + [`ContextMerger`] for concurrent groups
//! - **Orchestration** ([`pipeline`]): the [`Pipeline`] that walks the
//!   plan, drives the tracker, and exposes live status
//!
//! ## Execution Model
//!
//! A plan is a flat, ordered sequence: each position is a single step or a
//! parallel group (nested groups are unrepresentable). Position `i + 1`
//! begins strictly after position `i` completes. Within a group, every step
//! runs on an isolated copy of the context; the only shared state is the
//! progress tracker, and divergent results are reconciled by the merger at
//! the join.
//!
//! ## Progress Model
//!
//! Every step owns a fixed share of the overall progress, assigned from the
//! plan's shape at construction. Steps may self-report fine-grained
//! progress through [`TaskContext::update_step_progress`]; whether they do
//! or not, the pipeline force-completes each position after it succeeds, so
//! a successful walk always ends at 100%.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use task_pipeline::{Pipeline, PipelineError, PipelineStep, PlanEntry, TaskContext};
//!
//! struct Record {
//!     key: &'static str,
//! }
//!
//! #[async_trait]
//! impl PipelineStep<()> for Record {
//!     fn step_id(&self) -> &str {
//!         self.key
//!     }
//!
//!     fn description(&self) -> &str {
//!         "records a marker"
//!     }
//!
//!     async fn run(&self, context: &mut TaskContext<()>) -> Result<(), PipelineError> {
//!         context.insert_result(self.key, true);
//!         context.update_step_progress(100.0);
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), PipelineError> {
//! let pipeline = Pipeline::new(vec![
//!     PlanEntry::serial(Record { key: "prepare" }),
//!     PlanEntry::parallel(vec![
//!         Arc::new(Record { key: "left" }) as Arc<dyn PipelineStep<()>>,
//!         Arc::new(Record { key: "right" }) as Arc<dyn PipelineStep<()>>,
//!     ]),
//! ])?;
//!
//! let mut context = TaskContext::new(());
//! pipeline.run(&mut context).await?;
//!
//! assert!(context.result("prepare").is_some());
//! assert!(context.result("left").is_some());
//! assert!((pipeline.status().overall_progress - 100.0).abs() < 1e-6);
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure Policy
//!
//! A step marked non-critical has its failure captured into the context's
//! error sequence and swallowed. Critical step failures and group failures
//! propagate to the plan walk, where `fail_fast` decides: terminate and
//! return the error (the default), or accumulate it and continue. Either
//! way, every captured failure is observable on the context after `run`.

pub mod core;
pub mod error;
pub mod executors;
pub mod pipeline;

pub use crate::core::{
    LogicOperator, ParallelConfig, PipelineConfig, PipelineStep, Plan, PlanEntry, ProgressTracker, StepProgress,
    TaskContext,
};
pub use crate::error::PipelineError;
pub use crate::executors::{ContextMerger, MergeStrategy, ParallelExecutor, TaskExecutor};
pub use crate::pipeline::{Pipeline, PipelineStatus, ProgressObserver};
