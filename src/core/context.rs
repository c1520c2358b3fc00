// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Task Context
//!
//! The `TaskContext` is the typed carrier passed through a pipeline run. It
//! holds the application's own configuration (opaque to the engine), a
//! tracing span acting as the run's logging capability, the result mapping
//! steps write into, and the sequence of captured failures.
//!
//! ## Copy Semantics
//!
//! Parallel groups and the failure-recovery path both duplicate contexts.
//! `Clone` duplicates the owned state (configuration, results, errors)
//! while the progress tracker handle stays *shared*: every copy made during
//! a run reports into the same tracker instance. This is the property that
//! makes progress reporting from concurrent branches coherent.
//!
//! ## Progress Reporting
//!
//! Steps report intra-step progress through
//! [`update_step_progress`](TaskContext::update_step_progress). The call is
//! a no-op until the pipeline has installed its tracker and an executor has
//! marked the current step, so a context used outside a run is harmless.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::Span;

use crate::core::progress::ProgressTracker;
use crate::error::PipelineError;

/// Typed carrier flowing through the pipeline.
///
/// `C` is the application's configuration type; the engine stores it,
/// clones it alongside the context, and never inspects it. The span is
/// likewise an opaque capability: it is entered around step execution so
/// that step logging lands in the caller's chosen span, but the engine
/// attaches no meaning to it.
///
/// Results are stored as [`serde_json::Value`], the dynamic representation
/// the parallel merge rules dispatch on.
#[derive(Debug, Clone)]
pub struct TaskContext<C> {
    app_config: C,
    span: Span,
    results: HashMap<String, Value>,
    errors: Vec<PipelineError>,
    progress_tracker: Option<Arc<ProgressTracker>>,
    current_step_id: Option<String>,
}

impl<C> TaskContext<C> {
    /// Creates a context carrying the application configuration
    ///
    /// The current tracing span is captured as the run's logging
    /// capability; use [`with_span`](Self::with_span) to attach a specific
    /// one.
    pub fn new(app_config: C) -> Self {
        Self::with_span(app_config, Span::current())
    }

    /// Creates a context with an explicit logging span
    pub fn with_span(app_config: C, span: Span) -> Self {
        TaskContext {
            app_config,
            span,
            results: HashMap::new(),
            errors: Vec::new(),
            progress_tracker: None,
            current_step_id: None,
        }
    }

    /// Gets the application configuration
    pub fn app_config(&self) -> &C {
        &self.app_config
    }

    /// Gets mutable access to the application configuration
    pub fn app_config_mut(&mut self) -> &mut C {
        &mut self.app_config
    }

    /// Gets the logging span attached to this context
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Gets the result mapping
    pub fn results(&self) -> &HashMap<String, Value> {
        &self.results
    }

    /// Gets mutable access to the result mapping
    pub fn results_mut(&mut self) -> &mut HashMap<String, Value> {
        &mut self.results
    }

    /// Stores a result value under the given key
    pub fn insert_result(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.results.insert(key.into(), value.into());
    }

    /// Gets a result value by key
    pub fn result(&self, key: &str) -> Option<&Value> {
        self.results.get(key)
    }

    /// Gets the captured failures, in capture order
    pub fn errors(&self) -> &[PipelineError] {
        &self.errors
    }

    /// Appends a captured failure
    pub fn record_error(&mut self, error: PipelineError) {
        self.errors.push(error);
    }

    /// Gets the id of the step currently executing on this context copy
    pub fn current_step_id(&self) -> Option<&str> {
        self.current_step_id.as_deref()
    }

    /// Gets the shared progress tracker handle, once a run has installed it
    pub fn progress_tracker(&self) -> Option<&Arc<ProgressTracker>> {
        self.progress_tracker.as_ref()
    }

    /// Reports progress for the currently executing step
    ///
    /// `progress` is a percentage in `[0, 100]`; out-of-range values are
    /// clamped. The call is a no-op when no tracker is installed or no step
    /// is marked current, so steps may report unconditionally.
    pub fn update_step_progress(&self, progress: f64) {
        if let (Some(tracker), Some(step_id)) = (&self.progress_tracker, &self.current_step_id) {
            tracker.update_step_progress(step_id, progress);
        }
    }

    /// Installs the run's shared progress tracker.
    pub(crate) fn attach_tracker(&mut self, tracker: Arc<ProgressTracker>) {
        self.progress_tracker = Some(tracker);
    }

    /// Marks the step about to execute on this context copy.
    pub(crate) fn begin_step(&mut self, step_id: &str) {
        self.current_step_id = Some(step_id.to_string());
    }
}
