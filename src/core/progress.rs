// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Weighted Progress Tracking
//!
//! This module provides the thread-safe progress aggregator shared by every
//! context copy of a pipeline run. Each step owns a fixed share of the
//! overall progress, assigned once from the shape of the plan; steps report
//! their internal completion percentage and the tracker folds those reports
//! into a single overall figure.
//!
//! ## Weight Assignment
//!
//! With `N` plan entries, every entry owns `100 / N` percent of the overall
//! progress. A serial entry's step receives that share directly; a parallel
//! group divides its share equally among its `K` members, so each member
//! receives `(100 / N) / K`.
//!
//! ## Thread Safety
//!
//! The tracker is the only mutable state shared across a run's context
//! copies. The weight table is written once at construction and never again;
//! per-step internal progress is guarded by a single mutex, and read paths
//! return copied snapshots rather than references into the guarded map.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::core::plan::PlanEntry;
use crate::core::step::PipelineStep;

/// Progress details for a single step, copied out of the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct StepProgress {
    /// Completion within the step, in `[0, 100]`.
    pub internal_progress: f64,
    /// The step's fixed share of the overall progress.
    pub max_weight: f64,
    /// Current contribution to the overall figure:
    /// `max_weight * internal_progress / 100`.
    pub contribution: f64,
}

/// Thread-safe weighted progress aggregator for a pipeline run.
///
/// Constructed once per pipeline from the plan's shape and shared (behind an
/// `Arc`) with every context copy made during a run. Steps report through
/// [`update_step_progress`](Self::update_step_progress); readers observe a
/// consistent snapshot through [`overall_progress`](Self::overall_progress)
/// and [`step_details`](Self::step_details).
#[derive(Debug)]
pub struct ProgressTracker {
    weights: HashMap<String, f64>,
    progress: Mutex<HashMap<String, f64>>,
}

impl ProgressTracker {
    /// Creates a tracker with weights assigned from the plan's shape
    pub fn new<C>(plan: &[PlanEntry<C>]) -> Self {
        ProgressTracker {
            weights: Self::calculate_weights(plan),
            progress: Mutex::new(HashMap::new()),
        }
    }

    /// Calculates the fixed weight share for every step in the plan.
    ///
    /// Each plan entry owns an equal share; a group's share is split equally
    /// among its members. An empty group keeps its entry position but has no
    /// members to carry the share, so that share is simply absent from the
    /// table.
    fn calculate_weights<C>(plan: &[PlanEntry<C>]) -> HashMap<String, f64> {
        let mut weights = HashMap::new();
        if plan.is_empty() {
            return weights;
        }

        let entry_weight = 100.0 / plan.len() as f64;
        for entry in plan {
            match entry {
                PlanEntry::Serial(step) => {
                    weights.insert(step.step_id().to_string(), entry_weight);
                }
                PlanEntry::Parallel(steps) => {
                    if steps.is_empty() {
                        continue;
                    }
                    let member_weight = entry_weight / steps.len() as f64;
                    for step in steps {
                        weights.insert(step.step_id().to_string(), member_weight);
                    }
                }
            }
        }

        weights
    }

    /// Records internal progress for a step, clamped into `[0, 100]`
    ///
    /// Non-finite reports are ignored. Reports for ids outside the plan are
    /// stored but carry no weight, so they never affect the overall figure.
    pub fn update_step_progress(&self, step_id: &str, progress: f64) {
        if progress.is_nan() {
            return;
        }
        let clamped = progress.clamp(0.0, 100.0);
        self.progress.lock().insert(step_id.to_string(), clamped);
    }

    /// Calculates the overall pipeline progress in `[0, 100]`
    ///
    /// The overall figure is the weight-scaled sum of every step's internal
    /// progress; steps that have not reported count as zero.
    pub fn overall_progress(&self) -> f64 {
        let progress = self.progress.lock();
        self.weights
            .iter()
            .map(|(step_id, weight)| {
                let internal = progress.get(step_id).copied().unwrap_or(0.0);
                weight * internal / 100.0
            })
            .sum()
    }

    /// Returns a copied per-step progress snapshot
    pub fn step_details(&self) -> HashMap<String, StepProgress> {
        let progress = self.progress.lock();
        self.weights
            .iter()
            .map(|(step_id, weight)| {
                let internal = progress.get(step_id).copied().unwrap_or(0.0);
                (
                    step_id.clone(),
                    StepProgress {
                        internal_progress: internal,
                        max_weight: *weight,
                        contribution: weight * internal / 100.0,
                    },
                )
            })
            .collect()
    }

    /// Gets the fixed weight table, keyed by step id
    pub fn weights(&self) -> &HashMap<String, f64> {
        &self.weights
    }
}
