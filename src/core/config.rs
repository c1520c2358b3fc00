// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Execution Configuration
//!
//! Configuration types controlling how a plan is walked: the pipeline-level
//! failure policy and the parallel group execution policy. Both derive the
//! serde traits so applications can embed them in their own configuration
//! files; the engine itself performs no file loading.
//!
//! ## Defaults
//!
//! - `fail_fast = true`: the first propagated failure terminates the walk
//! - `operator = And`: a group succeeds only if every member succeeds
//! - `max_workers = None`: one worker per group member
//! - `timeout = None`: no group deadline

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Success policy applied to a parallel group at its join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicOperator {
    /// The group succeeds only if every step's outcome is a success.
    #[default]
    And,
    /// The group succeeds if at least one step's outcome is a success.
    Or,
}

/// Configuration for parallel group execution.
///
/// Applies to every parallel group of a plan; there is no per-group
/// override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Success policy evaluated at the group join.
    pub operator: LogicOperator,
    /// Upper bound on concurrently running workers. `None` runs every group
    /// member on its own worker.
    pub max_workers: Option<usize>,
    /// Deadline for the whole group, measured from dispatch to the last
    /// collected outcome. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl ParallelConfig {
    /// Sets the group success policy
    pub fn with_operator(mut self, operator: LogicOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Bounds the number of concurrently running workers
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = Some(max_workers);
        self
    }

    /// Sets the group deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Configuration for pipeline execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Whether a propagated failure terminates the plan walk. When `false`,
    /// failures are accumulated on the context and the walk continues.
    pub fail_fast: bool,
    /// Execution policy for parallel groups.
    pub parallel: ParallelConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            fail_fast: true,
            parallel: ParallelConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Sets the failure policy
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Sets the parallel group execution policy
    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }
}
