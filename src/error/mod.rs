// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Error Module
//!
//! This module provides the error types for the task pipeline engine,
//! implementing a structured error handling approach that categorizes the
//! failure scenarios of plan construction and plan execution.
//!
//! ## Overview
//!
//! The error module defines pipeline-specific errors that:
//!
//! - **Express Execution Failures**: Step failures, group failures, and group
//!   deadlines, each carrying its origin
//! - **Catch Programmer Errors Early**: Plan invariant violations are raised
//!   at pipeline construction, before `run` is reachable
//! - **Stay Cloneable**: Captured failures are appended to the context's error
//!   sequence and simultaneously propagated to the caller
//!
//! ## Error Handling Patterns
//!
//! Use pattern matching for granular error handling, or the `category()`
//! accessor for coarse routing. Failures captured during a run are always
//! mirrored into the context's error sequence, so a caller that receives an
//! error from `Pipeline::run` can inspect the same failure on the context it
//! passed in.

mod pipeline_error;

pub use pipeline_error::PipelineError;
