// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end tests for serial plan execution and the failure policy.

use std::sync::{Arc, Mutex};

use serde_json::json;
use task_pipeline::{Pipeline, PipelineConfig, PlanEntry, TaskContext};

use super::support::FnStep;

/// Observer recording `(index, total, name, overall)` tuples.
fn recording_observer() -> (
    Arc<Mutex<Vec<(usize, usize, String, f64)>>>,
    impl Fn(usize, usize, &str, f64) + Send + Sync + 'static,
) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    let observer = move |index: usize, total: usize, name: &str, overall: f64| {
        sink.lock().unwrap().push((index, total, name.to_string(), overall));
    };
    (calls, observer)
}

#[tokio::test]
async fn test_serial_three_step_success() {
    super::support::init_tracing();
    let (calls, observer) = recording_observer();
    let pipeline = Pipeline::new(vec![
        PlanEntry::serial(FnStep::new("a", |context| {
            context.insert_result("a", 1);
            Ok(())
        })),
        PlanEntry::serial(FnStep::new("b", |context| {
            context.insert_result("b", 2);
            Ok(())
        })),
        PlanEntry::serial(FnStep::new("c", |context| {
            context.insert_result("c", 3);
            Ok(())
        })),
    ])
    .expect("valid plan")
    .with_observer(observer);

    let mut context = TaskContext::new(());
    pipeline.run(&mut context).await.expect("run succeeds");

    assert_eq!(context.result("a"), Some(&json!(1)));
    assert_eq!(context.result("b"), Some(&json!(2)));
    assert_eq!(context.result("c"), Some(&json!(3)));
    assert!(context.errors().is_empty());

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].0, 0);
    assert_eq!(calls[0].1, 3);
    assert_eq!(calls[0].2, "a");
    assert!((calls[0].3 - 100.0 / 3.0).abs() < 1e-6);
    assert!((calls[1].3 - 200.0 / 3.0).abs() < 1e-6);
    assert!((calls[2].3 - 100.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_fail_fast_stops_mid_plan() {
    let invoked_c = Arc::new(Mutex::new(false));
    let invoked_c_probe = Arc::clone(&invoked_c);
    let (calls, observer) = recording_observer();

    let pipeline = Pipeline::new(vec![
        PlanEntry::serial(FnStep::new("a", |context| {
            context.insert_result("a", 1);
            Ok(())
        })),
        PlanEntry::serial(FnStep::failing("f", "boom")),
        PlanEntry::serial(FnStep::new("c", move |context| {
            *invoked_c_probe.lock().unwrap() = true;
            context.insert_result("c", 3);
            Ok(())
        })),
    ])
    .expect("valid plan")
    .with_observer(observer);

    let mut context = TaskContext::new(());
    let error = pipeline.run(&mut context).await.unwrap_err();

    assert_eq!(error.step_id(), Some("f"));
    assert!(error.to_string().contains("boom"));

    // Results reflect the successful prefix only; the failure is mirrored
    // into the context's error sequence.
    assert_eq!(context.result("a"), Some(&json!(1)));
    assert_eq!(context.result("c"), None);
    assert!(!*invoked_c.lock().unwrap());
    assert_eq!(context.errors().len(), 1);
    assert_eq!(context.errors()[0].step_id(), Some("f"));

    // The observer saw only the successful first position.
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].2, "a");
}

#[tokio::test]
async fn test_non_critical_failures_accumulate() {
    let (calls, observer) = recording_observer();
    let pipeline = Pipeline::new(vec![
        PlanEntry::serial(FnStep::failing("f1", "first").non_critical()),
        PlanEntry::serial(FnStep::new("s", |context| {
            context.insert_result("s", "ok");
            Ok(())
        })),
        PlanEntry::serial(FnStep::failing("f2", "second").non_critical()),
    ])
    .expect("valid plan")
    .with_observer(observer);

    let mut context = TaskContext::new(());
    pipeline.run(&mut context).await.expect("non-critical failures are swallowed");

    assert_eq!(context.result("s"), Some(&json!("ok")));
    assert_eq!(context.errors().len(), 2);
    assert_eq!(context.errors()[0].step_id(), Some("f1"));
    assert_eq!(context.errors()[1].step_id(), Some("f2"));
    assert_eq!(calls.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_fail_slow_attempts_every_position() {
    let config = PipelineConfig::default().with_fail_fast(false);
    let pipeline = Pipeline::with_config(
        vec![
            PlanEntry::serial(FnStep::failing("f1", "first")),
            PlanEntry::serial(FnStep::new("s", |context| {
                context.insert_result("s", "ok");
                Ok(())
            })),
            PlanEntry::serial(FnStep::failing("f2", "second")),
        ],
        config,
    )
    .expect("valid plan");

    let mut context = TaskContext::new(());
    pipeline.run(&mut context).await.expect("fail-slow run returns normally");

    // Every position was attempted; one error per failing position.
    assert_eq!(context.result("s"), Some(&json!("ok")));
    assert_eq!(context.errors().len(), 2);
}

#[tokio::test]
async fn test_empty_plan_is_a_no_op() {
    let (calls, observer) = recording_observer();
    let pipeline: Pipeline<()> = Pipeline::new(Vec::new()).expect("empty plan is valid").with_observer(observer);

    let mut context = TaskContext::new(());
    context.insert_result("seed", "untouched");
    pipeline.run(&mut context).await.expect("empty run succeeds");

    assert_eq!(context.result("seed"), Some(&json!("untouched")));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_runs_yield_equal_results() {
    let build = || {
        Pipeline::new(vec![
            PlanEntry::serial(FnStep::new("a", |context| {
                context.insert_result("a", 1);
                Ok(())
            })),
            PlanEntry::serial(FnStep::new("b", |context| {
                context.insert_result("b", 2);
                Ok(())
            })),
        ])
        .expect("valid plan")
    };

    let pipeline = build();
    let mut first = TaskContext::new(());
    pipeline.run(&mut first).await.expect("first run succeeds");
    let mut second = TaskContext::new(());
    pipeline.run(&mut second).await.expect("second run succeeds");

    assert_eq!(first.results(), second.results());
}
