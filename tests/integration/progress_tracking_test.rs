// /////////////////////////////////////////////////////////////////////////////
// Task Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end tests for progress aggregation, auto-completion, and the live
//! status surface.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use task_pipeline::{Pipeline, PipelineError, PlanEntry, TaskContext};

use super::support::FnStep;

#[tokio::test]
async fn test_weights_cover_mixed_plans() {
    let plan = vec![
        PlanEntry::serial(FnStep::new("solo", |_context| Ok(()))),
        PlanEntry::parallel(vec![
            FnStep::new("left", |_context| Ok(())).arc(),
            FnStep::new("right", |_context| Ok(())).arc(),
        ]),
    ];
    let pipeline = Pipeline::new(plan).expect("valid plan");

    let weights = pipeline.progress_tracker().weights();
    let total: f64 = weights.values().sum();
    assert!((total - 100.0).abs() < 1e-6);
    assert!((weights["solo"] - 50.0).abs() < 1e-9);
    assert!((weights["left"] - 25.0).abs() < 1e-9);
    assert!((weights["right"] - 25.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_auto_completion_forces_full_progress() {
    // Neither step reports any progress of its own.
    let plan = vec![
        PlanEntry::serial(FnStep::new("silent_a", |_context| Ok(()))),
        PlanEntry::serial(FnStep::new("silent_b", |_context| Ok(()))),
    ];
    let pipeline = Pipeline::new(plan).expect("valid plan");

    let mut context = TaskContext::new(());
    pipeline.run(&mut context).await.expect("run succeeds");

    let details = pipeline.progress_tracker().step_details();
    for step_id in ["silent_a", "silent_b"] {
        assert!((details[step_id].internal_progress - 100.0).abs() < 1e-9);
    }
    assert!((pipeline.status().overall_progress - 100.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_observer_progress_is_monotonic() {
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);

    let plan = vec![
        PlanEntry::serial(FnStep::new("one", |_context| Ok(()))),
        PlanEntry::parallel(vec![
            FnStep::new("two", |_context| Ok(())).arc(),
            FnStep::new("three", |_context| Ok(())).arc(),
        ]),
        PlanEntry::serial(FnStep::new("four", |_context| Ok(()))),
    ];
    let pipeline = Pipeline::new(plan)
        .expect("valid plan")
        .with_observer(move |_index, _total, _name, overall| {
            sink.lock().unwrap().push(overall);
        });

    let mut context = TaskContext::new(());
    pipeline.run(&mut context).await.expect("run succeeds");

    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 3);
    for window in observed.windows(2) {
        assert!(window[0] <= window[1] + 1e-9, "progress regressed: {observed:?}");
    }
    assert!((observed[observed.len() - 1] - 100.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_step_progress_reports_are_clamped() {
    // Each step reports an out-of-range value and then reads back what the
    // tracker actually stored, before auto-completion overwrites it.
    let clamped_readback = |step_id: &'static str| {
        move |context: &mut TaskContext<()>| -> Result<(), PipelineError> {
            let tracker = context.progress_tracker().expect("tracker installed").clone();
            let seen = tracker.step_details()[step_id].internal_progress;
            context.insert_result(format!("{step_id}_seen"), seen);
            Ok(())
        }
    };

    let plan = vec![
        PlanEntry::serial(FnStep::new("wild", move |context| {
            context.update_step_progress(250.0);
            clamped_readback("wild")(context)
        })),
        PlanEntry::serial(FnStep::new("negative", move |context| {
            context.update_step_progress(-40.0);
            clamped_readback("negative")(context)
        })),
    ];
    let pipeline = Pipeline::new(plan).expect("valid plan");

    let mut context = TaskContext::new(());
    pipeline.run(&mut context).await.expect("run succeeds");

    let wild_seen = context.result("wild_seen").and_then(serde_json::Value::as_f64);
    let negative_seen = context.result("negative_seen").and_then(serde_json::Value::as_f64);
    assert_eq!(wild_seen, Some(100.0));
    assert_eq!(negative_seen, Some(0.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_status_is_safe_while_running() {
    let plan = vec![
        PlanEntry::serial(FnStep::new("first", |context| {
            context.update_step_progress(50.0);
            Ok(())
        })),
        PlanEntry::serial(
            FnStep::new("second", |_context| Ok(())).with_delay(Duration::from_millis(200)),
        ),
    ];
    let pipeline = Arc::new(Pipeline::new(plan).expect("valid plan"));

    let runner = Arc::clone(&pipeline);
    let run = tokio::spawn(async move {
        let mut context = TaskContext::new(());
        runner.run(&mut context).await
    });

    // Sample the status surface concurrently with the run.
    let mut saw_running = false;
    for _ in 0..50 {
        let status = pipeline.status();
        assert!((0.0..=100.0 + 1e-9).contains(&status.overall_progress));
        for detail in status.step_details.values() {
            assert!((0.0..=100.0 + 1e-9).contains(&detail.internal_progress));
        }
        if status.is_running {
            saw_running = true;
            if let Some(name) = &status.current_step {
                assert!(name == "first" || name == "second");
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    run.await.expect("runner task").expect("run succeeds");
    assert!(saw_running);
    assert!(!pipeline.is_running());
    assert_eq!(pipeline.current_step(), None);
    assert!((pipeline.status().overall_progress - 100.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_context_copies_share_the_pipeline_tracker() {
    let plan = vec![PlanEntry::serial(FnStep::new("only", |_context| Ok(())))];
    let pipeline = Pipeline::new(plan).expect("valid plan");

    let mut context = TaskContext::new(());
    pipeline.run(&mut context).await.expect("run succeeds");

    let copy = context.clone();
    let handle = copy.progress_tracker().expect("tracker installed by the run");
    assert!(Arc::ptr_eq(handle, pipeline.progress_tracker()));
}
