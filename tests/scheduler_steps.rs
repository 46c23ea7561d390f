// tests/scheduler_steps.rs

use std::collections::BTreeMap;

use sitepipe::dag::{DagGraph, Scheduler};
use sitepipe::engine::TaskOutcome;
use sitepipe::types::TaskId;

/// sprites -> styles -> templates, fonts unrelated.
fn chain() -> Scheduler {
    let after = BTreeMap::from([
        (TaskId::Styles, vec![TaskId::Sprites]),
        (TaskId::Templates, vec![TaskId::Styles]),
    ]);
    let graph = DagGraph::new(
        &[TaskId::Sprites, TaskId::Styles, TaskId::Templates, TaskId::Fonts],
        &after,
    );
    Scheduler::new(graph)
}

#[test]
fn downstream_lists_task_first() {
    let scheduler_graph = DagGraph::new(
        &[TaskId::Sprites, TaskId::Styles, TaskId::Templates],
        &BTreeMap::from([
            (TaskId::Styles, vec![TaskId::Sprites]),
            (TaskId::Templates, vec![TaskId::Styles]),
        ]),
    );

    assert_eq!(
        scheduler_graph.downstream_of(TaskId::Sprites),
        vec![TaskId::Sprites, TaskId::Styles, TaskId::Templates]
    );
    assert!(scheduler_graph.has_ancestor_in(TaskId::Templates, &[TaskId::Sprites]));
    assert!(!scheduler_graph.has_ancestor_in(TaskId::Sprites, &[TaskId::Templates]));
}

#[test]
fn failure_reports_skipped_dependents() {
    let mut scheduler = chain();

    let step = scheduler.step_trigger(TaskId::Sprites);
    let run_id = scheduler.current_run_id().unwrap();
    assert_eq!(step.newly_scheduled.len(), 1);
    assert_eq!(step.newly_scheduled[0].run_id, run_id);

    let step = scheduler.step_completion(TaskId::Sprites, TaskOutcome::Failed);
    assert_eq!(
        step.newly_failed,
        vec![TaskId::Sprites, TaskId::Styles, TaskId::Templates]
    );
    assert!(step.newly_scheduled.is_empty());
    assert!(step.run_just_finished);
    assert!(scheduler.current_run_id().is_none());
}

#[test]
fn dependency_outside_the_run_does_not_block() {
    let mut scheduler = chain();

    // Only templates changed: styles is not part of the run.
    let step = scheduler.step_trigger(TaskId::Templates);
    assert_eq!(step.newly_scheduled.len(), 1);
    assert_eq!(step.newly_scheduled[0].task, TaskId::Templates);

    let step = scheduler.step_completion(TaskId::Templates, TaskOutcome::Success);
    assert!(step.run_just_finished);
}

#[test]
fn runs_get_increasing_ids() {
    let mut scheduler = chain();

    scheduler.step_trigger(TaskId::Fonts);
    let first = scheduler.current_run_id().unwrap();
    scheduler.step_completion(TaskId::Fonts, TaskOutcome::Success);

    scheduler.step_trigger(TaskId::Fonts);
    let second = scheduler.current_run_id().unwrap();

    assert!(second > first);
}

#[test]
fn completion_without_run_is_ignored() {
    let mut scheduler = chain();

    let step = scheduler.step_completion(TaskId::Fonts, TaskOutcome::Success);
    assert!(step.newly_scheduled.is_empty());
    assert!(!step.run_just_finished);
}
