// tests/core_runtime.rs
//
// Drives the pure core by hand: no executor, no channels.

use sitepipe::config::ConfigFile;
use sitepipe::dag::{ScheduledTask, Scheduler, TaskRunState};
use sitepipe::engine::{
    CoreCommand, CoreRuntime, CoreStep, RuntimeEvent, RuntimeOptions, TaskOutcome, TriggerReason,
};
use sitepipe::pipeline::BuildPlan;
use sitepipe::types::TaskId;
use sitepipe_test_utils::init_tracing;

fn core_for(cfg: &ConfigFile) -> CoreRuntime {
    let graph = BuildPlan::from_config(cfg).watch_graph();
    CoreRuntime::new(Scheduler::new(graph), RuntimeOptions::default())
}

fn trigger(task: TaskId) -> RuntimeEvent {
    RuntimeEvent::TaskTriggered {
        task,
        reason: TriggerReason::FileWatch,
    }
}

fn done(task: TaskId, outcome: TaskOutcome) -> RuntimeEvent {
    RuntimeEvent::TaskCompleted { task, outcome }
}

fn dispatched(step: &CoreStep) -> Vec<TaskId> {
    step.commands
        .iter()
        .flat_map(|c| match c {
            CoreCommand::DispatchTasks(tasks) => tasks.iter().map(|t: &ScheduledTask| t.task).collect(),
            CoreCommand::RequestExit => Vec::new(),
        })
        .collect()
}

#[test]
fn sprites_change_runs_sprites_then_styles() {
    init_tracing();
    let cfg = ConfigFile::defaults().unwrap();
    let mut core = core_for(&cfg);

    let step = core.step(trigger(TaskId::Sprites));
    assert_eq!(dispatched(&step), vec![TaskId::Sprites]);
    assert_eq!(
        core.scheduler().run_state_of(TaskId::Styles),
        Some(TaskRunState::Pending)
    );
    // Untouched tasks stay out of the run.
    assert_eq!(
        core.scheduler().run_state_of(TaskId::Templates),
        Some(TaskRunState::NotInRun)
    );

    let step = core.step(done(TaskId::Sprites, TaskOutcome::Success));
    assert_eq!(dispatched(&step), vec![TaskId::Styles]);

    let step = core.step(done(TaskId::Styles, TaskOutcome::Success));
    assert!(dispatched(&step).is_empty());
    assert!(core.is_idle());
}

#[test]
fn unrelated_trigger_is_merged_into_running_rebuild() {
    let cfg = ConfigFile::defaults().unwrap();
    let mut core = core_for(&cfg);

    core.step(trigger(TaskId::Sprites));
    let step = core.step(trigger(TaskId::Templates));

    assert_eq!(dispatched(&step), vec![TaskId::Templates]);
    assert!(core.queue_is_empty());
}

#[test]
fn overlapping_trigger_is_queued_and_replayed() {
    let cfg = ConfigFile::defaults().unwrap();
    let mut core = core_for(&cfg);

    core.step(trigger(TaskId::Sprites));

    // Styles is already part of this run (after sprites): wait for it.
    let step = core.step(trigger(TaskId::Styles));
    assert!(dispatched(&step).is_empty());
    assert!(!core.queue_is_empty());

    // Sprites again while it is still building: also queued.
    let step = core.step(trigger(TaskId::Sprites));
    assert!(dispatched(&step).is_empty());

    let step = core.step(done(TaskId::Sprites, TaskOutcome::Success));
    assert_eq!(dispatched(&step), vec![TaskId::Styles]);

    // Run finishes; the queued batch starts a new run at once.
    let step = core.step(done(TaskId::Styles, TaskOutcome::Success));
    assert_eq!(dispatched(&step), vec![TaskId::Sprites]);
    assert!(core.queue_is_empty());
    assert!(!core.is_idle());
}

#[test]
fn failed_task_skips_its_dependents() {
    let cfg = ConfigFile::defaults().unwrap();
    let mut core = core_for(&cfg);

    core.step(trigger(TaskId::Sprites));
    let step = core.step(done(TaskId::Sprites, TaskOutcome::Failed));

    assert!(dispatched(&step).is_empty());
    assert_eq!(
        core.scheduler().run_state_of(TaskId::Styles),
        Some(TaskRunState::DoneFailed)
    );
    assert!(core.is_idle());

    // The next change starts over.
    let step = core.step(trigger(TaskId::Sprites));
    assert_eq!(dispatched(&step), vec![TaskId::Sprites]);
}

#[test]
fn queued_triggers_for_different_tasks_are_all_replayed() {
    let cfg = ConfigFile::defaults().unwrap();
    let mut core = core_for(&cfg);
    let mut ran = Vec::new();

    ran.extend(dispatched(&core.step(trigger(TaskId::Templates))));
    ran.extend(dispatched(&core.step(trigger(TaskId::Sprites))));
    // Both tasks are building: these two must wait for the run to end.
    ran.extend(dispatched(&core.step(trigger(TaskId::Templates))));
    ran.extend(dispatched(&core.step(trigger(TaskId::Sprites))));
    assert_eq!(ran, vec![TaskId::Templates, TaskId::Sprites]);

    ran.extend(dispatched(&core.step(done(TaskId::Templates, TaskOutcome::Success))));
    ran.extend(dispatched(&core.step(done(TaskId::Sprites, TaskOutcome::Success))));
    ran.extend(dispatched(&core.step(done(TaskId::Styles, TaskOutcome::Success))));

    // The replayed run holds both queued tasks.
    assert!(core.queue_is_empty());
    let mut replay = ran.split_off(3);
    replay.sort();
    assert_eq!(ran, vec![TaskId::Templates, TaskId::Sprites, TaskId::Styles]);
    assert_eq!(replay, vec![TaskId::Sprites, TaskId::Templates]);

    let step = core.step(done(TaskId::Templates, TaskOutcome::Success));
    assert!(dispatched(&step).is_empty());
    let step = core.step(done(TaskId::Sprites, TaskOutcome::Success));
    assert_eq!(dispatched(&step), vec![TaskId::Styles]);
    core.step(done(TaskId::Styles, TaskOutcome::Success));

    let runs_of = |id: TaskId| ran.iter().chain(&replay).filter(|t| **t == id).count();
    assert_eq!(runs_of(TaskId::Templates), 2);
    assert_eq!(runs_of(TaskId::Sprites), 2);
    assert!(core.is_idle());
}

#[test]
fn clean_is_not_part_of_watch_rebuilds() {
    let cfg = ConfigFile::defaults().unwrap();
    let mut core = core_for(&cfg);

    let step = core.step(trigger(TaskId::Clean));
    assert!(dispatched(&step).is_empty());
    assert!(core.is_idle());
}

#[test]
fn exit_when_idle_requests_exit_after_last_completion() {
    let cfg = ConfigFile::defaults().unwrap();
    let graph = BuildPlan::from_config(&cfg).watch_graph();
    let mut core = CoreRuntime::new(
        Scheduler::new(graph),
        RuntimeOptions {
            exit_when_idle: true,
        },
    );

    core.step(trigger(TaskId::Fonts));
    let step = core.step(done(TaskId::Fonts, TaskOutcome::Success));

    assert!(!step.keep_running);
    assert!(step.commands.contains(&CoreCommand::RequestExit));
}

#[test]
fn shutdown_stops_the_loop() {
    let cfg = ConfigFile::defaults().unwrap();
    let mut core = core_for(&cfg);

    let step = core.step(RuntimeEvent::ShutdownRequested);
    assert!(!step.keep_running);
}
