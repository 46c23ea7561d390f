// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeSet;

use tracing::debug;

use crate::dag::{ScheduledTask, Scheduler};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeOptions, TaskOutcome, TriggerReason};
use crate::types::TaskId;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Request that the runtime exits (used when `exit_when_idle` is set).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a task trigger event.
///
/// - Idle scheduler: start a new run seeded with this trigger plus anything
///   queued earlier.
/// - Active run, and the task (or something ordered after it) is already in
///   it: queue the trigger so the task is re-run after this run, never
///   concurrently with itself and never ahead of a running dependent.
/// - Active run otherwise: merge the task into the run right away; it runs
///   concurrently with the unrelated tasks already building.
pub fn handle_task_trigger(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    task: TaskId,
    reason: TriggerReason,
) -> CoreStep {
    debug!(task = %task, ?reason, "trigger received");

    if scheduler.is_idle() {
        let mut triggers: BTreeSet<TaskId> = queue.drain_pending().into_iter().collect();
        triggers.insert(task);
        return start_new_run_from_triggers(scheduler, triggers.into_iter().collect());
    }

    let mut commands = Vec::new();

    if scheduler.run_state_of(task).is_none() {
        debug!(task = %task, "trigger for task outside the watch graph; ignoring");
    } else if scheduler.overlaps_current_run(task) {
        queue.record_trigger(task);
    } else {
        let newly_ready = scheduler.handle_trigger(task);
        if !newly_ready.is_empty() {
            commands.push(CoreCommand::DispatchTasks(newly_ready));
        }
    }

    CoreStep::running(commands)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    task: TaskId,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    let newly_ready = scheduler.handle_completion(task, outcome);
    if !newly_ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(newly_ready));
    }

    commands.extend(maybe_start_queued_run(scheduler, queue));

    let mut keep_running = true;
    if options.exit_when_idle && scheduler.is_idle() && queue.is_empty() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

/// Seed a new run from a set of triggers.
pub fn start_new_run_from_triggers(scheduler: &mut Scheduler, triggers: Vec<TaskId>) -> CoreStep {
    if triggers.is_empty() {
        return CoreStep::running(Vec::new());
    }

    scheduler.start_new_run();

    let mut all_ready = Vec::new();
    for task in triggers {
        all_ready.extend(scheduler.handle_trigger(task));
    }

    let mut commands = Vec::new();
    if !all_ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(all_ready));
    }
    CoreStep::running(commands)
}

/// If the scheduler is idle and there are queued triggers, start a new run.
fn maybe_start_queued_run(scheduler: &mut Scheduler, queue: &mut TriggerQueue) -> Vec<CoreCommand> {
    if !scheduler.is_idle() || queue.is_empty() {
        return Vec::new();
    }

    let triggers = queue.drain_pending();
    start_new_run_from_triggers(scheduler, triggers).commands
}
