// src/dag/task_info.rs

//! Task metadata and per-run state.

use crate::types::TaskId;

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Task was triggered for this run but is waiting on dependencies.
    Pending,
    /// Task has been dispatched to the executor and is currently running.
    Running,
    DoneSuccess,
    /// Task failed in this run (or was blocked by a failed dependency).
    DoneFailed,
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not currently participating in this run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
        }
    }
}

/// Static ordering information plus per-run state for one task.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub id: TaskId,
    /// Tasks that must finish first when they share a run with this one.
    pub deps: Vec<TaskId>,

    /// Per-run state (None if not participating in the current run).
    pub run_state: Option<RunState>,

    /// Last run ID in which this task succeeded.
    pub last_successful_run: Option<u64>,

    /// Last run ID in which this task failed.
    pub last_failed_run: Option<u64>,
}

impl TaskInfo {
    pub fn new(id: TaskId, deps: Vec<TaskId>) -> Self {
        Self {
            id,
            deps,
            run_state: None,
            last_successful_run: None,
            last_failed_run: None,
        }
    }
}

/// A task the scheduler wants the executor to run now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    pub task: TaskId,
    /// All tasks dispatched within the same run share the same `run_id`.
    pub run_id: u64,
}
