// src/dag/scheduler_step.rs

//! Step-by-step result type for the scheduler.

use crate::dag::task_info::ScheduledTask;
use crate::types::TaskId;

/// Structured result of a single scheduler "step".
///
/// Useful for tests that manually step a rebuild and assert on what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks newly marked as failed in this step (the failing task first,
    /// then any skipped dependents).
    pub newly_failed: Vec<TaskId>,
    /// Whether this step made the scheduler idle.
    pub run_just_finished: bool,
}

impl SchedulerStep {
    pub fn empty() -> Self {
        Self::default()
    }
}
