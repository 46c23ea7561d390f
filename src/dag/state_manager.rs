// src/dag/state_manager.rs

//! Per-run state management for tasks in the scheduler.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::dag::DagGraph;
use crate::types::TaskId;

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut BTreeMap<TaskId, TaskInfo>,
    current_run_id: Option<u64>,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a DagGraph,
        tasks: &'a mut BTreeMap<TaskId, TaskInfo>,
        current_run_id: Option<u64>,
    ) -> Self {
        Self {
            graph,
            tasks,
            current_run_id,
        }
    }

    /// Include a triggered task and all its downstream dependents in this run.
    ///
    /// Tasks that were not yet part of the run are marked `Pending`; tasks
    /// already participating keep their current state.
    pub fn mark_task_and_dependents_pending(&mut self, root: TaskId) {
        for id in self.graph.downstream_of(root) {
            match self.tasks.get_mut(&id) {
                Some(info) if info.run_state.is_none() => {
                    info.run_state = Some(RunState::Pending);
                    debug!(task = %id, "marked Pending for this run");
                }
                Some(_) => {}
                None => warn!(task = %id, "node in graph not present in tasks map"),
            }
        }
    }

    /// Mark every pending or running dependent of a failed task as
    /// `DoneFailed` for this run.
    ///
    /// Returns the newly failed tasks, excluding `failed_task` itself.
    pub fn mark_dependents_failed(&mut self, failed_task: TaskId) -> Vec<TaskId> {
        let mut stack: Vec<TaskId> = self.graph.dependents_of(failed_task).to_vec();
        let mut newly_failed = Vec::new();

        while let Some(id) = stack.pop() {
            if let Some(info) = self.tasks.get_mut(&id) {
                if let Some(RunState::Pending) = info.run_state {
                    info.run_state = Some(RunState::DoneFailed);
                    debug!(task = %id, "skipping dependent due to upstream failure");
                    newly_failed.push(id);
                    stack.extend(self.graph.dependents_of(id).iter().copied());
                }
            }
        }

        newly_failed
    }

    /// Collect tasks that are `Pending` with satisfied dependencies, mark them
    /// `Running`, and return them for dispatch.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        let candidates: Vec<TaskId> = {
            let ro = ReadOnlyStateManager::new(self.tasks);
            self.tasks
                .values()
                .filter(|info| {
                    matches!(info.run_state, Some(RunState::Pending))
                        && ro.deps_satisfied_for_info(info)
                })
                .map(|info| info.id)
                .collect()
        };

        let run_id = self.current_run_id.unwrap_or(0);
        let mut ready = Vec::with_capacity(candidates.len());

        for id in candidates {
            if let Some(info) = self.tasks.get_mut(&id) {
                let is_rerun = info.last_successful_run.is_some() || info.last_failed_run.is_some();
                if is_rerun {
                    info!(task = %id, run_id, "rebuilding");
                } else {
                    info!(task = %id, run_id, "building");
                }

                info.run_state = Some(RunState::Running);
                ready.push(ScheduledTask { task: id, run_id });
            }
        }

        ready
    }

    /// Check if all tasks are in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        !self.tasks.values().any(|info| {
            matches!(
                info.run_state,
                Some(RunState::Pending) | Some(RunState::Running)
            )
        })
    }
}

/// A read-only view for dependency checks when only shared access exists.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a BTreeMap<TaskId, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a BTreeMap<TaskId, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// Whether every dependency of `info` allows it to start in this run.
    ///
    /// Constraints are ordering-only: a dependency that is not part of the
    /// run does not hold the task back. A dependency inside the run must have
    /// succeeded.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        info.deps.iter().all(|dep| match self.tasks.get(dep) {
            Some(dep) => matches!(dep.run_state, None | Some(RunState::DoneSuccess)),
            None => {
                warn!(task = %info.id, dep = %dep, "dependency missing from tasks map");
                true
            }
        })
    }
}
