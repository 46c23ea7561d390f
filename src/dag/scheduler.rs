use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo, TaskRunState};
use crate::engine::TaskOutcome;
use crate::types::TaskId;

/// Scheduler holds the immutable ordering graph plus mutable per-run state.
///
/// It is responsible for:
/// - remembering which tasks are part of the current rebuild run
/// - deciding when a triggered task is ready (ordering satisfied)
/// - marking tasks as succeeded/failed
/// - scheduling dependents when appropriate
/// - skipping dependents when a task fails
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: BTreeMap<TaskId, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
}

impl Scheduler {
    /// Construct a scheduler over an ordering graph.
    pub fn new(graph: DagGraph) -> Self {
        let tasks = graph
            .tasks()
            .map(|id| (id, TaskInfo::new(id, graph.dependencies_of(id).to_vec())))
            .collect();

        Self {
            graph,
            tasks,
            run_counter: 0,
            current_run_id: None,
        }
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// Read-only view of the given task's run state; `None` for unknown tasks.
    pub fn run_state_of(&self, task: TaskId) -> Option<TaskRunState> {
        let info = self.tasks.get(&task)?;
        Some(info.run_state.into())
    }

    /// Whether the task, or anything that must run after it, is already part
    /// of the active run. Such a trigger cannot be merged into the run
    /// without breaking ordering or running a task twice at once.
    pub fn overlaps_current_run(&self, task: TaskId) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }
        self.graph.downstream_of(task).into_iter().any(|id| {
            self.tasks
                .get(&id)
                .is_some_and(|info| info.run_state.is_some())
        })
    }

    /// Start a new run, resetting per-run state but keeping history.
    pub fn start_new_run(&mut self) {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);

        for info in self.tasks.values_mut() {
            info.run_state = None;
        }

        debug!(run_id = self.run_counter, "scheduler: starting new rebuild run");
    }

    /// Handle a trigger for a task (production API).
    pub fn handle_trigger(&mut self, task: TaskId) -> Vec<ScheduledTask> {
        self.trigger_step_internal(task).newly_scheduled
    }

    /// Handle completion of a task with a concrete outcome (production API).
    pub fn handle_completion(&mut self, task: TaskId, outcome: TaskOutcome) -> Vec<ScheduledTask> {
        self.completion_step_internal(task, outcome).newly_scheduled
    }

    /// Manual-step variant of `handle_trigger` that returns a rich [`SchedulerStep`].
    pub fn step_trigger(&mut self, task: TaskId) -> SchedulerStep {
        self.trigger_step_internal(task)
    }

    /// Manual-step variant of `handle_completion` that returns a rich [`SchedulerStep`].
    pub fn step_completion(&mut self, task: TaskId, outcome: TaskOutcome) -> SchedulerStep {
        self.completion_step_internal(task, outcome)
    }

    /// Clear `current_run_id` once every task is terminal.
    ///
    /// Returns `true` if this call transitioned the scheduler to idle.
    fn maybe_finish_run(&mut self) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }

        let manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);

        if manager.all_tasks_terminal() {
            info!(
                run_id = self.current_run_id,
                "scheduler: all tasks terminal; rebuild finished"
            );
            self.current_run_id = None;
            true
        } else {
            false
        }
    }

    fn trigger_step_internal(&mut self, task: TaskId) -> SchedulerStep {
        if self.current_run_id.is_none() {
            debug!(task = %task, "trigger with no active run; implicitly starting a new run");
            self.start_new_run();
        }

        if self.tasks.contains_key(&task) {
            let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
            manager.mark_task_and_dependents_pending(task);
        } else {
            warn!(task = %task, "trigger for task outside the watch graph; ignoring");
        }

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        let newly_scheduled = manager.collect_new_ready_tasks();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished,
        }
    }

    fn completion_step_internal(&mut self, task: TaskId, outcome: TaskOutcome) -> SchedulerStep {
        let Some(run_id) = self.current_run_id else {
            warn!(task = %task, "completion with no active run; ignoring");
            return SchedulerStep::empty();
        };

        let mut newly_scheduled = Vec::new();
        let mut newly_failed = Vec::new();

        match self.tasks.get_mut(&task) {
            Some(info) => match outcome {
                TaskOutcome::Success => {
                    info.run_state = Some(RunState::DoneSuccess);
                    info.last_successful_run = Some(run_id);
                    debug!(task = %task, run_id, "task completed successfully");
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    newly_scheduled.extend(manager.collect_new_ready_tasks());
                }
                TaskOutcome::Failed => {
                    info.run_state = Some(RunState::DoneFailed);
                    info.last_failed_run = Some(run_id);
                    warn!(task = %task, run_id, "task failed; skipping its dependents in this run");
                    newly_failed.push(task);
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    newly_failed.append(&mut manager.mark_dependents_failed(task));
                }
            },
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
            }
        }

        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            run_just_finished,
        }
    }
}
