// src/exec/executor_loop.rs

//! Main executor loop that manages running task instances.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::exec::task_runner::run_task;
use crate::tasks::TaskSet;
use crate::types::TaskId;

/// Spawn the background executor loop.
///
/// The returned sender is what `RealExecutorBackend` forwards scheduled tasks
/// into. Each scheduled task runs in its own Tokio task, and **per task id
/// there is never more than one instance running at the same time**: a task
/// scheduled while its previous instance is still running waits for that
/// instance before starting.
pub fn spawn_executor(
    tasks: TaskSet,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut active: HashMap<TaskId, JoinHandle<()>> = HashMap::new();

        while let Some(scheduled) = rx.recv().await {
            handle_scheduled_task(scheduled, &tasks, &mut active, &runtime_tx).await;
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}

async fn handle_scheduled_task(
    scheduled: ScheduledTask,
    tasks: &TaskSet,
    active: &mut HashMap<TaskId, JoinHandle<()>>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) {
    let Some(task) = tasks.get(scheduled.task) else {
        warn!(task = %scheduled.task, run_id = scheduled.run_id, "no such task in the task set");
        let _ = runtime_tx
            .send(RuntimeEvent::TaskCompleted {
                task: scheduled.task,
                outcome: TaskOutcome::Failed,
            })
            .await;
        return;
    };

    let previous = active
        .remove(&scheduled.task)
        .filter(|handle| !handle.is_finished());
    if previous.is_some() {
        debug!(
            task = %scheduled.task,
            run_id = scheduled.run_id,
            "previous instance still running; new instance will wait for it"
        );
    }

    let rt_tx = runtime_tx.clone();
    let handle = tokio::spawn(async move {
        if let Some(previous) = previous {
            let _ = previous.await;
        }
        run_task(task, scheduled, rt_tx).await;
    });

    active.insert(scheduled.task, handle);
}
