// src/exec/task_runner.rs

//! Individual task runner.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::TaskError;
use crate::tasks::{AssetTask, TaskReport};

/// Run a task's synchronous body on the blocking pool.
///
/// A panic inside the task is turned into [`TaskError::Panicked`] so a broken
/// collaborator cannot take the orchestrator down with it.
pub async fn run_blocking(task: Arc<dyn AssetTask>) -> Result<TaskReport, TaskError> {
    let id = task.id();
    let started = Instant::now();

    let result = tokio::task::spawn_blocking(move || task.run())
        .await
        .unwrap_or_else(|join_err| Err(TaskError::Panicked(join_err.to_string())));

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(report) => info!(task = %id, outputs = report.outputs, elapsed_ms, "task finished"),
        Err(err) => error!(
            task = %id,
            elapsed_ms,
            input_error = err.is_input_error(),
            error = %err,
            "task failed"
        ),
    }
    result
}

/// Run a scheduled task for the watch runtime and report its completion.
///
/// Failures are logged, printed as a one-line console notification and
/// reported as [`TaskOutcome::Failed`]; they never stop the runtime.
pub async fn run_task(
    task: Arc<dyn AssetTask>,
    scheduled: ScheduledTask,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    info!(task = %scheduled.task, run_id = scheduled.run_id, "starting task");

    let outcome = match run_blocking(task).await {
        Ok(_) => TaskOutcome::Success,
        Err(err) => {
            notify_failure(&scheduled, &err);
            TaskOutcome::Failed
        }
    };

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: scheduled.task,
            outcome,
        })
        .await
        .is_err()
    {
        info!(task = %scheduled.task, "runtime gone; dropping completion event");
    }
}

fn notify_failure(scheduled: &ScheduledTask, err: &TaskError) {
    let kind = if err.is_input_error() {
        "input error"
    } else {
        "filesystem error"
    };
    eprintln!("[sitepipe] {} failed ({kind}): {err}", scheduled.task);
}
