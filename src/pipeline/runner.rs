// src/pipeline/runner.rs

use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::errors::{Result, SitepipeError, TaskError};
use crate::exec::run_blocking;
use crate::pipeline::BuildPlan;
use crate::tasks::{TaskReport, TaskSet};
use crate::types::TaskId;

/// Execute the plan stage by stage.
///
/// Tasks of one stage run concurrently on the blocking pool; the next stage
/// starts only after every task of the current one has succeeded. The first
/// failure aborts the build with [`SitepipeError::TaskFailed`].
pub async fn run_stages(plan: &BuildPlan, tasks: &TaskSet) -> Result<()> {
    let started = Instant::now();

    for (idx, stage) in plan.stages().iter().enumerate() {
        let stage_started = Instant::now();
        info!(stage = idx + 1, tasks = ?stage, "starting stage");

        let mut set: JoinSet<(TaskId, std::result::Result<TaskReport, TaskError>)> = JoinSet::new();

        for id in stage {
            let task = tasks
                .get(*id)
                .ok_or_else(|| SitepipeError::TaskNotFound(id.to_string()))?;
            let id = *id;
            set.spawn(async move { (id, run_blocking(task).await) });
        }

        while let Some(joined) = set.join_next().await {
            let (task, result) = joined.map_err(anyhow::Error::from)?;
            if let Err(source) = result {
                debug!(task = %task, "aborting remaining tasks of the stage");
                set.abort_all();
                return Err(SitepipeError::TaskFailed { task, source });
            }
        }

        info!(
            stage = idx + 1,
            elapsed_ms = stage_started.elapsed().as_millis() as u64,
            "stage complete"
        );
    }

    info!(elapsed_ms = started.elapsed().as_millis() as u64, "build complete");
    Ok(())
}

/// Run a single task in isolation, ignoring the plan's ordering.
///
/// Only tasks of the configured plan exist; asking for any other one names
/// what the config is missing.
pub async fn run_single(id: TaskId, tasks: &TaskSet) -> Result<TaskReport> {
    let task = tasks
        .get(id)
        .ok_or_else(|| SitepipeError::TaskNotFound(not_in_plan(id)))?;
    run_blocking(task)
        .await
        .map_err(|source| SitepipeError::TaskFailed { task: id, source })
}

fn not_in_plan(id: TaskId) -> String {
    let needs = match id {
        TaskId::Favicon => "a [favicon] section and a place in [pipeline] stages",
        _ => "a place in [pipeline] stages",
    };
    format!("{id} (not in the configured build plan; it needs {needs})")
}
