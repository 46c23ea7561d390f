// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Async shell around [`CoreRuntime`].
///
/// Reads events from `event_rx`, feeds them to the core and hands the tasks
/// it schedules to an [`ExecutorBackend`]. All rebuild semantics live in the
/// core.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop; returns on shutdown, on `exit_when_idle`, or when
    /// every event sender is gone.
    pub async fn run(mut self) -> Result<()> {
        info!("watching for changes");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("stopping rebuild loop");
                return Ok(());
            }
        }

        info!("runtime event channel closed; exiting");
        Ok(())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => self.spawn_ready(tasks).await,
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
                Ok(())
            }
        }
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let ids: Vec<_> = tasks.iter().map(|t| t.task.as_str()).collect();
        debug!(?ids, run_id = tasks[0].run_id, "dispatching ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
