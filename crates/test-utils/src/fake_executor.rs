use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use sitepipe::dag::ScheduledTask;
use sitepipe::engine::{RuntimeEvent, TaskOutcome};
use sitepipe::errors::Result;
use sitepipe::exec::ExecutorBackend;
use sitepipe::types::TaskId;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which tasks were "run"
/// - immediately reports `TaskCompleted` for each scheduled task, failing
///   the tasks registered with [`FakeExecutor::failing`].
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<ScheduledTask>>>,
    failing: HashSet<TaskId>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<ScheduledTask>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, task: TaskId) -> Self {
        self.failing.insert(task);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t);
                }

                let outcome = if failing.contains(&t.task) {
                    TaskOutcome::Failed
                } else {
                    TaskOutcome::Success
                };

                tx.send(RuntimeEvent::TaskCompleted {
                    task: t.task,
                    outcome,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}

/// Task ids in dispatch order.
pub fn executed_ids(executed: &Arc<Mutex<Vec<ScheduledTask>>>) -> Vec<TaskId> {
    executed.lock().unwrap().iter().map(|t| t.task).collect()
}
