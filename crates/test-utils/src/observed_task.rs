use std::sync::Arc;

use tokio::sync::mpsc;

use sitepipe::errors::TaskError;
use sitepipe::tasks::{AssetTask, TaskReport};
use sitepipe::types::TaskId;

/// Wraps a real task and reports `(task, succeeded)` after every run.
///
/// Lets a test wait for completions of a runtime that keeps running.
#[derive(Debug)]
pub struct ObservedTask {
    inner: Arc<dyn AssetTask>,
    tx: mpsc::UnboundedSender<(TaskId, bool)>,
}

impl ObservedTask {
    pub fn wrap(inner: Arc<dyn AssetTask>) -> (Arc<dyn AssetTask>, mpsc::UnboundedReceiver<(TaskId, bool)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { inner, tx }), rx)
    }
}

impl AssetTask for ObservedTask {
    fn id(&self) -> TaskId {
        self.inner.id()
    }

    fn watch_patterns(&self) -> Vec<String> {
        self.inner.watch_patterns()
    }

    fn exclude_patterns(&self) -> Vec<String> {
        self.inner.exclude_patterns()
    }

    fn run(&self) -> Result<TaskReport, TaskError> {
        let result = self.inner.run();
        let _ = self.tx.send((self.inner.id(), result.is_ok()));
        result
    }
}
