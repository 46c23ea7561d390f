use std::sync::{Arc, Mutex};
use std::time::Duration;

use sitepipe::errors::TaskError;
use sitepipe::tasks::{AssetTask, TaskReport};
use sitepipe::types::TaskId;

/// Shared log of `(task, "start" | "end")` markers.
pub type RunLog = Arc<Mutex<Vec<(TaskId, &'static str)>>>;

/// An `AssetTask` that only records when it starts and ends.
#[derive(Debug)]
pub struct RecordingTask {
    id: TaskId,
    log: RunLog,
    delay: Duration,
    fail: bool,
    watch: Vec<String>,
}

impl RecordingTask {
    pub fn new(id: TaskId, log: RunLog) -> Self {
        Self {
            id,
            log,
            delay: Duration::ZERO,
            fail: false,
            watch: Vec::new(),
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.watch.push(pattern.to_string());
        self
    }

    pub fn into_arc(self) -> Arc<dyn AssetTask> {
        Arc::new(self)
    }
}

impl AssetTask for RecordingTask {
    fn id(&self) -> TaskId {
        self.id
    }

    fn watch_patterns(&self) -> Vec<String> {
        self.watch.clone()
    }

    fn run(&self) -> Result<TaskReport, TaskError> {
        self.log.lock().unwrap().push((self.id, "start"));
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.log.lock().unwrap().push((self.id, "end"));

        if self.fail {
            return Err(TaskError::Input {
                path: self.id.to_string(),
                message: "recording task told to fail".to_string(),
            });
        }
        Ok(TaskReport::new(1))
    }
}

/// Index of the first `(task, marker)` entry in the log.
pub fn position(log: &RunLog, task: TaskId, marker: &str) -> Option<usize> {
    log.lock()
        .unwrap()
        .iter()
        .position(|(t, m)| *t == task && *m == marker)
}
