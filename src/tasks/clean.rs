// src/tasks/clean.rs

use std::fs;
use std::io;
use std::sync::Arc;

use tracing::info;

use crate::errors::TaskError;
use crate::tasks::{AssetTask, TaskContext, TaskReport};
use crate::types::TaskId;

/// Deletes the whole output directory. A missing directory is not an error.
#[derive(Debug)]
pub struct CleanTask {
    ctx: Arc<TaskContext>,
}

impl CleanTask {
    pub fn new(ctx: Arc<TaskContext>) -> Self {
        Self { ctx }
    }
}

impl AssetTask for CleanTask {
    fn id(&self) -> TaskId {
        TaskId::Clean
    }

    fn watch_patterns(&self) -> Vec<String> {
        Vec::new()
    }

    fn run(&self) -> Result<TaskReport, TaskError> {
        let dir = self.ctx.output_dir();
        match fs::remove_dir_all(&dir) {
            Ok(()) => info!(dir = %dir.display(), "removed output directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(TaskError::io(&dir, e)),
        }
        Ok(TaskReport::default())
    }
}
