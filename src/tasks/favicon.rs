// src/tasks/favicon.rs

use std::sync::Arc;

use crate::errors::TaskError;
use crate::tasks::files::{copy_matched, expand};
use crate::tasks::{AssetTask, TaskContext, TaskReport};
use crate::types::TaskId;

/// Copies favicon files into the output root. Only instantiated when the
/// configuration has a `[favicon]` section.
#[derive(Debug)]
pub struct FaviconTask {
    ctx: Arc<TaskContext>,
}

impl FaviconTask {
    pub fn new(ctx: Arc<TaskContext>) -> Self {
        Self { ctx }
    }
}

impl AssetTask for FaviconTask {
    fn id(&self) -> TaskId {
        TaskId::Favicon
    }

    fn watch_patterns(&self) -> Vec<String> {
        self.ctx
            .config()
            .favicon
            .as_ref()
            .map(|f| f.src.clone())
            .unwrap_or_default()
    }

    fn run(&self) -> Result<TaskReport, TaskError> {
        let Some(favicon) = self.ctx.config().favicon.as_ref() else {
            return Ok(TaskReport::default());
        };
        let files = expand(self.ctx.root(), &favicon.src)?;
        let copied = copy_matched(&files, &self.ctx.output(&favicon.dest))?;
        Ok(TaskReport::new(copied))
    }
}
