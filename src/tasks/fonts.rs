// src/tasks/fonts.rs

use std::sync::Arc;

use crate::errors::TaskError;
use crate::tasks::files::{copy_matched, expand};
use crate::tasks::{AssetTask, TaskContext, TaskReport};
use crate::types::TaskId;

#[derive(Debug)]
pub struct FontsTask {
    ctx: Arc<TaskContext>,
}

impl FontsTask {
    pub fn new(ctx: Arc<TaskContext>) -> Self {
        Self { ctx }
    }
}

impl AssetTask for FontsTask {
    fn id(&self) -> TaskId {
        TaskId::Fonts
    }

    fn watch_patterns(&self) -> Vec<String> {
        self.ctx.config().fonts.src.clone()
    }

    fn run(&self) -> Result<TaskReport, TaskError> {
        let fonts = &self.ctx.config().fonts;
        let files = expand(self.ctx.root(), &fonts.src)?;
        let copied = copy_matched(&files, &self.ctx.output(&fonts.dest))?;
        Ok(TaskReport::new(copied))
    }
}
