// src/tasks/styles.rs

use std::io;
use std::sync::Arc;

use tracing::debug;

use crate::errors::TaskError;
use crate::tasks::files::write;
use crate::tasks::sprites::{PNG_PARTIAL, SVG_PARTIAL};
use crate::tasks::{AssetTask, TaskContext, TaskReport};
use crate::types::TaskId;

/// Compiles the single stylesheet entry with `grass` into compressed CSS.
///
/// The output file is only replaced after a successful compile.
#[derive(Debug)]
pub struct StylesTask {
    ctx: Arc<TaskContext>,
}

impl StylesTask {
    pub fn new(ctx: Arc<TaskContext>) -> Self {
        Self { ctx }
    }
}

impl AssetTask for StylesTask {
    fn id(&self) -> TaskId {
        TaskId::Styles
    }

    fn watch_patterns(&self) -> Vec<String> {
        self.ctx.config().styles.watch.clone()
    }

    /// Sprite partials are written by the sprites task, which already
    /// re-runs styles after itself.
    fn exclude_patterns(&self) -> Vec<String> {
        let partials = self.ctx.config().sprites.partials.trim_end_matches('/');
        vec![
            format!("{partials}/{SVG_PARTIAL}"),
            format!("{partials}/{PNG_PARTIAL}"),
        ]
    }

    fn run(&self) -> Result<TaskReport, TaskError> {
        let section = &self.ctx.config().styles;
        let entry = self.ctx.source(&section.main);

        if !entry.is_file() {
            return Err(TaskError::io(
                &entry,
                io::Error::new(io::ErrorKind::NotFound, "stylesheet entry not found"),
            ));
        }

        let mut options = grass::Options::default().style(grass::OutputStyle::Compressed);
        if let Some(dir) = entry.parent() {
            options = options.load_path(dir);
        }
        for extra in &section.load_paths {
            options = options.load_path(self.ctx.source(extra));
        }

        let css = grass::from_path(&entry, &options).map_err(|e| TaskError::Style(e.to_string()))?;
        debug!(entry = %entry.display(), bytes = css.len(), "compiled stylesheet");

        let out = self.ctx.output(&section.dest).join(&section.output);
        write(&out, css)?;
        Ok(TaskReport::new(1))
    }
}
