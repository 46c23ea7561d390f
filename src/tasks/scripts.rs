// src/tasks/scripts.rs

//! Script output: either an external bundler run on a single entry point,
//! or a plain concatenation of the sources with an optional minifier pass.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::errors::TaskError;
use crate::exec::command::run_shell;
use crate::tasks::files::{expand, read_to_string, write};
use crate::tasks::{AssetTask, TaskContext, TaskReport};
use crate::types::{ScriptMode, TaskId};

#[derive(Debug)]
pub struct ScriptsTask {
    ctx: Arc<TaskContext>,
}

impl ScriptsTask {
    pub fn new(ctx: Arc<TaskContext>) -> Self {
        Self { ctx }
    }

    fn bundle(&self, out: &Path) -> Result<(), TaskError> {
        let section = &self.ctx.config().scripts;
        let entry = self.ctx.source(&section.entry);

        let cmd = section
            .bundler
            .replace("{entry}", &entry.to_string_lossy())
            .replace("{output}", &out.to_string_lossy());
        run_shell(&cmd, self.ctx.root())
    }

    fn concat(&self, out: &Path) -> Result<(), TaskError> {
        let section = &self.ctx.config().scripts;
        let sources = expand(self.ctx.root(), &section.src)?;

        let mut parts = Vec::with_capacity(sources.len());
        for source in &sources {
            parts.push(read_to_string(&source.path)?);
        }
        let joined = parts.join(";\n");
        debug!(files = sources.len(), bytes = joined.len(), "concatenated scripts");

        let Some(minifier) = &section.minifier else {
            return write(out, joined);
        };

        let staging = out.with_extension("concat.js");
        write(&staging, joined)?;

        let cmd = minifier
            .replace("{input}", &staging.to_string_lossy())
            .replace("{output}", &out.to_string_lossy());
        let result = run_shell(&cmd, self.ctx.root());

        fs::remove_file(&staging).map_err(|e| TaskError::io(&staging, e))?;
        result
    }
}

impl AssetTask for ScriptsTask {
    fn id(&self) -> TaskId {
        TaskId::Scripts
    }

    fn watch_patterns(&self) -> Vec<String> {
        self.ctx.config().scripts.src.clone()
    }

    fn run(&self) -> Result<TaskReport, TaskError> {
        let section = &self.ctx.config().scripts;
        let out_dir = self.ctx.output(&section.dest);
        fs::create_dir_all(&out_dir).map_err(|e| TaskError::io(&out_dir, e))?;
        let out = out_dir.join(&section.output);

        match self.ctx.config().script_mode() {
            ScriptMode::Bundle => self.bundle(&out)?,
            ScriptMode::Concat => self.concat(&out)?,
        }
        Ok(TaskReport::new(1))
    }
}
