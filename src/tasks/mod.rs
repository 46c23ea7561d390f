// src/tasks/mod.rs

//! Transformation tasks.
//!
//! Every task is a stateless black box: it reads the files matched by its
//! input globs and writes into its own subtree of the output directory. The
//! orchestrator only sees the [`AssetTask`] trait; what happens inside `run`
//! is up to the collaborator library wrapped by each task.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::errors::TaskError;
use crate::types::TaskId;

pub mod clean;
pub mod favicon;
pub mod files;
pub mod fonts;
pub mod images;
pub mod scripts;
pub mod sprites;
pub mod styles;
pub mod templates;

pub use clean::CleanTask;
pub use favicon::FaviconTask;
pub use fonts::FontsTask;
pub use images::ImagesTask;
pub use scripts::ScriptsTask;
pub use sprites::SpritesTask;
pub use styles::StylesTask;
pub use templates::TemplatesTask;

/// Summary of a successful task run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskReport {
    /// Number of files written.
    pub outputs: usize,
}

impl TaskReport {
    pub fn new(outputs: usize) -> Self {
        Self { outputs }
    }
}

/// A named transformation step.
///
/// `run` is synchronous and may block on IO or CPU; callers put it on the
/// blocking pool. Implementations must be idempotent and safe to re-run.
pub trait AssetTask: Send + Sync + fmt::Debug {
    fn id(&self) -> TaskId;

    /// Globs (relative to the project root) whose changes re-run this task.
    fn watch_patterns(&self) -> Vec<String>;

    /// Globs removed from the watch set, e.g. files the pipeline writes itself.
    fn exclude_patterns(&self) -> Vec<String> {
        Vec::new()
    }

    fn run(&self) -> Result<TaskReport, TaskError>;
}

/// Shared, read-only environment handed to every task.
#[derive(Debug)]
pub struct TaskContext {
    root: PathBuf,
    config: Arc<ConfigFile>,
    live_reload_port: Option<u16>,
}

impl TaskContext {
    pub fn new(
        root: impl Into<PathBuf>,
        config: Arc<ConfigFile>,
        live_reload_port: Option<u16>,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            live_reload_port,
        }
    }

    /// Project root; every source glob is relative to it.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Live-reload port, set only in development mode.
    pub fn live_reload_port(&self) -> Option<u16> {
        self.live_reload_port
    }

    pub fn source(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.config.output.dir)
    }

    /// Destination directory for a `dest` value relative to the output dir.
    pub fn output(&self, dest: &str) -> PathBuf {
        if dest.is_empty() {
            self.output_dir()
        } else {
            self.output_dir().join(dest)
        }
    }
}

/// The set of tasks a pipeline can dispatch, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    tasks: BTreeMap<TaskId, Arc<dyn AssetTask>>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate every task named by the configured build plan.
    pub fn from_config(
        config: Arc<ConfigFile>,
        root: impl Into<PathBuf>,
        live_reload_port: Option<u16>,
    ) -> Self {
        let ctx = Arc::new(TaskContext::new(root, Arc::clone(&config), live_reload_port));

        let mut set = TaskSet::new();
        for id in config.stages().iter().flatten().copied() {
            let task: Arc<dyn AssetTask> = match id {
                TaskId::Clean => Arc::new(CleanTask::new(Arc::clone(&ctx))),
                TaskId::Sprites => Arc::new(SpritesTask::new(Arc::clone(&ctx))),
                TaskId::Favicon => Arc::new(FaviconTask::new(Arc::clone(&ctx))),
                TaskId::Styles => Arc::new(StylesTask::new(Arc::clone(&ctx))),
                TaskId::Templates => Arc::new(TemplatesTask::new(Arc::clone(&ctx))),
                TaskId::Scripts => Arc::new(ScriptsTask::new(Arc::clone(&ctx))),
                TaskId::Fonts => Arc::new(FontsTask::new(Arc::clone(&ctx))),
                TaskId::Images => Arc::new(ImagesTask::new(Arc::clone(&ctx))),
            };
            set.insert(task);
        }
        set
    }

    pub fn insert(&mut self, task: Arc<dyn AssetTask>) {
        self.tasks.insert(task.id(), task);
    }

    pub fn get(&self, id: TaskId) -> Option<Arc<dyn AssetTask>> {
        self.tasks.get(&id).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn AssetTask>> {
        self.tasks.values()
    }
}
