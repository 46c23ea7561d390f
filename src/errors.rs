// src/errors.rs

//! Crate-wide error types.

use thiserror::Error;

use crate::types::TaskId;

#[derive(Error, Debug)]
pub enum SitepipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in build plan: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("task '{task}' failed: {source}")]
    TaskFailed {
        task: TaskId,
        #[source]
        source: TaskError,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Error raised by a single transformation task.
///
/// Errors stay local to the task that raised them; the orchestrator decides
/// what a failure means for the rest of the run.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("style error: {0}")]
    Style(String),

    #[error("image error on {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("command `{cmd}` failed: {message}")]
    Command { cmd: String, message: String },

    #[error("invalid input {path}: {message}")]
    Input { path: String, message: String },

    #[error("task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        TaskError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Input errors come from malformed sources or a crashed collaborator;
    /// everything else is a filesystem problem.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, TaskError::Io { .. })
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SitepipeError>;
