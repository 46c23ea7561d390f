// src/engine/mod.rs

//! Watch-time rebuild engine.
//!
//! This module ties together:
//! - the ordering scheduler
//! - the trigger queue (what happens to triggers that overlap a running
//!   rebuild)
//! - the runtime event loop that reacts to:
//!   - file-watch triggers
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::types::TaskId;

/// Outcome of a task run as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit the runtime once the scheduler is idle and nothing is queued.
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the watcher and the executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    TaskTriggered { task: TaskId, reason: TriggerReason },
    TaskCompleted { task: TaskId, outcome: TaskOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
