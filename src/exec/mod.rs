// src/exec/mod.rs

//! Task execution layer.
//!
//! Runs the synchronous task bodies on Tokio's blocking pool and reports
//! back to the orchestration runtime via `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the loop that serialises instances per task.
//! - [`task_runner`] runs a single task and classifies its failure.
//! - [`command`] runs external tools through the platform shell.
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RealExecutorBackend` used in production, which tests replace with a
//!   fake implementation.

pub mod backend;
pub mod command;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
pub use task_runner::run_blocking;
