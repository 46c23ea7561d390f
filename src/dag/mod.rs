// src/dag/mod.rs

//! Ordering graph and watch-time scheduling.
//!
//! - [`graph`] holds the ordering constraints between tasks.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   triggered tasks are ready and when dependents can follow.
//! - [`task_info`] provides task metadata and scheduled task types.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::DagGraph;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledTask, TaskRunState};
