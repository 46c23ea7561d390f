// src/pipeline/mod.rs

//! Full-build orchestration: the declared build plan and the stage runner.

pub mod plan;
pub mod runner;

pub use plan::BuildPlan;
pub use runner::{run_single, run_stages};
