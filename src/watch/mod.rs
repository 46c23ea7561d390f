// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the watch binding table (`watch` / `exclude` globs per task).
//! - Wiring up a debounced cross-platform filesystem watcher.
//! - Optionally hashing watched content so saves without changes don't
//!   trigger rebuilds.
//!
//! It only turns filesystem changes into task-level triggers; the ordering
//! of the resulting rebuilds is the scheduler's job.

pub mod event_handler;
pub mod hash;
pub mod patterns;
pub mod watcher;

pub use hash::{compute_hash_for_paths, ContentHashes};
pub use patterns::{build_bindings, WatchBinding};
pub use watcher::{spawn_watcher, WatchOptions, WatcherHandle};
