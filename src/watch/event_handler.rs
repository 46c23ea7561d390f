// src/watch/event_handler.rs

//! Event processing logic for file system changes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::DagGraph;
use crate::engine::{RuntimeEvent, TriggerReason};
use crate::types::TaskId;
use crate::watch::hash::{compute_hash_for_paths, ContentHashes};
use crate::watch::patterns::{collect_matching_files, relative_str, WatchBinding};

/// Process a single changed path and trigger the bound tasks.
///
/// 1. Find all bindings whose patterns match the path.
/// 2. Keep only tasks with no matching ancestor in the ordering graph; the
///    scheduler pulls in their dependents anyway.
/// 3. With `use_hash`, skip tasks whose watched content is unchanged.
/// 4. Send trigger events to the runtime.
///
/// Returns the tasks that were triggered.
pub async fn process_file_change(
    root: &Path,
    path: &Path,
    bindings: &Arc<Vec<WatchBinding>>,
    graph: &DagGraph,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    hashes: Option<Arc<Mutex<ContentHashes>>>,
) -> Vec<TaskId> {
    let Some(rel_str) = relative_str(root, path) else {
        warn!("could not relativize path {:?} against root {:?}", path, root);
        return Vec::new();
    };

    let matching: Vec<TaskId> = bindings
        .iter()
        .filter(|b| b.matches(&rel_str))
        .map(|b| b.task())
        .collect();

    if matching.is_empty() {
        return Vec::new();
    }

    let roots: Vec<TaskId> = matching
        .iter()
        .copied()
        .filter(|task| !graph.has_ancestor_in(*task, &matching))
        .collect();

    debug!(rel = %rel_str, ?roots, "watch match; triggering root tasks for this path");

    let mut triggered = Vec::new();
    for task in roots {
        if let Some(hashes) = &hashes {
            let Some(binding) = bindings.iter().find(|b| b.task() == task) else {
                continue;
            };
            if !content_changed(root, binding, Arc::clone(hashes)).await {
                println!("[sitepipe] skipping {task} (watched content unchanged; last event path '{rel_str}')");
                info!(task = %task, path = %rel_str, "hash unchanged; skipping trigger");
                continue;
            }
        }

        if let Err(err) = runtime_tx
            .send(RuntimeEvent::TaskTriggered {
                task,
                reason: TriggerReason::FileWatch,
            })
            .await
        {
            warn!("failed to send RuntimeEvent::TaskTriggered: {err}");
            return triggered;
        }
        triggered.push(task);
    }

    triggered
}

/// Whether the aggregated content of the binding's files changed since the
/// last trigger. Any error counts as a change.
async fn content_changed(
    root: &Path,
    binding: &WatchBinding,
    hashes: Arc<Mutex<ContentHashes>>,
) -> bool {
    let root: PathBuf = root.to_path_buf();
    let binding = binding.clone();
    let task = binding.task();

    tokio::task::spawn_blocking(move || {
        let hash = collect_matching_files(&root, &binding)
            .map_err(anyhow::Error::from)
            .and_then(compute_hash_for_paths);

        let hash = match hash {
            Ok(h) => h,
            Err(err) => {
                warn!(task = %task, error = %err, "failed to hash watched files; triggering anyway");
                return true;
            }
        };

        match hashes.lock() {
            Ok(mut guard) => guard.update(task, hash),
            Err(_) => {
                warn!(task = %task, "hash store mutex poisoned; triggering anyway");
                true
            }
        }
    })
    .await
    .unwrap_or(true)
}

/// Seed the hash store with the current content of every binding, so the
/// first no-op save after startup is already suppressed.
pub fn prime_hashes(root: &Path, bindings: &[WatchBinding], hashes: &mut ContentHashes) {
    for binding in bindings {
        let hash = collect_matching_files(root, binding)
            .map_err(anyhow::Error::from)
            .and_then(compute_hash_for_paths);
        match hash {
            Ok(h) => {
                hashes.update(binding.task(), h);
            }
            Err(err) => warn!(task = %binding.task(), error = %err, "failed to prime content hash"),
        }
    }
}
