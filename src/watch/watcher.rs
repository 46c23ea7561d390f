// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::DagGraph;
use crate::engine::RuntimeEvent;
use crate::watch::event_handler::{prime_hashes, process_file_change};
use crate::watch::hash::ContentHashes;
use crate::watch::patterns::{collapse_watch_roots, nearest_existing_dir, WatchBinding};

/// Handle for the filesystem watcher.
///
/// Keeps the underlying debouncer alive; dropping it stops file watching.
pub struct WatcherHandle {
    _inner: Debouncer<RecommendedWatcher, RecommendedCache>,
    roots: Vec<PathBuf>,
}

impl WatcherHandle {
    /// Directories being watched recursively.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

/// Options for [`spawn_watcher`].
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub debounce: Duration,
    pub use_hash: bool,
}

/// Spawn a debounced watcher over the static prefixes of all binding globs
/// and send `RuntimeEvent::TaskTriggered` for tasks whose bindings match a
/// changed path.
///
/// `root` is the project root against which all patterns are evaluated.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Vec<WatchBinding>,
    graph: DagGraph,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    options: WatchOptions,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    // Channel from the debouncer thread into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<PathBuf>();

    let mut debouncer = new_debouncer(options.debounce, None, move |res: DebounceEventResult| {
        match res {
            Ok(events) => {
                for de in events {
                    for path in &de.event.paths {
                        if let Err(err) = event_tx.send(path.clone()) {
                            eprintln!("sitepipe: failed to forward watch event: {err}");
                        }
                    }
                }
            }
            Err(errors) => {
                for err in errors {
                    eprintln!("sitepipe: file watch error: {err}");
                }
            }
        }
    })?;

    let candidates = bindings
        .iter()
        .flat_map(|b| b.watch_roots(&root))
        .map(|dir| {
            let existing = nearest_existing_dir(&root, &dir);
            if existing != dir {
                warn!(
                    dir = %dir.display(),
                    parent = %existing.display(),
                    "watch directory does not exist yet; watching its parent"
                );
            }
            existing
        })
        .collect();
    let mut roots = Vec::new();
    for dir in collapse_watch_roots(candidates) {
        debouncer.watch(&dir, RecursiveMode::Recursive)?;
        info!(dir = %dir.display(), "watching");
        roots.push(dir);
    }

    let bindings = Arc::new(bindings);

    let hashes = if options.use_hash {
        let mut store = ContentHashes::new();
        prime_hashes(&root, &bindings, &mut store);
        Some(Arc::new(Mutex::new(store)))
    } else {
        None
    };

    let async_root = root.clone();
    tokio::spawn(async move {
        while let Some(path) = event_rx.recv().await {
            debug!(?path, "received debounced watch event");

            // Coalesce paths that arrived in the same debounce batch.
            let mut batch = vec![path];
            while let Ok(more) = event_rx.try_recv() {
                if !batch.contains(&more) {
                    batch.push(more);
                }
            }

            for path in batch {
                process_file_change(
                    &async_root,
                    &path,
                    &bindings,
                    &graph,
                    &runtime_tx,
                    hashes.clone(),
                )
                .await;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: debouncer,
        roots,
    })
}
