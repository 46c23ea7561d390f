// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::TaskError;
use crate::tasks::files::{expand, static_prefix};
use crate::tasks::TaskSet;
use crate::types::TaskId;

/// Compiled watch/exclude globs for one task.
///
/// Patterns are relative to the project root; the watcher passes relative
/// paths (e.g. `"src/assets/js/app.js"`) into [`WatchBinding::matches`].
#[derive(Clone)]
pub struct WatchBinding {
    task: TaskId,
    watch: Vec<String>,
    exclude: Vec<String>,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("task", &self.task)
            .field("watch", &self.watch)
            .field("exclude", &self.exclude)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn new(task: TaskId, watch: Vec<String>, exclude: Vec<String>) -> Result<Self> {
        let watch_set = build_globset(&watch)
            .with_context(|| format!("building watch globset for task {task}"))?;

        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(&exclude)
                    .with_context(|| format!("building exclude globset for task {task}"))?,
            )
        };

        Ok(Self {
            task,
            watch,
            exclude,
            watch_set,
            exclude_set,
        })
    }

    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn watch_patterns(&self) -> &[String] {
        &self.watch
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude
    }

    /// Returns true if this binding is interested in `rel_path`.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// Directories that must be watched for this binding to see changes.
    pub fn watch_roots(&self, root: &Path) -> Vec<PathBuf> {
        self.watch
            .iter()
            .map(|pattern| root.join(static_prefix(pattern)))
            .collect()
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// One binding per task that declares watch patterns.
///
/// Tasks without patterns (`clean`) get no binding.
pub fn build_bindings(tasks: &TaskSet) -> Result<Vec<WatchBinding>> {
    tasks
        .iter()
        .map(|task| (task.id(), task.watch_patterns(), task.exclude_patterns()))
        .filter(|(_, watch, _)| !watch.is_empty())
        .map(|(id, watch, exclude)| WatchBinding::new(id, watch, exclude))
        .collect()
}

/// All files under `root` currently matched by this binding, sorted.
///
/// Used to compute content hashes when `use_hash` is enabled.
pub fn collect_matching_files(root: &Path, binding: &WatchBinding) -> Result<Vec<PathBuf>, TaskError> {
    let files = expand(root, &binding.watch)?;
    Ok(files
        .into_iter()
        .filter(|f| {
            f.path
                .strip_prefix(root)
                .map(|rel| binding.matches(&rel.to_string_lossy().replace('\\', "/")))
                .unwrap_or(false)
        })
        .map(|f| f.path)
        .collect())
}

/// Reduce a set of directories to the minimal set of recursive watch roots.
pub fn collapse_watch_roots(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort();
    paths.dedup();

    let mut collapsed: Vec<PathBuf> = Vec::new();
    for path in paths {
        if collapsed.last().is_some_and(|last| path.starts_with(last)) {
            continue;
        }
        collapsed.push(path);
    }
    collapsed
}

/// Closest existing directory at or above `dir`, never leaving `root`.
///
/// A source directory created after startup is then still seen through the
/// recursive watch on its parent.
pub fn nearest_existing_dir(root: &Path, dir: &Path) -> PathBuf {
    dir.ancestors()
        .take_while(|candidate| candidate.starts_with(root))
        .find(|candidate| candidate.is_dir())
        .map_or_else(|| root.to_path_buf(), Path::to_path_buf)
}

/// `path` relative to `root` with `/` separators, as matched by bindings.
///
/// Falls back to comparing canonical paths, since the watcher may report a
/// different absolute prefix for the same directory (symlinks, `/private`
/// on macOS).
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let to_str = |rel: &Path| rel.to_string_lossy().replace('\\', "/");

    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_str(rel));
    }

    let root = root.canonicalize().ok()?;
    let path = path.canonicalize().ok()?;
    path.strip_prefix(&root).ok().map(to_str)
}
