// src/tasks/files.rs

//! Input enumeration and output helpers shared by the tasks.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::TaskError;

/// A source file matched by an input glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFile {
    /// Path on disk.
    pub path: PathBuf,
    /// Path relative to the static prefix of the glob that matched it.
    /// Copies keep this layout below their destination directory.
    pub rel: PathBuf,
}

fn is_glob_component(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Leading literal directories of a glob.
///
/// `src/assets/fonts/**/*` gives `src/assets/fonts`; a plain file path such
/// as `src/assets/styles/main.scss` gives its parent directory.
pub fn static_prefix(pattern: &str) -> PathBuf {
    let parts: Vec<&str> = pattern.split('/').collect();
    let literal = parts.iter().take_while(|p| !is_glob_component(p)).count();

    let take = if literal == parts.len() {
        literal.saturating_sub(1)
    } else {
        literal
    };

    parts[..take].iter().filter(|p| !p.is_empty()).collect()
}

/// Expand globs relative to `root` into a sorted, de-duplicated file list.
pub fn expand(root: &Path, patterns: &[String]) -> Result<Vec<MatchedFile>, TaskError> {
    let mut found: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

    for pattern in patterns {
        let prefix = root.join(static_prefix(pattern));
        let full = if root.as_os_str().is_empty() {
            pattern.clone()
        } else {
            format!("{}/{}", glob::Pattern::escape(&root.to_string_lossy()), pattern)
        };

        for entry in glob::glob(&full)? {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                TaskError::io(path, e.into_error())
            })?;

            if !path.is_file() {
                continue;
            }

            let rel = match path.strip_prefix(&prefix) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => path.file_name().map(PathBuf::from).unwrap_or_default(),
            };
            found.entry(path).or_insert(rel);
        }
    }

    debug!(?patterns, matched = found.len(), "expanded input globs");
    Ok(found
        .into_iter()
        .map(|(path, rel)| MatchedFile { path, rel })
        .collect())
}

pub fn read(path: &Path) -> Result<Vec<u8>, TaskError> {
    fs::read(path).map_err(|e| TaskError::io(path, e))
}

pub fn read_to_string(path: &Path) -> Result<String, TaskError> {
    fs::read_to_string(path).map_err(|e| TaskError::io(path, e))
}

/// Write `bytes` to `path`, creating parent directories.
pub fn write(path: &Path, bytes: impl AsRef<[u8]>) -> Result<(), TaskError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| TaskError::io(path, e))
}

/// Like [`write`], but leaves the file untouched when the content is equal.
///
/// Returns whether the file was written.
pub fn write_if_changed(path: &Path, bytes: impl AsRef<[u8]>) -> Result<bool, TaskError> {
    let bytes = bytes.as_ref();
    if let Ok(existing) = fs::read(path) {
        if existing == bytes {
            return Ok(false);
        }
    }
    write(path, bytes)?;
    Ok(true)
}

/// Copy matched files below `dest`, keeping their relative layout.
pub fn copy_matched(files: &[MatchedFile], dest: &Path) -> Result<usize, TaskError> {
    for file in files {
        let target = dest.join(&file.rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
        }
        fs::copy(&file.path, &target).map_err(|e| TaskError::io(&file.path, e))?;
    }
    Ok(files.len())
}

/// Lower-cased file extension, if any.
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}
