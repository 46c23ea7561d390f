// src/watch/hash.rs

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::types::TaskId;

/// Compute the hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Compute a deterministic hash over the names and contents of the given
/// files. Order of `paths` does not matter.
pub fn compute_hash_for_paths<I, P>(paths: I) -> Result<String>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut hasher = Hasher::new();

    let mut paths_vec: Vec<PathBuf> = paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
    paths_vec.sort();

    for path in paths_vec {
        if path.is_file() {
            hasher.update(path.to_string_lossy().as_bytes());
            hasher.update(compute_file_hash(&path)?.as_bytes());
        }
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, "computed aggregate hash");
    Ok(hash)
}

/// Last seen content hash per task, kept in memory for the process lifetime.
#[derive(Debug, Default)]
pub struct ContentHashes {
    map: HashMap<TaskId, String>,
}

impl ContentHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `hash` for `task` and report whether it differs from the
    /// previous one. The first observation always counts as a change.
    pub fn update(&mut self, task: TaskId, hash: String) -> bool {
        let changed = self.map.get(&task) != Some(&hash);
        self.map.insert(task, hash);
        changed
    }
}
