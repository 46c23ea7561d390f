// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Name of the config file looked up in the project root.
pub const DEFAULT_CONFIG_FILE: &str = "Sitepipe.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (plan correctness, etc.). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it into a [`ConfigFile`].
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls) and the
///   variant's default build plan.
/// - Checks stage layout, ordering constraints and cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Like [`load_and_validate`], but a missing *default* config file falls back
/// to the built-in defaults. An explicitly named file must exist.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !path.exists() && path.file_name().is_some_and(|n| n == DEFAULT_CONFIG_FILE) {
        info!(?path, "no config file found; using built-in defaults");
        return ConfigFile::defaults();
    }
    load_and_validate(path)
}

