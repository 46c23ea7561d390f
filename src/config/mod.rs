// src/config/mod.rs

//! Configuration loading and validation for sitepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate the build plan and global settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default, DEFAULT_CONFIG_FILE};
pub use model::{
    ConfigFile, FaviconSection, FontsSection, ImagesSection, OutputSection, PipelineSection,
    RawConfigFile, ScriptsSection, ServerSection, SpritesSection, StylesSection,
    TemplatesSection, WatchSection,
};
