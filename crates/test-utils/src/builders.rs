use std::collections::BTreeMap;

use sitepipe::config::{ConfigFile, FaviconSection, RawConfigFile};
use sitepipe::errors::Result;
use sitepipe::types::{SpriteMode, TaskId, Variant};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults; every setter overrides one field of
/// the raw TOML model.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    raw: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variant(mut self, variant: Variant) -> Self {
        self.raw.pipeline.variant = variant;
        self
    }

    pub fn stages(mut self, stages: &[&[TaskId]]) -> Self {
        self.raw.pipeline.stages = Some(stages.iter().map(|s| s.to_vec()).collect());
        self
    }

    /// Add `task after dep`, keeping the constraints set so far.
    pub fn after(mut self, task: TaskId, dep: TaskId) -> Self {
        self.raw
            .pipeline
            .after
            .get_or_insert_with(BTreeMap::new)
            .entry(task)
            .or_default()
            .push(dep);
        self
    }

    /// Drop the default `styles after sprites` constraint.
    pub fn no_constraints(mut self) -> Self {
        self.raw.pipeline.after = Some(BTreeMap::new());
        self
    }

    pub fn output_dir(mut self, dir: &str) -> Self {
        self.raw.output.dir = dir.to_string();
        self
    }

    pub fn sprite_modes(mut self, modes: &[SpriteMode]) -> Self {
        self.raw.sprites.modes = Some(modes.to_vec());
        self
    }

    pub fn with_favicon(mut self) -> Self {
        self.raw.favicon = Some(FaviconSection::default());
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.raw.watch.use_hash = val;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.raw.images.jpeg_quality = quality;
        self
    }

    /// Direct access for fields without a dedicated setter.
    pub fn raw_mut(&mut self) -> &mut RawConfigFile {
        &mut self.raw
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.raw)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}
