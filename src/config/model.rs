// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{ScriptMode, SpriteMode, TaskId, Variant};

/// Top-level configuration as read from a TOML file.
///
/// Every section is optional; the defaults reproduce the classic project
/// layout:
///
/// ```toml
/// [pipeline]
/// variant = "bundle"
///
/// [output]
/// dir = "build"
///
/// [styles]
/// main = "src/assets/styles/main.scss"
/// watch = ["src/assets/styles/**/*.scss"]
///
/// [server]
/// port = 3000
/// ```
///
/// All source globs are relative to the project root (the directory holding
/// the config file). All `dest` values are relative to `[output].dir`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub templates: TemplatesSection,
    #[serde(default)]
    pub styles: StylesSection,
    #[serde(default)]
    pub scripts: ScriptsSection,
    #[serde(default)]
    pub sprites: SpritesSection,
    #[serde(default)]
    pub images: ImagesSection,
    #[serde(default)]
    pub fonts: FontsSection,
    #[serde(default)]
    pub favicon: Option<FaviconSection>,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub watch: WatchSection,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holders can rely on the build plan being well formed. Immutable once
/// built; tasks receive it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub variant: Variant,
    pub output: OutputSection,
    pub templates: TemplatesSection,
    pub styles: StylesSection,
    pub scripts: ScriptsSection,
    pub sprites: SpritesSection,
    pub images: ImagesSection,
    pub fonts: FontsSection,
    pub favicon: Option<FaviconSection>,
    pub server: ServerSection,
    pub watch: WatchSection,
    stages: Vec<Vec<TaskId>>,
    after: BTreeMap<TaskId, Vec<TaskId>>,
}

impl ConfigFile {
    /// Assemble a config from already-validated parts.
    pub(crate) fn new_unchecked(
        raw: RawConfigFile,
        stages: Vec<Vec<TaskId>>,
        after: BTreeMap<TaskId, Vec<TaskId>>,
    ) -> Self {
        let variant = raw.pipeline.variant;
        let favicon = match (raw.favicon, variant) {
            (Some(section), _) => Some(section),
            (None, Variant::Concat) => Some(FaviconSection::default()),
            (None, Variant::Bundle) => None,
        };

        Self {
            variant,
            output: raw.output,
            templates: raw.templates,
            styles: raw.styles,
            scripts: raw.scripts,
            sprites: raw.sprites,
            images: raw.images,
            fonts: raw.fonts,
            favicon,
            server: raw.server,
            watch: raw.watch,
            stages,
            after,
        }
    }

    /// Built-in defaults, used when no config file exists.
    pub fn defaults() -> crate::errors::Result<Self> {
        ConfigFile::try_from(RawConfigFile::default())
    }

    /// Declared build stages, in execution order.
    pub fn stages(&self) -> &[Vec<TaskId>] {
        &self.stages
    }

    /// Ordering constraints: `task -> [tasks that must run before it]`.
    pub fn after(&self) -> &BTreeMap<TaskId, Vec<TaskId>> {
        &self.after
    }

    pub fn script_mode(&self) -> ScriptMode {
        self.scripts.mode.unwrap_or(match self.variant {
            Variant::Bundle => ScriptMode::Bundle,
            Variant::Concat => ScriptMode::Concat,
        })
    }

    pub fn sprite_modes(&self) -> Vec<SpriteMode> {
        match &self.sprites.modes {
            Some(modes) => modes.clone(),
            None => match self.variant {
                Variant::Bundle => vec![SpriteMode::Css],
                Variant::Concat => vec![SpriteMode::Symbol, SpriteMode::Raster],
            },
        }
    }

    pub fn sprite_sources(&self) -> Vec<String> {
        match &self.sprites.src {
            Some(src) => src.clone(),
            None => {
                let mut src = vec!["src/assets/images/icons/*.svg".to_string()];
                if self.sprite_modes().contains(&SpriteMode::Raster) {
                    src.push("src/assets/images/icons/*.png".to_string());
                }
                src
            }
        }
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    /// `"bundle"` (default) or `"concat"`.
    #[serde(default)]
    pub variant: Variant,

    /// Explicit stage list. If `None`, the variant's default plan is used.
    #[serde(default)]
    pub stages: Option<Vec<Vec<TaskId>>>,

    /// Explicit ordering constraints, e.g. `styles = ["sprites"]`.
    ///
    /// If `None`, the default `styles after sprites` constraint applies.
    #[serde(default)]
    pub after: Option<BTreeMap<TaskId, Vec<TaskId>>>,
}

/// `[output]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Root of the deployable tree. Deleted at the start of a full build.
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "build".to_string()
}

/// `[templates]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TemplatesSection {
    /// Loader root; `{% extends %}` and `{% include %}` resolve against it.
    pub root: String,
    /// Page templates; one HTML file is rendered per match.
    pub pages: Vec<String>,
    /// Files whose change re-renders all pages (layouts, partials, pages).
    pub watch: Vec<String>,
    pub dest: String,
}

impl Default for TemplatesSection {
    fn default() -> Self {
        Self {
            root: "src/views".to_string(),
            pages: vec!["src/views/pages/*.twig".to_string()],
            watch: vec!["src/views/**/*.twig".to_string()],
            dest: String::new(),
        }
    }
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StylesSection {
    /// Single stylesheet entry point.
    pub main: String,
    pub watch: Vec<String>,
    /// Extra import search paths, besides the entry's own directory.
    pub load_paths: Vec<String>,
    pub dest: String,
    /// File name of the compiled stylesheet.
    pub output: String,
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            main: "src/assets/styles/main.scss".to_string(),
            watch: vec!["src/assets/styles/**/*.scss".to_string()],
            load_paths: Vec::new(),
            dest: "assets/styles".to_string(),
            output: "main.min.css".to_string(),
        }
    }
}

/// `[scripts]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ScriptsSection {
    /// `"bundle"` or `"concat"`; defaults from the pipeline variant.
    pub mode: Option<ScriptMode>,
    /// Bundler entry point (bundle mode).
    pub entry: String,
    /// Concatenation inputs (concat mode) and watch patterns (both modes).
    pub src: Vec<String>,
    pub dest: String,
    pub output: String,
    /// Bundler command; `{entry}` and `{output}` are substituted.
    pub bundler: String,
    /// Optional minifier for concat mode; `{input}` and `{output}` are
    /// substituted.
    pub minifier: Option<String>,
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            mode: None,
            entry: "src/assets/js/app.js".to_string(),
            src: vec!["src/assets/js/*.js".to_string()],
            dest: "assets/js".to_string(),
            output: "app.min.js".to_string(),
            bundler: "esbuild {entry} --bundle --minify --outfile={output}".to_string(),
            minifier: None,
        }
    }
}

/// `[sprites]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SpritesSection {
    /// Icon sources; defaults depend on `modes`.
    pub src: Option<Vec<String>>,
    /// Sprite flavours; defaults from the pipeline variant.
    pub modes: Option<Vec<SpriteMode>>,
    /// Output directory for sprite images, relative to `[output].dir`.
    pub dest: String,
    /// Source directory receiving the generated style partials.
    pub partials: String,
    /// Class / id prefix, e.g. `icon-` gives `.icon-home` and `#icon-home`.
    pub prefix: String,
}

impl Default for SpritesSection {
    fn default() -> Self {
        Self {
            src: None,
            modes: None,
            dest: "assets/images/icons".to_string(),
            partials: "src/assets/styles/common".to_string(),
            prefix: "icon-".to_string(),
        }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ImagesSection {
    pub src: Vec<String>,
    pub dest: String,
    /// JPEG re-encode quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            src: vec!["src/assets/images/pictures/*".to_string()],
            dest: "assets/images/pictures".to_string(),
            jpeg_quality: 80,
        }
    }
}

/// `[fonts]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FontsSection {
    pub src: Vec<String>,
    pub dest: String,
}

impl Default for FontsSection {
    fn default() -> Self {
        Self {
            src: vec!["src/assets/fonts/**/*".to_string()],
            dest: "assets/fonts".to_string(),
        }
    }
}

/// `[favicon]` section. Its presence enables the favicon task.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FaviconSection {
    pub src: Vec<String>,
    pub dest: String,
}

impl Default for FaviconSection {
    fn default() -> Self {
        Self {
            src: vec!["src/favicon/*".to_string()],
            dest: String::new(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// WebSocket port for live reload; an ephemeral port is used if taken.
    pub live_reload_port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            live_reload_port: 35729,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WatchSection {
    /// Debounce window for filesystem events, in milliseconds.
    pub debounce_ms: u64,
    /// Only trigger a task when the content of its watched files changed.
    pub use_hash: bool,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            use_hash: false,
        }
    }
}
