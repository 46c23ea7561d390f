use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Identifier of a transformation task.
///
/// The set is fixed: the pipeline knows exactly these tasks, and the build
/// plan, the watch bindings and the CLI all refer to them by this id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskId {
    Clean,
    Sprites,
    Favicon,
    Styles,
    Templates,
    Scripts,
    Fonts,
    Images,
}

impl TaskId {
    pub const ALL: [TaskId; 8] = [
        TaskId::Clean,
        TaskId::Sprites,
        TaskId::Favicon,
        TaskId::Styles,
        TaskId::Templates,
        TaskId::Scripts,
        TaskId::Fonts,
        TaskId::Images,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskId::Clean => "clean",
            TaskId::Sprites => "sprites",
            TaskId::Favicon => "favicon",
            TaskId::Styles => "styles",
            TaskId::Templates => "templates",
            TaskId::Scripts => "scripts",
            TaskId::Fonts => "fonts",
            TaskId::Images => "images",
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TaskId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| format!("unknown task: {s}"))
    }
}

/// Which of the two historical pipeline task sets to instantiate.
///
/// - `Bundle`: scripts go through an external bundler, sprites are a single
///   CSS-positioned SVG, no favicon stage.
/// - `Concat`: scripts are concatenated (and optionally minified), sprites are
///   emitted as an SVG symbol sheet plus a raster PNG, favicons are copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Bundle,
    Concat,
}

/// How the scripts task produces its single output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptMode {
    Bundle,
    Concat,
}

/// Sprite flavours the sprites task can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpriteMode {
    /// Vertically stacked SVG plus a style partial with background offsets.
    Css,
    /// SVG sheet of `<symbol>` elements for `<use href="#icon-..">`.
    Symbol,
    /// PNG icons packed into one PNG plus a style partial.
    Raster,
}
