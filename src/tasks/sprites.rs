// src/tasks/sprites.rs

//! Icon sprite generation.
//!
//! Three flavours, selected by `[sprites] modes`:
//!
//! - `css`: icons stacked vertically into `sprite.svg`, plus a style partial
//!   with one class per icon carrying its background offset and size.
//! - `symbol`: `sprite-symbol.svg` containing one `<symbol>` per icon, for
//!   `<use href="sprite-symbol.svg#icon-name">`.
//! - `raster`: PNG icons packed vertically into `sprite.png`, plus a style
//!   partial.
//!
//! Partials are written into the style sources (`[sprites] partials`) so the
//! stylesheet can import them; this is why styles must run after sprites.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use regex::Regex;
use tracing::debug;

use crate::errors::TaskError;
use crate::tasks::files::{expand, extension, read, read_to_string, write, write_if_changed, MatchedFile};
use crate::tasks::{AssetTask, TaskContext, TaskReport};
use crate::types::{SpriteMode, TaskId};

pub const SVG_SPRITE: &str = "sprite.svg";
pub const SYMBOL_SPRITE: &str = "sprite-symbol.svg";
pub const PNG_SPRITE: &str = "sprite.png";
pub const SVG_PARTIAL: &str = "_sprite.scss";
pub const PNG_PARTIAL: &str = "_sprite-png.scss";

const PARTIAL_HEADER: &str = "// Generated by sitepipe from the icon sources. Do not edit.\n";

static SVG_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<svg\b([^>]*)>").expect("valid svg tag regex"));
static SVG_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</svg\s*>").expect("valid svg close regex"));
static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute regex")
});
static LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9]*\.?[0-9]+)\s*(?:px)?\s*$").expect("valid length regex")
});

/// A parsed SVG icon.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgIcon {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub view_box: String,
    /// Markup between the root `<svg>` tags.
    pub body: String,
}

impl SvgIcon {
    /// Read dimensions from the root element's `width`/`height`, falling back
    /// to its `viewBox`.
    pub fn parse(name: &str, source: &str) -> Result<Self, TaskError> {
        let invalid = |message: &str| TaskError::Input {
            path: name.to_string(),
            message: message.to_string(),
        };

        let open = SVG_OPEN
            .captures(source)
            .ok_or_else(|| invalid("no <svg> root element"))?;
        let (Some(whole), Some(attrs)) = (open.get(0), open.get(1)) else {
            return Err(invalid("no <svg> root element"));
        };
        let close = SVG_CLOSE
            .find_iter(source)
            .last()
            .filter(|m| m.start() >= whole.end())
            .ok_or_else(|| invalid("unterminated <svg> element"))?;

        let mut width = None;
        let mut height = None;
        let mut view_box = None;
        for cap in ATTR.captures_iter(attrs.as_str()) {
            let value = cap.get(2).or_else(|| cap.get(3)).map_or("", |m| m.as_str());
            match &cap[1] {
                "width" => width = parse_length(value),
                "height" => height = parse_length(value),
                "viewBox" => view_box = parse_view_box(value),
                _ => {}
            }
        }

        let (width, height) = match (width, height, view_box) {
            (Some(w), Some(h), _) => (w, h),
            (w, h, Some([_, _, vw, vh])) => (w.unwrap_or(vw), h.unwrap_or(vh)),
            _ => return Err(invalid("cannot determine icon dimensions")),
        };

        let view_box = match view_box {
            Some([x, y, w, h]) => format!("{x} {y} {w} {h}"),
            None => format!("0 0 {width} {height}"),
        };

        Ok(Self {
            name: name.to_string(),
            width,
            height,
            view_box,
            body: source[whole.end()..close.start()].trim().to_string(),
        })
    }
}

fn parse_length(value: &str) -> Option<f64> {
    LENGTH.captures(value)?.get(1)?.as_str().parse().ok()
}

fn parse_view_box(value: &str) -> Option<[f64; 4]> {
    let nums: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    <[f64; 4]>::try_from(nums).ok()
}

/// URL of `target` as seen from a stylesheet living in `from_dir`. Both are
/// `/`-separated paths relative to the output directory.
pub fn relative_url(from_dir: &str, target: &str) -> String {
    let split = |s: &str| -> Vec<String> {
        s.split(['/', '\\'])
            .filter(|p| !p.is_empty() && *p != ".")
            .map(str::to_string)
            .collect()
    };
    let from = split(from_dir);
    let to = split(target);

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend(to[common..].iter().map(String::as_str));
    parts.join("/")
}

/// Icon name from the file stem.
///
/// The name ends up in SVG `id` attributes and in class selectors, so it is
/// limited to ASCII letters, digits, `-` and `_`.
pub fn icon_name(path: &Path) -> Result<String, TaskError> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(TaskError::Input {
            path: path.display().to_string(),
            message: format!("icon name {name:?} may only use letters, digits, '-' and '_'"),
        });
    }
    Ok(name)
}

/// Stacked SVG sprite: each icon becomes a nested `<svg>` at its y offset.
pub fn render_stacked_svg(icons: &[SvgIcon]) -> (String, Vec<f64>) {
    let width = icons.iter().map(|i| i.width).fold(0.0, f64::max);
    let height: f64 = icons.iter().map(|i| i.height).sum();

    let mut offsets = Vec::with_capacity(icons.len());
    let mut out = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
         width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    );

    let mut y = 0.0;
    for icon in icons {
        offsets.push(y);
        let _ = writeln!(
            out,
            "<svg id=\"{}\" width=\"{}\" height=\"{}\" viewBox=\"{}\" x=\"0\" y=\"{y}\">{}</svg>",
            icon.name, icon.width, icon.height, icon.view_box, icon.body
        );
        y += icon.height;
    }
    out.push_str("</svg>\n");
    (out, offsets)
}

pub fn render_symbol_sheet(icons: &[SvgIcon], prefix: &str) -> String {
    let mut out = String::from(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" style=\"display:none\">\n",
    );
    for icon in icons {
        let _ = writeln!(
            out,
            "<symbol id=\"{prefix}{}\" viewBox=\"{}\">{}</symbol>",
            icon.name, icon.view_box, icon.body
        );
    }
    out.push_str("</svg>\n");
    out
}

/// One class per icon: background offset plus dimensions.
fn render_partial(class_prefix: &str, url: &str, rules: &[(String, f64, f64, f64)]) -> String {
    let mut out = String::from(PARTIAL_HEADER);
    for (name, y, width, height) in rules {
        let offset = if *y == 0.0 { "0".to_string() } else { format!("-{y}px") };
        let _ = write!(
            out,
            "\n.{class_prefix}{name} {{\n  background: url(\"{url}\") no-repeat 0 {offset};\n  width: {width}px;\n  height: {height}px;\n}}\n"
        );
    }
    out
}

#[derive(Debug)]
pub struct SpritesTask {
    ctx: Arc<TaskContext>,
}

impl SpritesTask {
    pub fn new(ctx: Arc<TaskContext>) -> Self {
        Self { ctx }
    }

    fn sprite_url(&self, file: &str) -> String {
        let cfg = self.ctx.config();
        relative_url(&cfg.styles.dest, &format!("{}/{file}", cfg.sprites.dest))
    }

    fn load_svgs(&self, files: &[MatchedFile]) -> Result<Vec<SvgIcon>, TaskError> {
        files
            .iter()
            .filter(|f| extension(&f.path).as_deref() == Some("svg"))
            .map(|f| SvgIcon::parse(&icon_name(&f.path)?, &read_to_string(&f.path)?))
            .collect()
    }

    fn css(&self, icons: &[SvgIcon], dest: &Path, partials: &Path) -> Result<usize, TaskError> {
        let (svg, offsets) = render_stacked_svg(icons);
        write(&dest.join(SVG_SPRITE), svg)?;

        let rules: Vec<_> = icons
            .iter()
            .zip(offsets)
            .map(|(i, y)| (i.name.clone(), y, i.width, i.height))
            .collect();
        let partial = render_partial(&self.ctx.config().sprites.prefix, &self.sprite_url(SVG_SPRITE), &rules);
        write_if_changed(&partials.join(SVG_PARTIAL), partial)?;
        Ok(2)
    }

    fn symbol(&self, icons: &[SvgIcon], dest: &Path) -> Result<usize, TaskError> {
        let sheet = render_symbol_sheet(icons, &self.ctx.config().sprites.prefix);
        write(&dest.join(SYMBOL_SPRITE), sheet)?;
        Ok(1)
    }

    fn raster(&self, files: &[MatchedFile], dest: &Path, partials: &Path) -> Result<usize, TaskError> {
        let mut icons = Vec::new();
        for file in files.iter().filter(|f| extension(&f.path).as_deref() == Some("png")) {
            let img = image::load_from_memory(&read(&file.path)?).map_err(|source| TaskError::Image {
                path: file.path.display().to_string(),
                source,
            })?;
            icons.push((icon_name(&file.path)?, img.to_rgba8()));
        }

        let width = icons.iter().map(|(_, i)| i.width()).max().unwrap_or(0);
        let height: u32 = icons.iter().map(|(_, i)| i.height()).sum();

        let mut canvas = RgbaImage::new(width.max(1), height.max(1));
        let mut rules = Vec::with_capacity(icons.len());
        let mut y = 0u32;
        for (name, icon) in &icons {
            image::imageops::overlay(&mut canvas, icon, 0, i64::from(y));
            rules.push((name.clone(), f64::from(y), f64::from(icon.width()), f64::from(icon.height())));
            y += icon.height();
        }

        let mut png = Vec::new();
        PngEncoder::new_with_quality(&mut png, CompressionType::Best, FilterType::Adaptive)
            .write_image(canvas.as_raw(), canvas.width(), canvas.height(), ExtendedColorType::Rgba8)
            .map_err(|source| TaskError::Image {
                path: dest.join(PNG_SPRITE).display().to_string(),
                source,
            })?;
        write(&dest.join(PNG_SPRITE), png)?;

        let prefix = format!("{}png-", self.ctx.config().sprites.prefix);
        let partial = render_partial(&prefix, &self.sprite_url(PNG_SPRITE), &rules);
        write_if_changed(&partials.join(PNG_PARTIAL), partial)?;
        Ok(2)
    }
}

impl AssetTask for SpritesTask {
    fn id(&self) -> TaskId {
        TaskId::Sprites
    }

    fn watch_patterns(&self) -> Vec<String> {
        self.ctx.config().sprite_sources()
    }

    fn run(&self) -> Result<TaskReport, TaskError> {
        let cfg = self.ctx.config();
        let files = expand(self.ctx.root(), &cfg.sprite_sources())?;
        let dest = self.ctx.output(&cfg.sprites.dest);
        let partials = self.ctx.source(&cfg.sprites.partials);
        let modes = cfg.sprite_modes();

        let svgs = if modes.iter().any(|m| matches!(m, SpriteMode::Css | SpriteMode::Symbol)) {
            self.load_svgs(&files)?
        } else {
            Vec::new()
        };
        debug!(icons = files.len(), ?modes, "generating sprites");

        let mut outputs = 0;
        for mode in modes {
            outputs += match mode {
                SpriteMode::Css => self.css(&svgs, &dest, &partials)?,
                SpriteMode::Symbol => self.symbol(&svgs, &dest)?,
                SpriteMode::Raster => self.raster(&files, &dest, &partials)?,
            };
        }
        Ok(TaskReport::new(outputs))
    }
}
