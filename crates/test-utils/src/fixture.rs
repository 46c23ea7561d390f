//! On-disk sample project for end-to-end tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use sitepipe::config::ConfigFile;
use sitepipe::tasks::TaskSet;
use tempfile::TempDir;

pub const HOME_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><path d="M0 8 8 0 16 8z"/></svg>"#;
pub const SEARCH_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><circle cx="10" cy="10" r="7"/></svg>"#;

pub const LAYOUT: &str = r#"<!doctype html>
<html>
<head><link rel="stylesheet" href="assets/styles/main.min.css"></head>
<body>
{% block content %}{% endblock %}
</body>
</html>
"#;

pub const INDEX: &str = r#"{% extends "layout.twig" %}
{% block content %}<h1>Hello ({{ mode }})</h1>{% endblock %}
"#;

pub const MAIN_SCSS: &str = r#"@import "common/sprite";

$accent: #c0ffee;

body {
  color: $accent;
}
"#;

/// A temporary project laid out like the default configuration expects.
pub struct SiteFixture {
    dir: TempDir,
}

impl SiteFixture {
    /// Empty project directory.
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create tempdir"),
        }
    }

    /// Project with icons, one page, a stylesheet, a font and a picture.
    pub fn sample() -> Self {
        let site = Self::empty();
        site.write("src/assets/images/icons/home.svg", HOME_SVG);
        site.write("src/assets/images/icons/search.svg", SEARCH_SVG);
        site.write("src/views/layout.twig", LAYOUT);
        site.write("src/views/pages/index.twig", INDEX);
        site.write("src/assets/styles/main.scss", MAIN_SCSS);
        site.write("src/assets/fonts/inter/inter.woff2", "not really a font");
        site.write_png("src/assets/images/pictures/dot.png", 8, 8);
        site
    }

    /// Canonical project root, so paths compare equal to what the watcher
    /// reports.
    pub fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().expect("canonicalize tempdir")
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    /// A solid-colour PNG.
    pub fn write_png(&self, rel: &str, width: u32, height: u32) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255]))
            .save(&path)
            .expect("write png");
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read fixture file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// The real tasks of `cfg`, rooted at this project.
    pub fn tasks(&self, cfg: ConfigFile, live_reload_port: Option<u16>) -> TaskSet {
        TaskSet::from_config(Arc::new(cfg), &self.root(), live_reload_port)
    }
}

/// Every regular file below `dir`, sorted.
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let Ok(entries) = fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}
