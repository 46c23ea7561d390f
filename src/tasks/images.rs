// src/tasks/images.rs

//! Lossless-ish image optimisation.
//!
//! PNG files are re-encoded with the best compression and adaptive
//! filtering, JPEG files at the configured quality. Whichever of the
//! original and the re-encoded bytes is smaller ends up in the output.
//! Anything else (SVG, GIF, WebP, ...) is copied unchanged.

use std::io::Cursor;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use tracing::debug;

use crate::errors::TaskError;
use crate::tasks::files::{expand, extension, read, write, MatchedFile};
use crate::tasks::{AssetTask, TaskContext, TaskReport};
use crate::types::TaskId;

#[derive(Debug)]
pub struct ImagesTask {
    ctx: Arc<TaskContext>,
}

impl ImagesTask {
    pub fn new(ctx: Arc<TaskContext>) -> Self {
        Self { ctx }
    }

    fn optimise(&self, file: &MatchedFile, original: Vec<u8>) -> Result<Vec<u8>, TaskError> {
        let encoded = match extension(&file.path).as_deref() {
            Some("png") => encode_png(&original),
            Some("jpg" | "jpeg") => encode_jpeg(&original, self.ctx.config().images.jpeg_quality),
            _ => return Ok(original),
        }
        .map_err(|source| TaskError::Image {
            path: file.path.display().to_string(),
            source,
        })?;

        debug!(
            file = %file.rel.display(),
            original = original.len(),
            encoded = encoded.len(),
            "re-encoded image"
        );

        Ok(if encoded.len() < original.len() {
            encoded
        } else {
            original
        })
    }
}

impl AssetTask for ImagesTask {
    fn id(&self) -> TaskId {
        TaskId::Images
    }

    fn watch_patterns(&self) -> Vec<String> {
        self.ctx.config().images.src.clone()
    }

    fn run(&self) -> Result<TaskReport, TaskError> {
        let section = &self.ctx.config().images;
        let files = expand(self.ctx.root(), &section.src)?;
        let dest = self.ctx.output(&section.dest);

        for file in &files {
            let original = read(&file.path)?;
            let bytes = self.optimise(file, original)?;
            write(&dest.join(&file.rel), bytes)?;
        }

        Ok(TaskReport::new(files.len()))
    }
}

fn encode_png(bytes: &[u8]) -> image::ImageResult<Vec<u8>> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;

    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive)
        .write_image(img.as_bytes(), img.width(), img.height(), img.color().into())?;
    Ok(out)
}

fn encode_jpeg(bytes: &[u8], quality: u8) -> image::ImageResult<Vec<u8>> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
    let rgb = img.to_rgb8();

    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality).write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(out.into_inner())
}
