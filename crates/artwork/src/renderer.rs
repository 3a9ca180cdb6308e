use std::fs;
use std::path::{Path, PathBuf};

use deckstore_steam::paths::artwork_filename;
use deckstore_steam::{ArtworkRenderer, ArtworkType, SteamError};
use image::imageops;
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, info, warn};

use crate::canvas::{self, Direction, fit_to_height, fit_to_width, paste_centered, scale};
use crate::error::ArtworkError;

const GRADIENT_START: [u8; 3] = [40, 40, 60];
const GRADIENT_END: [u8; 3] = [20, 20, 30];

const HEADER_SIZE: (u32, u32) = (920, 430);
const HERO_SIZE: (u32, u32) = (1920, 620);
const PORTRAIT_SIZE: (u32, u32) = (600, 900);
const ICON_SIZE: (u32, u32) = (512, 512);
const LOGO_BOX: (u32, u32) = (640, 360);

/// Renders the artwork set on a dark gradient background, with the logo
/// centered and an optional watermark in a corner.
#[derive(Debug, Clone)]
pub struct GradientRenderer {
    start: [u8; 3],
    end: [u8; 3],
}

impl Default for GradientRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl GradientRenderer {
    pub fn new() -> Self {
        Self {
            start: GRADIENT_START,
            end: GRADIENT_END,
        }
    }

    /// Uses a different gradient for the background images.
    pub fn with_colors(mut self, start: [u8; 3], end: [u8; 3]) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Writes the five artwork files for `short_id` into `grid_dir`.
    ///
    /// A watermark path that does not exist is skipped with a warning.
    pub fn render_set(
        &self,
        short_id: u32,
        source: &Path,
        grid_dir: &Path,
        watermark: Option<&Path>,
    ) -> Result<Vec<PathBuf>, ArtworkError> {
        if !source.is_file() {
            return Err(ArtworkError::SourceNotFound(source.to_path_buf()));
        }
        fs::create_dir_all(grid_dir).map_err(|e| {
            ArtworkError::Io(format!("failed to create {}: {e}", grid_dir.display()))
        })?;

        let logo = image::open(source)?.into_rgba8();
        debug!(source = %source.display(), width = logo.width(), height = logo.height(), "loaded source logo");

        let watermark = match watermark {
            Some(path) if path.is_file() => Some(image::open(path)?.into_rgba8()),
            Some(path) => {
                warn!(path = %path.display(), "watermark not found, skipping");
                None
            }
            None => None,
        };
        let watermark = watermark.as_ref();

        let mut saved = Vec::with_capacity(ArtworkType::all().len());
        for &art_type in ArtworkType::all() {
            let image = match art_type {
                ArtworkType::Grid => self.header(&logo, watermark),
                ArtworkType::Hero => self.hero(&logo, watermark),
                ArtworkType::Portrait => self.portrait(&logo, watermark),
                ArtworkType::Icon => icon(&logo),
                ArtworkType::Logo => DynamicImage::ImageRgba8(canvas::fit_to_box(
                    &logo, LOGO_BOX.0, LOGO_BOX.1,
                )),
            };

            let path = grid_dir.join(artwork_filename(short_id, art_type, "png"));
            image.save_with_format(&path, ImageFormat::Png)?;
            info!(kind = %art_type, path = %path.display(), "artwork saved");
            saved.push(path);
        }

        Ok(saved)
    }

    fn header(&self, logo: &RgbaImage, watermark: Option<&RgbaImage>) -> DynamicImage {
        let (w, h) = HEADER_SIZE;
        let mut canvas = canvas::gradient(w, h, self.start, self.end, Direction::Horizontal);
        let scaled = canvas::fit_to_box(logo, scale(w, 0.9), scale(h, 0.75));
        paste_centered(&mut canvas, &scaled);

        if let Some(mark) = watermark {
            let mark = fit_to_height(mark, scale(h, 0.15));
            let y = i64::from(h) - i64::from(mark.height()) - 20;
            imageops::overlay(&mut canvas, &mark, 20, y);
        }
        opaque(canvas)
    }

    fn hero(&self, logo: &RgbaImage, watermark: Option<&RgbaImage>) -> DynamicImage {
        let (w, h) = HERO_SIZE;
        let mut canvas = canvas::gradient(w, h, self.start, self.end, Direction::Horizontal);
        let scaled = canvas::fit_to_box(logo, scale(w, 0.7), scale(h, 0.75));
        paste_centered(&mut canvas, &scaled);

        if let Some(mark) = watermark {
            let mark = fit_to_height(mark, scale(h, 0.1));
            imageops::overlay(&mut canvas, &mark, 30, 30);
        }
        opaque(canvas)
    }

    fn portrait(&self, logo: &RgbaImage, watermark: Option<&RgbaImage>) -> DynamicImage {
        let (w, h) = PORTRAIT_SIZE;
        let mut canvas = canvas::gradient(w, h, self.start, self.end, Direction::Vertical);
        let scaled = canvas::fit_to_box(logo, scale(w, 0.8), scale(h, 0.8));
        paste_centered(&mut canvas, &scaled);

        if let Some(mark) = watermark {
            let mark = fit_to_width(mark, scale(w, 0.15));
            imageops::overlay(&mut canvas, &mark, 20, 20);
        }
        opaque(canvas)
    }
}

fn icon(logo: &RgbaImage) -> DynamicImage {
    let (w, h) = ICON_SIZE;
    let mut canvas = RgbaImage::new(w, h);
    let scaled = canvas::fit_to_box(logo, scale(w, 0.8), scale(h, 0.8));
    paste_centered(&mut canvas, &scaled);
    DynamicImage::ImageRgba8(canvas)
}

/// Drops the alpha channel of a fully opaque canvas.
fn opaque(canvas: RgbaImage) -> DynamicImage {
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).into_rgb8())
}

impl ArtworkRenderer for GradientRenderer {
    fn render(
        &self,
        short_id: u32,
        source: &Path,
        grid_dir: &Path,
        watermark: Option<&Path>,
    ) -> Result<Vec<PathBuf>, SteamError> {
        Ok(self.render_set(short_id, source, grid_dir, watermark)?)
    }
}
