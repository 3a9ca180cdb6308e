//! Canvas helpers: gradients, aspect-preserving scaling and compositing.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Axis along which a gradient runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Horizontal,
    Vertical,
}

/// Creates an opaque linear gradient from `start` to `end`.
pub fn gradient(width: u32, height: u32, start: [u8; 3], end: [u8; 3], direction: Direction) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let (pos, span) = match direction {
            Direction::Horizontal => (x, width),
            Direction::Vertical => (y, height),
        };
        let blend = f64::from(pos) / f64::from(span);
        let mix =
            |i: usize| (f64::from(start[i]) * (1.0 - blend) + f64::from(end[i]) * blend) as u8;
        Rgba([mix(0), mix(1), mix(2), 255])
    })
}

/// Scales an image to the largest size that fits in the box, keeping its
/// aspect ratio. Each side is at least one pixel.
pub fn fit_to_box(image: &RgbaImage, box_width: u32, box_height: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let ratio = f64::min(
        f64::from(box_width) / f64::from(width),
        f64::from(box_height) / f64::from(height),
    );
    let new_width = scale(width, ratio).max(1);
    let new_height = scale(height, ratio).max(1);
    imageops::resize(image, new_width, new_height, FilterType::Lanczos3)
}

/// Scales an image to the given height.
pub(crate) fn fit_to_height(image: &RgbaImage, height: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let box_width = if h > 0 {
        scale(height, f64::from(w) / f64::from(h))
    } else {
        height
    };
    fit_to_box(image, box_width, height)
}

/// Scales an image to the given width.
pub(crate) fn fit_to_width(image: &RgbaImage, width: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let box_height = if w > 0 {
        scale(width, f64::from(h) / f64::from(w))
    } else {
        width
    };
    fit_to_box(image, width, box_height)
}

/// Alpha-composites `image` onto the center of `canvas`.
pub(crate) fn paste_centered(canvas: &mut RgbaImage, image: &RgbaImage) {
    let x = (i64::from(canvas.width()) - i64::from(image.width())).div_euclid(2);
    let y = (i64::from(canvas.height()) - i64::from(image.height())).div_euclid(2);
    imageops::overlay(canvas, image, x, y);
}

/// `value * factor`, truncated.
pub(crate) fn scale(value: u32, factor: f64) -> u32 {
    (f64::from(value) * factor) as u32
}
