//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode / encode (PNG, JPEG, TIFF, BMP, GIF, WebP) | `image` crate, format from extension |
//! | Identify | `image::image_dimensions` (header only) |
//! | Crop | `DynamicImage::crop_imm` |
//! | Scale | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Fill / colorize | per-pixel on `RgbaImage`, alpha untouched |
//! | Overlay | `image::imageops::overlay` (clips at the edges) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{Color, OverlayParams, ResizeParams, RetouchParams};
use crate::config::Placement;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Save an image, inferring the format from the extension.
///
/// Formats without an alpha channel get the image flattened to RGB first.
fn save_image(img: DynamicImage, path: &Path) -> Result<(), BackendError> {
    let format = ImageFormat::from_path(path).map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Unsupported output format for {}: {}",
            path.display(),
            e
        ))
    })?;
    let img = match format {
        ImageFormat::Jpeg | ImageFormat::Bmp => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img,
    };
    img.save_with_format(path, format).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to write {}: {}", path.display(), e))
    })
}

/// Replace the color of every pixel, keeping its alpha.
fn fill(img: &mut RgbaImage, color: Color) {
    for pixel in img.pixels_mut() {
        pixel.0[0] = color.r;
        pixel.0[1] = color.g;
        pixel.0[2] = color.b;
    }
}

/// Multiply every pixel by `color` (`c * k / 255`), keeping its alpha.
fn colorize(img: &mut RgbaImage, color: Color) {
    let tint = [color.r, color.g, color.b];
    for pixel in img.pixels_mut() {
        for (channel, k) in pixel.0.iter_mut().zip(tint) {
            *channel = (u16::from(*channel) * u16::from(k) / 255) as u8;
        }
    }
}

fn compose(base: RgbaImage, params: &OverlayParams) -> Result<RgbaImage, BackendError> {
    let mut overlay = load_image(&params.image)?.to_rgba8();
    if let Some((width, height)) = params.geometry.size {
        overlay = imageops::resize(&overlay, width, height, FilterType::Lanczos3);
    }
    let (x, y) = params.geometry.position();

    Ok(match params.placement {
        Placement::Top => {
            let mut base = base;
            imageops::overlay(&mut base, &overlay, x, y);
            base
        }
        Placement::Below => {
            let mut canvas = RgbaImage::new(base.width(), base.height());
            imageops::overlay(&mut canvas, &overlay, x, y);
            imageops::overlay(&mut canvas, &base, 0, 0);
            canvas
        }
    })
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let img = match params.crop {
            Some(window) => img.crop_imm(window.x, window.y, window.width, window.height),
            None => img,
        };
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_image(resized, &params.output)
    }

    fn retouch(&self, params: &RetouchParams) -> Result<(), BackendError> {
        let mut img = load_image(&params.target)?.to_rgba8();

        if let Some(color) = params.fill {
            fill(&mut img, color);
        }
        if let Some(color) = params.colorize {
            colorize(&mut img, color);
        }
        if let Some(overlay) = &params.overlay {
            img = compose(img, overlay)?;
        }

        save_image(DynamicImage::ImageRgba8(img), &params.target)
    }
}
