//! High-level image operations.
//!
//! [`generate_image`] runs one task end to end:
//!
//! 1. check the original exists and is a file,
//! 2. create the target directory, remove a stale target file,
//! 3. stage 1: measure, compute the centered crop (unless `no_crop`), scale
//!    to the exact size and write,
//! 4. stage 2: only if fill, colorize or an overlay applies, reopen the
//!    target, apply them in that order and rewrite it.
//!
//! The planning functions ([`plan_resize`], [`plan_retouch`]) are separate so
//! the parameters can be tested without a real backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{calculate_crop_size, center_crop};
use super::params::{Color, OverlayGeometry, OverlayParams, ResizeParams, RetouchParams};
use crate::config::ComposeOptions;
use crate::validation::parse_size;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("No such file: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Is not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("Relative sizes miscalculation for {}: {original:?} → {target:?}", path.display())]
    Miscalculation {
        path: PathBuf,
        original: (u32, u32),
        target: (u32, u32),
    },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// One concrete image to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTask {
    pub original: PathBuf,
    pub target: PathBuf,
    pub width: u32,
    pub height: u32,
    pub no_crop: bool,
    pub colorize: Option<String>,
    pub fill_color: Option<String>,
    pub compose: Option<ComposeOptions>,
}

/// What [`generate_image`] did for a task.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOutcome {
    pub resize: ResizeParams,
    /// Whether stage 2 ran.
    pub optionals_used: bool,
    /// Transforms stage 2 applied, empty when it did not run.
    pub retouched: Vec<&'static str>,
}

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Plan stage 1. Measures the original unless the task stretches.
pub fn plan_resize(backend: &impl ImageBackend, task: &ImageTask) -> Result<ResizeParams> {
    let target = (task.width, task.height);
    let crop = if task.no_crop {
        None
    } else {
        let original = get_dimensions(backend, &task.original)?;
        let size =
            calculate_crop_size(original, target).ok_or_else(|| ImageError::Miscalculation {
                path: task.original.clone(),
                original,
                target,
            })?;
        Some(center_crop(original, size))
    };

    Ok(ResizeParams {
        source: task.original.clone(),
        output: task.target.clone(),
        crop,
        width: task.width,
        height: task.height,
    })
}

/// Decode an optional hex color; undecodable values count as unset.
fn decode_color(field: &str, value: Option<&str>) -> Option<Color> {
    let value = value.filter(|v| !v.is_empty())?;
    let color = Color::from_hex(value);
    if color.is_none() {
        tracing::warn!("ignoring {field} {value:?}: not an RGB hex color");
    }
    color
}

/// Plan the overlay for `compose`, or `None` when there is nothing to compose.
///
/// The overlay path is relative to the directory of the original image. A
/// missing overlay file is skipped with a warning.
pub fn plan_overlay(original: &Path, compose: &ComposeOptions) -> Option<OverlayParams> {
    if compose.compose_image.is_empty() {
        return None;
    }
    let dir = original.parent().unwrap_or_else(|| Path::new(""));
    let image = dir.join(&compose.compose_image);
    if !image.exists() {
        tracing::warn!(
            "Cannot find path {} to compose with {}, so skipping it.",
            image.display(),
            original.display()
        );
        return None;
    }

    let geometry = OverlayGeometry {
        size: compose.size.as_deref().and_then(parse_size),
        offset_x: compose.offset_x,
        offset_y: compose.offset_y,
    };
    Some(OverlayParams {
        image,
        geometry,
        placement: compose.top_or_below,
    })
}

/// Plan stage 2.
pub fn plan_retouch(task: &ImageTask) -> RetouchParams {
    RetouchParams {
        target: task.target.clone(),
        fill: decode_color("fillColor", task.fill_color.as_deref()),
        colorize: decode_color("colorize", task.colorize.as_deref()),
        overlay: task
            .compose
            .as_ref()
            .and_then(|compose| plan_overlay(&task.original, compose)),
    }
}

fn check_original(path: &Path) -> Result<()> {
    let meta = fs::metadata(path).map_err(|_| ImageError::NotFound(path.to_path_buf()))?;
    if !meta.is_file() {
        return Err(ImageError::NotAFile(path.to_path_buf()));
    }
    Ok(())
}

fn prepare_target(path: &Path) -> Result<()> {
    let io_err = |source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    if path.exists() {
        fs::remove_file(path).map_err(io_err)?;
    }
    Ok(())
}

/// Produce one image: checks, stage 1, and stage 2 when needed.
pub fn generate_image(backend: &impl ImageBackend, task: &ImageTask) -> Result<ImageOutcome> {
    check_original(&task.original)?;
    prepare_target(&task.target)?;

    tracing::info!(
        "Processing: {} -> {}",
        task.original.display(),
        task.target.display()
    );

    let resize = plan_resize(backend, task)?;
    backend.resize(&resize)?;

    let retouch = plan_retouch(task);
    let retouched = retouch.transform_names();
    let optionals_used = !retouched.is_empty();
    if optionals_used {
        if let Some(overlay) = &retouch.overlay {
            tracing::debug!(
                overlay = %overlay.image.display(),
                geometry = %overlay.geometry,
                "composing"
            );
        }
        backend.retouch(&retouch)?;
    }

    Ok(ImageOutcome {
        resize,
        optionals_used,
        retouched,
    })
}
