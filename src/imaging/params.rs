//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations), which decides what a
//! task needs, and the [`backend`](super::backend), which does the pixel work.
//!
//! ## Types
//!
//! - [`Color`]: an RGB color decoded from a hex code.
//! - [`CropWindow`]: centered crop rectangle in source pixels.
//! - [`ResizeParams`]: stage 1: source, output, optional crop, exact size.
//! - [`OverlayGeometry`]: overlay size and offsets; displays as `WxH+X+Y`.
//! - [`OverlayParams`]: overlay image, geometry and placement.
//! - [`RetouchParams`]: stage 2: target plus the optional transforms.

use crate::config::Placement;
use palette::Srgb;
use std::fmt;
use std::path::PathBuf;

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Decode `#rgb` or `#rrggbb` (the `#` is optional). Anything that does
    /// not decode to exactly three components is `None`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        if !hex.is_ascii() {
            return None;
        }
        let rgb: Srgb<u8> = hex.parse().ok()?;
        Some(Self {
            r: rgb.red,
            g: rgb.green,
            b: rgb.blue,
        })
    }
}

/// Crop rectangle within the source image, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Parameters for stage 1: crop (optional) and scale to an exact size.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// `None` stretches the whole source to the output size.
    pub crop: Option<CropWindow>,
    pub width: u32,
    pub height: u32,
}

/// Overlay size and position relative to the top-left corner.
///
/// Displays as the classic geometry string: optional `WxH`, then `+X`/`-X`,
/// then `+Y`/`-Y`, e.g. `32x32+4-2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayGeometry {
    pub size: Option<(u32, u32)>,
    pub offset_x: Option<i64>,
    pub offset_y: Option<i64>,
}

impl OverlayGeometry {
    /// Offset with missing values as zero.
    pub fn position(&self) -> (i64, i64) {
        (self.offset_x.unwrap_or(0), self.offset_y.unwrap_or(0))
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.offset_x.is_none() && self.offset_y.is_none()
    }
}

impl fmt::Display for OverlayGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((w, h)) = self.size {
            write!(f, "{w}x{h}")?;
        }
        for offset in [self.offset_x, self.offset_y].into_iter().flatten() {
            let sign = if offset >= 0 { '+' } else { '-' };
            write!(f, "{sign}{}", offset.unsigned_abs())?;
        }
        Ok(())
    }
}

/// A second image composited onto the target.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayParams {
    pub image: PathBuf,
    pub geometry: OverlayGeometry,
    pub placement: Placement,
}

/// Parameters for stage 2: optional transforms on the written target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetouchParams {
    pub target: PathBuf,
    /// Replace the color of every pixel, keeping alpha.
    pub fill: Option<Color>,
    /// Multiply every pixel by this color, keeping alpha.
    pub colorize: Option<Color>,
    pub overlay: Option<OverlayParams>,
}

impl RetouchParams {
    /// Whether any transform is set, i.e. whether stage 2 has work to do.
    pub fn has_work(&self) -> bool {
        self.fill.is_some() || self.colorize.is_some() || self.overlay.is_some()
    }

    /// Names of the set transforms, in application order.
    pub fn transform_names(&self) -> Vec<&'static str> {
        [
            (self.fill.is_some(), "fill"),
            (self.colorize.is_some(), "colorize"),
            (self.overlay.is_some(), "compose"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}
