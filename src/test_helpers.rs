//! Shared test utilities for the appig test suite.
//!
//! Builders for rule documents and small on-disk images.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let spec = image("icon@2x.png", "Assets/Icon.appiconset", "120x120");
//! let rule = rule("icon.png", vec![spec]);
//! assert!(crate::validation::rule_is_valid(&rule));
//! ```

use crate::config::{ImageSpec, Rule};
use image::{Rgba, RgbaImage};
use std::path::Path;

// =========================================================================
// Rule builders
// =========================================================================

/// An image spec with only the required fields set.
pub fn image(file_name: &str, target_path: &str, size: &str) -> ImageSpec {
    ImageSpec {
        file_name: file_name.to_string(),
        target_path: target_path.to_string(),
        size: size.to_string(),
        ..ImageSpec::default()
    }
}

/// A single-source rule. Pass `""` and set `source_files` for many sources.
pub fn rule(source_file: &str, images: Vec<ImageSpec>) -> Rule {
    Rule {
        source_file: source_file.to_string(),
        images,
        ..Rule::default()
    }
}

// =========================================================================
// Image fixtures
// =========================================================================

/// Write a solid-color image, format from the extension.
pub fn write_image(path: &Path, width: u32, height: u32, color: [u8; 4]) {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).unwrap();
    }
    RgbaImage::from_pixel(width, height, Rgba(color))
        .save(path)
        .unwrap();
}

/// Decoded RGBA pixel at `(x, y)`.
pub fn pixel_at(path: &Path, x: u32, y: u32) -> [u8; 4] {
    image::open(path).unwrap().to_rgba8().get_pixel(x, y).0
}
