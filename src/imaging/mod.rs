//! Image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Crop + scale** | `crop_imm` + `resize_exact` (Lanczos3) |
//! | **Fill / colorize** | per-pixel RGBA, alpha kept |
//! | **Compose** | `imageops::overlay`, on top or below |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`generate_image`], the two-stage pipeline for one task

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{RelativeSize, calculate_crop_size, center_crop};
pub use operations::{ImageError, ImageOutcome, ImageTask, generate_image, get_dimensions};
pub use params::{Color, CropWindow, OverlayGeometry, OverlayParams, ResizeParams, RetouchParams};
pub use rust_backend::RustBackend;
