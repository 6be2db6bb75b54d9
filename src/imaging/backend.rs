//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the narrow seam between deciding *what* to do
//! with an image ([`operations`](super::operations)) and the pixel work. It has
//! three operations:
//!
//! - `identify`: read dimensions without decoding more than needed,
//! - `resize`: stage 1, open the source, optionally crop, scale, write,
//! - `retouch`: stage 2, reopen the written target, apply fill, colorize and
//!   overlay, rewrite.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{ResizeParams, RetouchParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Open `params.source`, crop if requested, scale to exactly
    /// `width`×`height`, and write to `params.output`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;

    /// Reopen `params.target`, apply the optional transforms in order
    /// (fill, colorize, overlay), and write it back.
    fn retouch(&self, params: &RetouchParams) -> Result<(), BackendError>;
}
