//! Pure calculation functions for crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::CropWindow;

/// Slack for float rounding when checking that a window fits.
const FIT_EPSILON: f64 = 1e-6;

/// Crop window size in (fractional) source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeSize {
    pub width: f64,
    pub height: f64,
}

/// Calculate the largest window inside `original` with the aspect ratio of
/// `target`.
///
/// When the original is smaller than the target on one axis, that axis is
/// taken whole and the other follows the target ratio, shrinking both again
/// if the other axis would no longer fit. Otherwise the axis with the smaller
/// original/target ratio is taken whole.
///
/// Returns `None` if the result does not fit inside `original`, which the
/// branches below should never produce.
///
/// # Examples
/// ```
/// # use appig::imaging::calculate_crop_size;
/// // 1000x500 → square: the full height, 500 wide
/// let size = calculate_crop_size((1000, 500), (100, 100)).unwrap();
/// assert_eq!((size.width, size.height), (500.0, 500.0));
/// ```
pub fn calculate_crop_size(original: (u32, u32), target: (u32, u32)) -> Option<RelativeSize> {
    let (w0, h0) = (original.0 as f64, original.1 as f64);
    let (wt, ht) = (target.0 as f64, target.1 as f64);

    let (width, height) = if w0 < wt {
        // Narrower than the target: full width
        let (mut w, mut h) = (w0, (w0 / wt) * ht);
        if h > h0 {
            w *= h0 / h;
            h = h0;
        }
        (w, h)
    } else if h0 < ht {
        // Shorter than the target: full height
        let (mut w, mut h) = ((h0 / ht) * wt, h0);
        if w > w0 {
            h *= w0 / w;
            w = w0;
        }
        (w, h)
    } else if w0 / wt > h0 / ht {
        // Relatively wider than the target: full height
        ((wt / ht) * h0, h0)
    } else {
        // Relatively taller (or same ratio): full width
        (w0, (ht / wt) * w0)
    };

    if width > w0 + FIT_EPSILON || height > h0 + FIT_EPSILON {
        return None;
    }
    Some(RelativeSize { width, height })
}

/// Round a window size to whole pixels and center it in `original`.
///
/// Each side is clamped to `1..=original` so the window is never empty and
/// never leaves the image.
pub fn center_crop(original: (u32, u32), size: RelativeSize) -> CropWindow {
    let (w0, h0) = original;
    let width = (size.width.round() as u32).clamp(1, w0.max(1));
    let height = (size.height.round() as u32).clamp(1, h0.max(1));
    CropWindow {
        x: (w0.saturating_sub(width)) / 2,
        y: (h0.saturating_sub(height)) / 2,
        width,
        height,
    }
}
