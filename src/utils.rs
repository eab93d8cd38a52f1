//! Coordinate helpers shared by the detector, the mesh model and the cursor sink.

use crate::{Error, Result};
use opencv::core::Rect;

/// Grow a face box by `expansion` of its size on every side, make it square
/// and keep it inside a `max_width` x `max_height` frame.
///
/// Returns `None` for an empty frame.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Precision loss acceptable for box dimensions
pub fn expand_to_square(bbox: Rect, max_width: i32, max_height: i32, expansion: f32) -> Option<Rect> {
    if max_width <= 0 || max_height <= 0 {
        return None;
    }

    let cx = bbox.x as f32 + bbox.width as f32 / 2.0;
    let cy = bbox.y as f32 + bbox.height as f32 / 2.0;
    let side = bbox.width.max(bbox.height) as f32 * (1.0 + 2.0 * expansion);
    let side = f32_to_i32_clamp(side, 1, max_width.min(max_height));

    let x = f32_to_i32_clamp(cx - side as f32 / 2.0, 0, (max_width - side).max(0));
    let y = f32_to_i32_clamp(cy - side as f32 / 2.0, 0, (max_height - side).max(0));
    Some(Rect::new(x, y, side, side))
}

/// Safely convert usize to i32 with overflow checking
///
/// # Errors
///
/// Returns an error if the value exceeds `i32::MAX`
pub fn usize_to_i32(value: usize) -> Result<i32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Value {value} too large to fit in i32")))
}

/// Convert an image dimension or coordinate to an `OpenCV` index
///
/// # Errors
///
/// Returns an error if the value exceeds `i32::MAX`
pub fn u32_to_i32(value: u32) -> Result<i32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Value {value} too large to fit in i32")))
}

/// Clamp and convert f32 to i32 for pixel coordinates; non-finite maps to `min`
#[must_use]
#[allow(clippy::cast_precision_loss)] // Acceptable for clamping bounds
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f32_to_i32_clamp(value: f32, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    if !value.is_finite() {
        return min;
    }
    (value.clamp(min as f32, max as f32) as i32).clamp(min, max)
}

/// Clamp and convert f64 to i16 for X11 coordinates; non-finite maps to `min`
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f64_to_i16_clamp(value: f64, min: i16, max: i16) -> i16 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    if !value.is_finite() {
        return min;
    }
    value.clamp(f64::from(min), f64::from(max)) as i16
}
