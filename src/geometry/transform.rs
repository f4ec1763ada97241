//! Percent <-> pixel projection
//!
//! All functions are pure. Clamping is applied per field: `width` and
//! `height` are bounded by the container size on their own and are not
//! re-clamped against `x`/`y`, so `x + width` may exceed the container.
//! Overlay placement code relies on exactly this behaviour.

use super::rect::{PercentRect, PixelRect, Size};

/// Clamp `value` into `[min, max]`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Project a percentage rectangle into a container of the given size.
pub fn percent_to_pixels(rect: &PercentRect, container: Size) -> PixelRect {
    let (w, h) = (container.width, container.height);
    PixelRect::new(
        clamp(rect.x / 100.0 * w, 0.0, w),
        clamp(rect.y / 100.0 * h, 0.0, h),
        clamp(rect.width / 100.0 * w, 0.0, w),
        clamp(rect.height / 100.0 * h, 0.0, h),
    )
}

/// Inverse of [`percent_to_pixels`].
///
/// A container with a zero dimension yields an all-zero rectangle.
pub fn pixels_to_percent(rect: &PixelRect, container: Size) -> PercentRect {
    if container.is_empty() {
        return PercentRect::zero();
    }

    let (w, h) = (container.width, container.height);
    PercentRect::new(
        clamp(rect.x / w * 100.0, 0.0, 100.0),
        clamp(rect.y / h * 100.0, 0.0, 100.0),
        clamp(rect.width / w * 100.0, 0.0, 100.0),
        clamp(rect.height / h * 100.0, 0.0, 100.0),
    )
}

/// Round to the nearest 0.5 unit when `enabled`, identity otherwise.
pub fn snap_to_grid(value: f64, enabled: bool) -> f64 {
    if !enabled {
        return value;
    }
    (value * 2.0).round() / 2.0
}

/// Snap every field of a percentage rectangle.
pub fn snap_rect(rect: &PercentRect, enabled: bool) -> PercentRect {
    PercentRect::new(
        snap_to_grid(rect.x, enabled),
        snap_to_grid(rect.y, enabled),
        snap_to_grid(rect.width, enabled),
        snap_to_grid(rect.height, enabled),
    )
}
