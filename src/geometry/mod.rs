//! Hotspot geometry
//!
//! Rectangles live in one of two coordinate spaces: percentages of the page
//! image (`0..=100` on each axis) or pixels of the container the page is
//! currently drawn into. The space is part of the type, so a `PercentRect`
//! can never be handed to code expecting a `PixelRect`.

mod rect;
mod transform;

pub use rect::{Percent, PercentRect, PixelRect, Pixels, Rect, Size, Space};
pub use transform::{clamp, percent_to_pixels, pixels_to_percent, snap_rect, snap_to_grid};
