//! Space-tagged rectangles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Marker trait for a coordinate space.
pub trait Space: Copy + Clone + fmt::Debug + PartialEq + Default {
    /// Short unit suffix used by `Display`.
    const UNIT: &'static str;
}

/// Percentage of the page image, `0..=100` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Percent;

/// Pixels of the rendering container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pixels;

impl Space for Percent {
    const UNIT: &'static str = "%";
}

impl Space for Pixels {
    const UNIT: &'static str = "px";
}

/// Axis-aligned rectangle in coordinate space `S`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Rect<S: Space> {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(skip)]
    space: PhantomData<S>,
}

pub type PercentRect = Rect<Percent>;
pub type PixelRect = Rect<Pixels>;

impl<S: Space> Rect<S> {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            space: PhantomData,
        }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Right edge (`x + width`).
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether a point in the same space lies inside the rectangle.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Field-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }
}

impl<S: Space> Default for Rect<S> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<S: Space> fmt::Display for Rect<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let u = S::UNIT;
        write!(
            f,
            "x={:.2}{u} y={:.2}{u} w={:.2}{u} h={:.2}{u}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl PercentRect {
    /// Clamp every field into `[0, 100]` independently.
    pub fn clamped(&self) -> Self {
        Self::new(
            super::clamp(self.x, 0.0, 100.0),
            super::clamp(self.y, 0.0, 100.0),
            super::clamp(self.width, 0.0, 100.0),
            super::clamp(self.height, 0.0, 100.0),
        )
    }
}

/// Size of a rendering container in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero (nothing can be projected).
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}
