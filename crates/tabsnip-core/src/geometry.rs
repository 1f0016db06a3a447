//! Selection geometry for the drawing overlay.
//!
//! All coordinates here are viewport (CSS) pixels. Conversion to device
//! pixels happens in the codec when a frame is cropped.

use serde::{Deserialize, Serialize};

/// Minimum width and height, in viewport pixels, for a drag to count as an
/// intentional selection. Anything smaller is treated as a stray click.
pub const MIN_SELECTION_PX: u32 = 10;

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned selection rectangle with its top-left corner at `x`/`y`.
///
/// Rectangles built through [`SelectionRect::from_corners`] are always
/// normalized; the drag direction never produces negative extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SelectionRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the rectangle spanned by a drag from `origin` to `current`,
    /// whichever direction the drag went.
    pub fn from_corners(origin: Point, current: Point) -> Self {
        let left = origin.x.min(current.x).max(0.0);
        let top = origin.y.min(current.y).max(0.0);
        let width = (current.x - origin.x).abs();
        let height = (current.y - origin.y).abs();
        Self {
            x: left.round() as u32,
            y: top.round() as u32,
            width: width.round() as u32,
            height: height.round() as u32,
        }
    }

    /// True when both sides reach [`MIN_SELECTION_PX`].
    pub fn meets_minimum(&self) -> bool {
        self.width >= MIN_SELECTION_PX && self.height >= MIN_SELECTION_PX
    }
}

impl std::fmt::Display for SelectionRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}
