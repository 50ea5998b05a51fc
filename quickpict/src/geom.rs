//! Integer geometry in device units.

use crate::error::{DecodeError, Result};
use smallvec::SmallVec;

/// A point in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A width/height pair. Either extent may be zero or negative, in which
/// case the size counts as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// An axis-aligned rectangle.
///
/// Rectangles built through [`Rect::from_corners`] uphold `left <= right`
/// and `top <= bottom`; wire rectangles failing that are rejected as
/// malformed, never silently swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Build a rectangle from its top-left and bottom-right corners,
    /// rejecting inverted bounds.
    pub fn from_corners(top_left: Point, bottom_right: Point) -> Result<Self> {
        if top_left.x > bottom_right.x || top_left.y > bottom_right.y {
            return Err(DecodeError::MalformedGeometry);
        }

        Ok(Self {
            left: top_left.x,
            top: top_left.y,
            right: bottom_right.x,
            bottom: bottom_right.y,
        })
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// A polygon as a list of vertices in stream order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Polygon {
    pub points: SmallVec<[Point; 8]>,
}

/// A rational number, used for the picture resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    pub num: i32,
    pub den: i32,
}

impl Fraction {
    pub const ONE: Self = Self { num: 1, den: 1 };
}

impl Default for Fraction {
    fn default() -> Self {
        Self::ONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_corners_are_rejected() {
        let ok = Rect::from_corners(Point::new(0, 0), Point::new(10, 10));
        assert_eq!(ok, Ok(Rect::new(0, 0, 10, 10)));

        let err = Rect::from_corners(Point::new(10, 10), Point::new(0, 0));
        assert_eq!(err, Err(DecodeError::MalformedGeometry));

        // A single point is a valid (degenerate) rectangle.
        assert!(Rect::from_corners(Point::new(3, 3), Point::new(3, 3)).is_ok());
    }

    #[test]
    fn empty_sizes() {
        assert!(Size::new(0, 5).is_empty());
        assert!(Size::new(5, 0).is_empty());
        assert!(Size::new(-1, -1).is_empty());
        assert!(!Size::new(1, 1).is_empty());
    }
}
