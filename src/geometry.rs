//! Geometry primitives.
//!
//! One explicit rectangle type used uniformly for pages, template frames,
//! and placed frames.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page coordinates.
///
/// Top-left origin, y grows downward (publishing convention), so
/// `top <= bottom` and `left <= right` for any well-formed rect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self { top, left, bottom, right }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Shift the whole rect by a vertical and horizontal offset.
    pub fn translated(&self, dy: f64, dx: f64) -> Self {
        Self {
            top: self.top + dy,
            left: self.left + dx,
            bottom: self.bottom + dy,
            right: self.right + dx,
        }
    }

    /// Shift only the horizontal axis.
    pub fn shifted_x(&self, dx: f64) -> Self {
        Self {
            top: self.top,
            left: self.left + dx,
            bottom: self.bottom,
            right: self.right + dx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_is_additive() {
        let r = Rect::new(10.0, 20.0, 30.0, 60.0);
        let t = r.translated(5.0, -20.0);
        assert_eq!(t, Rect::new(15.0, 0.0, 35.0, 40.0));
        assert_eq!(t.width(), r.width());
        assert_eq!(t.height(), r.height());
    }

    #[test]
    fn shift_x_leaves_vertical_axis_alone() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        let s = r.shifted_x(-2.0);
        assert_eq!(s.top, 1.0);
        assert_eq!(s.bottom, 3.0);
        assert_eq!(s.left, 0.0);
        assert_eq!(s.right, 2.0);
    }
}
