//! Pixel geometry for frames and regions of interest.
//!
//! All values are integer pixels with `(0, 0)` at the top-left of the
//! frame. Edges are inclusive on the far side, so a point may sit exactly
//! on `(width, height)`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dimensions of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Clamp a point into `[0, width] x [0, height]`.
    pub fn clamp(&self, point: PixelPoint) -> PixelPoint {
        PixelPoint {
            x: point.x.min(self.width),
            y: point.y.min(self.height),
        }
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A point in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: u32,
    pub y: u32,
}

impl PixelPoint {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for PixelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// An axis-aligned rectangle given by origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the rectangle lies entirely inside a frame of `size`.
    pub fn fits_within(&self, size: FrameSize) -> bool {
        self.right() <= size.width && self.bottom() <= size.height
    }
}

/// Rectangle spanned by two corner points, independent of click order.
///
/// The origin is the component-wise minimum and the size is the absolute
/// difference of the coordinates.
pub fn compute_rect(a: PixelPoint, b: PixelPoint) -> PixelRect {
    PixelRect {
        x: a.x.min(b.x),
        y: a.y.min(b.y),
        width: a.x.abs_diff(b.x),
        height: a.y.abs_diff(b.y),
    }
}

/// Region of interest as top-left and bottom-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roi {
    pub top_left: PixelPoint,
    pub bottom_right: PixelPoint,
}

impl Roi {
    /// ROI covering a whole frame.
    pub fn full_frame(size: FrameSize) -> Self {
        Self {
            top_left: PixelPoint::new(0, 0),
            bottom_right: PixelPoint::new(size.width, size.height),
        }
    }

    /// Build an ROI from two arbitrary corners, normalizing to (min, max).
    pub fn from_corners(a: PixelPoint, b: PixelPoint) -> Self {
        let rect = compute_rect(a, b);
        Self::from(rect)
    }

    pub fn rect(&self) -> PixelRect {
        compute_rect(self.top_left, self.bottom_right)
    }

    pub fn width(&self) -> u32 {
        self.rect().width
    }

    pub fn height(&self) -> u32 {
        self.rect().height
    }
}

impl From<PixelRect> for Roi {
    fn from(rect: PixelRect) -> Self {
        Self {
            top_left: PixelPoint::new(rect.x, rect.y),
            bottom_right: PixelPoint::new(rect.right(), rect.bottom()),
        }
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.top_left, self.bottom_right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_compute_rect_reversed_click_order() {
        let a = PixelPoint::new(400, 300);
        let b = PixelPoint::new(100, 100);
        assert_eq!(compute_rect(a, b), PixelRect::new(100, 100, 300, 200));
        assert_eq!(compute_rect(b, a), PixelRect::new(100, 100, 300, 200));
    }

    #[test]
    fn test_compute_rect_mixed_diagonal() {
        // bottom-left then top-right
        let rect = compute_rect(PixelPoint::new(10, 90), PixelPoint::new(50, 20));
        assert_eq!(rect, PixelRect::new(10, 20, 40, 70));
    }

    #[test]
    fn test_full_frame_roi() {
        let roi = Roi::full_frame(FrameSize::new(640, 480));
        assert_eq!(roi.rect(), PixelRect::new(0, 0, 640, 480));
        assert_eq!(roi.to_string(), "(0,0)-(640,480)");
    }

    #[test]
    fn test_roi_from_corners_normalizes() {
        let roi = Roi::from_corners(PixelPoint::new(400, 100), PixelPoint::new(100, 300));
        assert_eq!(roi.top_left, PixelPoint::new(100, 100));
        assert_eq!(roi.bottom_right, PixelPoint::new(400, 300));
        assert_eq!((roi.width(), roi.height()), (300, 200));
    }

    #[test]
    fn test_rect_fits_within() {
        let size = FrameSize::new(640, 480);
        assert!(PixelRect::new(0, 0, 640, 480).fits_within(size));
        assert!(!PixelRect::new(1, 0, 640, 480).fits_within(size));
        assert!(PixelRect::new(10, 10, 0, 5).is_empty());
    }

    #[test]
    fn test_frame_size_clamp() {
        let size = FrameSize::new(100, 50);
        assert_eq!(size.clamp(PixelPoint::new(120, 20)), PixelPoint::new(100, 20));
        assert_eq!(size.clamp(PixelPoint::new(5, 99)), PixelPoint::new(5, 50));
    }

    proptest! {
        #[test]
        fn prop_compute_rect_is_order_independent(
            x1 in 0u32..4096, y1 in 0u32..4096, x2 in 0u32..4096, y2 in 0u32..4096
        ) {
            let a = PixelPoint::new(x1, y1);
            let b = PixelPoint::new(x2, y2);
            let rect = compute_rect(a, b);

            prop_assert_eq!(rect, compute_rect(b, a));
            prop_assert_eq!((rect.x, rect.y), (x1.min(x2), y1.min(y2)));
            prop_assert_eq!(
                (rect.width, rect.height),
                ((x1 as i64 - x2 as i64).unsigned_abs() as u32, (y1 as i64 - y2 as i64).unsigned_abs() as u32)
            );
        }
    }
}
