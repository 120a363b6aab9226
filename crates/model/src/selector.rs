//! Two-click region selection.
//!
//! Each pointer press appends a corner to a buffer. When the buffer holds
//! two corners they are snapped to the frame edges and the resulting
//! [`Roi`] is returned to the caller. A press after a completed selection
//! starts a new buffer containing only that press.

use crate::geometry::{FrameSize, PixelPoint, Roi};

/// Default distance in pixels within which a corner snaps to an edge.
pub const DEFAULT_SNAP_MARGIN: u32 = 6;

/// Selection progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// No corner selected yet.
    Empty,
    /// First corner placed; the second follows the pointer.
    OneCorner(PixelPoint),
    /// Both corners placed and snapped.
    Complete(Roi),
}

/// Tracks clicked corners for one loaded frame.
#[derive(Debug, Clone)]
pub struct RegionSelector {
    frame: FrameSize,
    snap_margin: u32,
    corners: Vec<PixelPoint>,
}

impl RegionSelector {
    pub fn new(frame: FrameSize, snap_margin: u32) -> Self {
        Self {
            frame,
            snap_margin,
            corners: Vec::with_capacity(2),
        }
    }

    /// Forget all corners and adopt a new frame size.
    pub fn reset(&mut self, frame: FrameSize) {
        self.frame = frame;
        self.corners.clear();
    }

    /// Register a pointer press. Returns the finalized ROI when this press
    /// completes a two-corner selection.
    pub fn on_pointer_down(&mut self, point: PixelPoint) -> Option<Roi> {
        if self.corners.len() == 2 {
            self.corners.clear();
        }
        self.corners.push(self.frame.clamp(point));

        if self.corners.len() < 2 {
            tracing::debug!(corner = %point, "First corner selected");
            return None;
        }

        for corner in &mut self.corners {
            *corner = snap_to_edges(*corner, self.frame, self.snap_margin);
        }

        let roi = Roi::from_corners(self.corners[0], self.corners[1]);
        tracing::info!(roi = %roi, "Region of interest selected");
        Some(roi)
    }

    /// Corners exactly as stored (snapped once complete), in click order.
    pub fn corners(&self) -> &[PixelPoint] {
        &self.corners
    }

    pub fn state(&self) -> SelectionState {
        match self.corners.as_slice() {
            [] => SelectionState::Empty,
            [first] => SelectionState::OneCorner(*first),
            [first, second, ..] => SelectionState::Complete(Roi::from_corners(*first, *second)),
        }
    }

    /// Completed selection, if any, as (top-left, bottom-right).
    pub fn selected(&self) -> Option<Roi> {
        match self.state() {
            SelectionState::Complete(roi) => Some(roi),
            _ => None,
        }
    }

    /// ROI to crop with: the completed selection, or the full frame
    /// otherwise.
    pub fn effective_roi(&self) -> Roi {
        self.selected()
            .unwrap_or_else(|| Roi::full_frame(self.frame))
    }
}

/// Snap coordinates near the frame edges onto the edges.
///
/// A coordinate below `margin` becomes 0; otherwise one above
/// `extent - margin` becomes `extent`.
pub fn snap_to_edges(point: PixelPoint, frame: FrameSize, margin: u32) -> PixelPoint {
    PixelPoint {
        x: snap_axis(point.x, frame.width, margin),
        y: snap_axis(point.y, frame.height, margin),
    }
}

fn snap_axis(value: u32, extent: u32, margin: u32) -> u32 {
    if value < margin {
        0
    } else if value > extent.saturating_sub(margin) {
        extent
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PixelRect;
    use proptest::prelude::*;

    fn selector() -> RegionSelector {
        RegionSelector::new(FrameSize::new(640, 480), DEFAULT_SNAP_MARGIN)
    }

    #[test]
    fn test_two_clicks_finalize_roi() {
        let mut sel = selector();
        assert_eq!(sel.on_pointer_down(PixelPoint::new(100, 100)), None);
        assert_eq!(sel.state(), SelectionState::OneCorner(PixelPoint::new(100, 100)));

        let roi = sel.on_pointer_down(PixelPoint::new(400, 300)).unwrap();
        assert_eq!(roi.rect(), PixelRect::new(100, 100, 300, 200));
        assert_eq!(sel.effective_roi().rect(), PixelRect::new(100, 100, 300, 200));
    }

    #[test]
    fn test_third_click_starts_new_selection() {
        let mut sel = selector();
        sel.on_pointer_down(PixelPoint::new(100, 100));
        sel.on_pointer_down(PixelPoint::new(400, 300));

        assert_eq!(sel.on_pointer_down(PixelPoint::new(50, 60)), None);
        assert_eq!(sel.corners(), &[PixelPoint::new(50, 60)]);
        assert_eq!(sel.selected(), None);
    }

    #[test]
    fn test_incomplete_selection_uses_full_frame() {
        let mut sel = selector();
        assert_eq!(sel.effective_roi(), Roi::full_frame(FrameSize::new(640, 480)));

        sel.on_pointer_down(PixelPoint::new(200, 200));
        assert_eq!(sel.effective_roi().rect(), PixelRect::new(0, 0, 640, 480));
    }

    #[test]
    fn test_snapping_to_all_edges() {
        let mut sel = selector();
        sel.on_pointer_down(PixelPoint::new(5, 3));
        let roi = sel.on_pointer_down(PixelPoint::new(636, 477)).unwrap();
        assert_eq!(roi, Roi::full_frame(FrameSize::new(640, 480)));
    }

    #[test]
    fn test_snapping_boundaries() {
        let frame = FrameSize::new(640, 480);
        assert_eq!(snap_axis(6, 640, 6), 6);
        assert_eq!(snap_axis(634, 640, 6), 634);
        assert_eq!(snap_axis(635, 640, 6), 640);
        assert_eq!(
            snap_to_edges(PixelPoint::new(0, 475), frame, 6),
            PixelPoint::new(0, 480)
        );
    }

    #[test]
    fn test_first_corner_is_not_snapped_until_complete() {
        let mut sel = selector();
        sel.on_pointer_down(PixelPoint::new(2, 2));
        assert_eq!(sel.corners(), &[PixelPoint::new(2, 2)]);

        sel.on_pointer_down(PixelPoint::new(100, 100));
        assert_eq!(sel.corners()[0], PixelPoint::new(0, 0));
    }

    #[test]
    fn test_clicks_outside_frame_are_clamped() {
        let mut sel = selector();
        sel.on_pointer_down(PixelPoint::new(100, 100));
        let roi = sel.on_pointer_down(PixelPoint::new(9000, 9000)).unwrap();
        assert_eq!(roi.bottom_right, PixelPoint::new(640, 480));
    }

    #[test]
    fn test_reverse_order_click_is_normalized_for_cropping() {
        let mut sel = selector();
        sel.on_pointer_down(PixelPoint::new(400, 300));
        sel.on_pointer_down(PixelPoint::new(100, 100));

        let roi = sel.effective_roi();
        assert_eq!(roi.top_left, PixelPoint::new(100, 100));
        assert_eq!(roi.bottom_right, PixelPoint::new(400, 300));
    }

    #[test]
    fn test_reverse_order_clicks_finalize_top_left_first() {
        let mut sel = selector();
        sel.on_pointer_down(PixelPoint::new(400, 300));
        let roi = sel.on_pointer_down(PixelPoint::new(100, 100)).unwrap();

        assert_eq!(roi.top_left, PixelPoint::new(100, 100));
        assert_eq!(roi.bottom_right, PixelPoint::new(400, 300));
        assert_eq!(roi.to_string(), "(100,100)-(400,300)");
        assert_eq!(sel.selected(), Some(roi));
        // Stored corners keep click order.
        assert_eq!(
            sel.corners(),
            &[PixelPoint::new(400, 300), PixelPoint::new(100, 100)]
        );
    }

    #[test]
    fn test_mixed_corners_are_normalized() {
        let mut sel = selector();
        sel.on_pointer_down(PixelPoint::new(400, 100));
        let roi = sel.on_pointer_down(PixelPoint::new(100, 300)).unwrap();
        assert_eq!(roi.top_left, PixelPoint::new(100, 100));
        assert_eq!(roi.bottom_right, PixelPoint::new(400, 300));
    }

    #[test]
    fn test_reset_clears_corners() {
        let mut sel = selector();
        sel.on_pointer_down(PixelPoint::new(100, 100));
        sel.reset(FrameSize::new(320, 240));
        assert_eq!(sel.state(), SelectionState::Empty);
        assert_eq!(sel.effective_roi().rect(), PixelRect::new(0, 0, 320, 240));
    }

    proptest! {
        #[test]
        fn prop_snapping_rule(w in 12u32..2000, h in 12u32..2000, fx in 0.0f64..=1.0, fy in 0.0f64..=1.0) {
            let frame = FrameSize::new(w, h);
            let x = (fx * w as f64) as u32;
            let y = (fy * h as f64) as u32;
            let snapped = snap_to_edges(PixelPoint::new(x, y), frame, DEFAULT_SNAP_MARGIN);

            let expect_x = if x < 6 { 0 } else if x > w - 6 { w } else { x };
            let expect_y = if y < 6 { 0 } else if y > h - 6 { h } else { y };
            prop_assert_eq!(snapped, PixelPoint::new(expect_x, expect_y));
        }

        #[test]
        fn prop_roi_stays_inside_frame(
            x1 in 0u32..5000, y1 in 0u32..5000, x2 in 0u32..5000, y2 in 0u32..5000
        ) {
            let frame = FrameSize::new(1280, 720);
            let mut sel = RegionSelector::new(frame, DEFAULT_SNAP_MARGIN);
            sel.on_pointer_down(PixelPoint::new(x1, y1));
            sel.on_pointer_down(PixelPoint::new(x2, y2));
            prop_assert!(sel.effective_roi().rect().fits_within(frame));
        }
    }
}
