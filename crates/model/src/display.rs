//! Frame display state and overlay geometry.
//!
//! The display shows one frame at native resolution. On every repaint it
//! draws the frame, a horizontal and a vertical guide through the pointer,
//! and a translucent fill over the region being selected. This module
//! computes what to draw; the window turns an [`Overlay`] into paint calls.

use crate::geometry::{compute_rect, FrameSize, PixelPoint, PixelRect};
use crate::selector::{RegionSelector, SelectionState};

/// An 8-bit RGBA color, alpha not premultiplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Color of the pointer guide lines.
pub const GUIDE_COLOR: Rgba = Rgba::new(168, 34, 3, 127);

/// Fill color of the selection rectangle.
pub const SELECTION_COLOR: Rgba = Rgba::new(0, 0, 255, 127);

/// A straight guide line between two pixel positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuideLine {
    pub from: PixelPoint,
    pub to: PixelPoint,
}

/// Everything drawn on top of the frame for one repaint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    /// Full-width line through the pointer.
    pub horizontal: GuideLine,
    /// Full-height line through the pointer.
    pub vertical: GuideLine,
    /// Selection fill, present once at least one corner is placed.
    pub selection: Option<PixelRect>,
}

/// Pointer tracking for the frame display.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    frame: Option<FrameSize>,
    pointer: PixelPoint,
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a new frame; the display is sized to exactly these dimensions.
    pub fn set_frame(&mut self, size: FrameSize) {
        self.frame = Some(size);
        self.pointer = size.clamp(self.pointer);
    }

    /// Size the display occupies, `None` until a frame is shown.
    pub fn frame_size(&self) -> Option<FrameSize> {
        self.frame
    }

    pub fn pointer(&self) -> PixelPoint {
        self.pointer
    }

    /// Convert a position relative to the display's top-left corner into
    /// frame pixels, clamped to the frame.
    pub fn to_pixel(&self, local_x: f32, local_y: f32) -> Option<PixelPoint> {
        let size = self.frame?;
        let x = local_x.max(0.0).floor() as u32;
        let y = local_y.max(0.0).floor() as u32;
        Some(size.clamp(PixelPoint::new(x, y)))
    }

    /// Track a pointer movement in display-local coordinates.
    pub fn on_pointer_move(&mut self, local_x: f32, local_y: f32) {
        if let Some(point) = self.to_pixel(local_x, local_y) {
            self.pointer = point;
        }
    }

    /// Overlay to draw for the current pointer and selection.
    pub fn overlay(&self, selector: &RegionSelector) -> Option<Overlay> {
        let size = self.frame?;
        let pointer = self.pointer;

        let selection = match selector.state() {
            SelectionState::Empty => None,
            SelectionState::OneCorner(first) => Some(compute_rect(first, pointer)),
            SelectionState::Complete(roi) => Some(compute_rect(roi.top_left, roi.bottom_right)),
        };

        Some(Overlay {
            horizontal: GuideLine {
                from: PixelPoint::new(0, pointer.y),
                to: PixelPoint::new(size.width, pointer.y),
            },
            vertical: GuideLine {
                from: PixelPoint::new(pointer.x, 0),
                to: PixelPoint::new(pointer.x, size.height),
            },
            selection,
        })
    }
}
