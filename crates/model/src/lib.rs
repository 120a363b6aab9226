//! VidCrop Model
//!
//! Defines the data contracts shared by the window and the render engine:
//! - **Geometry:** Pixel points, rectangles and the region of interest
//! - **Selector:** Two-click corner selection with edge snapping
//! - **Display:** Pointer tracking and the overlay drawn over a frame
//! - **Export:** Codec choice, frame-rate field and save-path validation
//!
//! Coordinates are integer pixels of the displayed frame, which is shown
//! at native resolution so they map 1:1 onto source pixels.

pub mod display;
pub mod export;
pub mod geometry;
pub mod selector;

pub use display::*;
pub use export::*;
pub use geometry::*;
pub use selector::*;
