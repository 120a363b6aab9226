//! Per-frame transforms applied while streaming an export.

use vidcrop_common::error::CropperResult;
use vidcrop_model::geometry::{FrameSize, PixelRect};

use crate::frame::Frame;

/// A pure function from one decoded frame to one output frame.
pub trait FrameTransform {
    fn apply(&self, frame: Frame) -> CropperResult<Frame>;

    /// Dimensions of the frames this transform produces from `input`.
    fn output_size(&self, input: FrameSize) -> FrameSize;
}

/// Keep only the pixels inside a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropTransform {
    rect: PixelRect,
}

impl CropTransform {
    pub fn new(rect: PixelRect) -> Self {
        Self { rect }
    }

    pub fn rect(&self) -> PixelRect {
        self.rect
    }
}

impl FrameTransform for CropTransform {
    fn apply(&self, frame: Frame) -> CropperResult<Frame> {
        frame.crop(&self.rect)
    }

    fn output_size(&self, _input: FrameSize) -> FrameSize {
        FrameSize::new(self.rect.width, self.rect.height)
    }
}

/// Lazily apply `transform` to every frame of `frames`.
///
/// Errors from the source pass through untouched; nothing is buffered.
pub fn transform_frames<'a, I, T>(
    frames: I,
    transform: &'a T,
) -> impl Iterator<Item = CropperResult<Frame>> + 'a
where
    I: Iterator<Item = CropperResult<Frame>> + 'a,
    T: FrameTransform + ?Sized,
{
    frames.map(move |frame| frame.and_then(|frame| transform.apply(frame)))
}
