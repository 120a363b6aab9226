//! Decoded frame buffers.

use vidcrop_common::error::{CropperError, CropperResult};
use vidcrop_model::geometry::{FrameSize, PixelRect};

/// Bytes per pixel of the RGB24 frames exchanged with ffmpeg.
pub const RGB_CHANNELS: usize = 3;

/// A single decoded image: `height x width x channels` bytes, row-major,
/// channels interleaved.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Frame {
    /// Wrap a raw buffer, checking that its length matches the shape.
    pub fn from_raw(width: u32, height: u32, channels: usize, data: Vec<u8>) -> CropperResult<Self> {
        let expected = frame_len(width, height, channels);
        if data.len() != expected {
            return Err(CropperError::export(format!(
                "Frame buffer holds {} bytes, expected {} for {}x{}x{}",
                data.len(),
                expected,
                width,
                height,
                channels
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Channel values of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * self.channels;
        self.data.get(start..start + self.channels)
    }

    /// Copy rows `[y, y + height)` and columns `[x, x + width)`, keeping
    /// every channel.
    pub fn crop(&self, rect: &PixelRect) -> CropperResult<Frame> {
        if !rect.fits_within(self.size()) {
            return Err(CropperError::export(format!(
                "Crop rectangle {}x{} at ({},{}) exceeds frame {}",
                rect.width,
                rect.height,
                rect.x,
                rect.y,
                self.size()
            )));
        }

        let row_stride = self.width as usize * self.channels;
        let out_stride = rect.width as usize * self.channels;
        let col_offset = rect.x as usize * self.channels;

        let mut data = Vec::with_capacity(out_stride * rect.height as usize);
        for row in rect.y..rect.bottom() {
            let start = row as usize * row_stride + col_offset;
            data.extend_from_slice(&self.data[start..start + out_stride]);
        }

        Ok(Frame {
            width: rect.width,
            height: rect.height,
            channels: self.channels,
            data,
        })
    }
}

/// Byte length of a frame with the given shape.
pub fn frame_len(width: u32, height: u32, channels: usize) -> usize {
    width as usize * height as usize * channels
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frame whose pixel at (x, y) is `[x, y, 7]`.
    fn coordinate_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, 7]);
            }
        }
        Frame::from_raw(width, height, RGB_CHANNELS, data).unwrap()
    }

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        assert!(Frame::from_raw(2, 2, 3, vec![0; 11]).is_err());
        assert!(Frame::from_raw(2, 2, 3, vec![0; 12]).is_ok());
    }

    #[test]
    fn test_crop_selects_rows_and_columns() {
        let frame = coordinate_frame(10, 8);
        let cropped = frame.crop(&PixelRect::new(2, 3, 4, 2)).unwrap();

        assert_eq!(cropped.size(), FrameSize::new(4, 2));
        assert_eq!(cropped.channels(), 3);
        assert_eq!(cropped.pixel(0, 0), Some(&[2, 3, 7][..]));
        assert_eq!(cropped.pixel(3, 1), Some(&[5, 4, 7][..]));
        assert_eq!(cropped.pixel(4, 0), None);
    }

    #[test]
    fn test_full_frame_crop_is_identity() {
        let frame = coordinate_frame(6, 4);
        let cropped = frame.crop(&PixelRect::new(0, 0, 6, 4)).unwrap();
        assert_eq!(cropped, frame);
    }

    #[test]
    fn test_crop_outside_frame_fails() {
        let frame = coordinate_frame(6, 4);
        assert!(frame.crop(&PixelRect::new(3, 0, 4, 4)).is_err());
    }

    #[test]
    fn test_crop_preserves_channel_count() {
        let frame = Frame::from_raw(4, 4, 4, vec![1; 64]).unwrap();
        let cropped = frame.crop(&PixelRect::new(1, 1, 2, 2)).unwrap();
        assert_eq!(cropped.channels(), 4);
        assert_eq!(cropped.data().len(), 16);
    }
}
