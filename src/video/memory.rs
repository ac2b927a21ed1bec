//! In-memory video backend

use image::DynamicImage;

use crate::error::{LabelsError, Result};
use crate::video::{VideoBackend, VideoShape};

/// Decoded frames held in memory, indexed by frame number.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVideo {
    frames: Vec<DynamicImage>,
}

impl InMemoryVideo {
    pub fn new(frames: Vec<DynamicImage>) -> Self {
        Self { frames }
    }

    /// `count` blank grayscale frames, each filled with its own index.
    pub fn blank_gray(count: usize, width: u32, height: u32) -> Self {
        let frames = (0..count)
            .map(|i| {
                let buffer =
                    image::GrayImage::from_pixel(width, height, image::Luma([(i % 256) as u8]));
                DynamicImage::ImageLuma8(buffer)
            })
            .collect();
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl VideoBackend for InMemoryVideo {
    fn shape(&self) -> Option<VideoShape> {
        self.frames
            .first()
            .map(|first| VideoShape::of_image(first, self.frames.len()))
    }

    fn get_frame(&self, frame_idx: usize) -> Result<DynamicImage> {
        self.frames.get(frame_idx).cloned().ok_or_else(|| {
            LabelsError::VideoUnavailable(format!(
                "frame {} out of range ({} frames)",
                frame_idx,
                self.frames.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_gray_shape() {
        let video = InMemoryVideo::blank_gray(5, 16, 8);
        let shape = video.shape().unwrap();
        assert_eq!(shape.frames, 5);
        assert_eq!((shape.width, shape.height, shape.channels), (16, 8, 1));
    }

    #[test]
    fn test_get_frame_out_of_range() {
        let video = InMemoryVideo::blank_gray(2, 4, 4);
        assert!(video.get_frame(1).is_ok());
        assert!(video.get_frame(2).is_err());
    }

    #[test]
    fn test_frame_content_encodes_index() {
        let video = InMemoryVideo::blank_gray(3, 2, 2);
        let frame = video.get_frame(2).unwrap().to_luma8();
        assert_eq!(frame.get_pixel(0, 0).0, [2]);
    }
}
