// SPDX-License-Identifier: GPL-3.0-only

//! Frame preprocessing ahead of barcode detection
//!
//! Grayscale, Gaussian blur, then a fixed binary threshold. The parameters
//! are constants; nothing here adapts to the frame content.

use crate::constants::preprocess::{BLUR_SIGMA, THRESHOLD};
use image::{GrayImage, RgbImage, imageops};
use imageproc::contrast::{ThresholdType, threshold_mut};
use tracing::trace;

/// Converts color frames into binary images for the decoder
#[derive(Debug, Clone, Copy)]
pub struct FramePreprocessor {
    blur_sigma: f32,
    threshold: u8,
}

impl Default for FramePreprocessor {
    fn default() -> Self {
        Self {
            blur_sigma: BLUR_SIGMA,
            threshold: THRESHOLD,
        }
    }
}

impl FramePreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a single-channel binary image with the frame's dimensions
    pub fn preprocess(&self, frame: &RgbImage) -> GrayImage {
        let start = std::time::Instant::now();
        let (width, height) = frame.dimensions();

        if width == 0 || height == 0 {
            return GrayImage::new(width, height);
        }

        let gray = imageops::grayscale(frame);
        let mut binary = imageops::blur(&gray, self.blur_sigma);
        // Values above the cutoff become 255, everything else 0
        threshold_mut(&mut binary, self.threshold, ThresholdType::Binary);

        trace!(
            width,
            height,
            elapsed_us = start.elapsed().as_micros(),
            "Frame preprocessed"
        );

        binary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_output_matches_input_dimensions() {
        let frame = RgbImage::from_pixel(37, 19, Rgb([200, 10, 90]));
        let binary = FramePreprocessor::new().preprocess(&frame);
        assert_eq!(binary.dimensions(), (37, 19));
    }

    #[test]
    fn test_output_is_binary() {
        let frame = RgbImage::from_fn(64, 64, |x, y| {
            let v = ((x * 4 + y * 2) % 256) as u8;
            Rgb([v, v / 2, 255 - v])
        });
        let binary = FramePreprocessor::new().preprocess(&frame);
        assert!(binary.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_threshold_cutoff() {
        let bright = RgbImage::from_pixel(16, 16, Rgb([180, 180, 180]));
        let dark = RgbImage::from_pixel(16, 16, Rgb([60, 60, 60]));
        let preprocessor = FramePreprocessor::new();

        assert!(preprocessor.preprocess(&bright).pixels().all(|p| p.0[0] == 255));
        assert!(preprocessor.preprocess(&dark).pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_exact_cutoff_is_black() {
        let mut image = GrayImage::from_pixel(2, 1, image::Luma([THRESHOLD]));
        image.put_pixel(1, 0, image::Luma([THRESHOLD + 1]));
        threshold_mut(&mut image, THRESHOLD, ThresholdType::Binary);
        assert_eq!(image.get_pixel(0, 0).0[0], 0);
        assert_eq!(image.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn test_empty_frame() {
        let binary = FramePreprocessor::new().preprocess(&RgbImage::new(0, 0));
        assert_eq!(binary.dimensions(), (0, 0));
    }
}
