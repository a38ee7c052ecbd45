//! Image dimensions and size utilities

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of colour channels carried by every interleaved RGB buffer.
pub const RGB_CHANNELS: usize = 3;

/// Image dimensions structure
///
/// Represents the width and height of a decoded frame. Interleaved sample
/// buffers sized from it always carry [`RGB_CHANNELS`] samples per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
}

impl ImageSize {
    /// Create a new ImageSize
    pub fn from_width_height(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Create a zeroed RGB sample array with this size
    ///
    /// Returns an ndarray Array3 of shape (height, width, 3).
    /// Note the row-major ordering convention: rows (height) come first.
    pub fn empty_rgb_array(&self) -> Array3<f64> {
        Array3::zeros((self.height, self.width, RGB_CHANNELS))
    }

    /// Get total number of pixels, or `None` if it overflows `usize`
    pub fn pixel_count(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }

    /// Number of interleaved RGB samples a buffer of this size holds, or
    /// `None` if it overflows `usize`
    pub fn rgb_sample_count(&self) -> Option<usize> {
        self.pixel_count()?.checked_mul(RGB_CHANNELS)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let size = ImageSize::from_width_height(4, 3);
        assert_eq!(size.pixel_count(), Some(12));
        assert_eq!(size.rgb_sample_count(), Some(36));
        assert_eq!(size.to_string(), "4x3");
        assert!(!size.is_empty());
        assert!(ImageSize::from_width_height(0, 3).is_empty());
    }

    #[test]
    fn test_counts_overflow_to_none() {
        let huge = ImageSize::from_width_height(usize::MAX / 2, 3);
        assert_eq!(huge.pixel_count(), None);
        assert_eq!(huge.rgb_sample_count(), None);

        // Pixel count fits but the sample count does not
        let wide = ImageSize::from_width_height(usize::MAX / 2, 1);
        assert_eq!(wide.pixel_count(), Some(usize::MAX / 2));
        assert_eq!(wide.rgb_sample_count(), None);
    }

    #[test]
    fn test_empty_rgb_array_is_row_major() {
        let size = ImageSize::from_width_height(5, 2);
        let arr = size.empty_rgb_array();
        assert_eq!(arr.dim(), (2, 5, RGB_CHANNELS));
        assert!(arr.iter().all(|&v| v == 0.0));
    }
}
