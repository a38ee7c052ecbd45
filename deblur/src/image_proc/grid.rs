//! Image grids and convolution kernels.
//!
//! Both types wrap a row-major `(rows, cols, channels)` ndarray buffer, so a
//! sample at `(row, col, channel)` lives at `(row * cols + col) * channels +
//! channel` in one contiguous allocation. Grids always carry three colour
//! channels; kernels carry one weight per channel per cell.

use crate::error::DeblurError;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut3};
use shared::image_proc::RgbBuffer;
use shared::image_size::{ImageSize, RGB_CHANNELS};
use std::fmt;

/// Number of channels carried by every [`ImageGrid`].
pub const CHANNELS: usize = RGB_CHANNELS;

/// `(height, width, channels)` of a grid or `(rows, cols, channels)` of a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl GridShape {
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    fn of(array: &Array3<f64>) -> Self {
        let (height, width, channels) = array.dim();
        Self::new(height, width, channels)
    }

    pub fn sample_count(&self) -> usize {
        self.height * self.width * self.channels
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.height, self.width, self.channels)
    }
}

/// Round to the nearest integer and clamp into the 8-bit sample range.
fn quantize(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Height x width grid of RGB pixels with real-valued samples.
///
/// Samples are unbounded while the grid is being processed; quantization
/// back to `[0, 255]` only happens in [`ImageGrid::to_rgb`] and
/// [`ImageGrid::to_samples`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGrid {
    data: Array3<f64>,
}

impl ImageGrid {
    /// A grid of the given size with every sample set to zero.
    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            data: ImageSize::from_width_height(width, height).empty_rgb_array(),
        }
    }

    /// Wrap a `(height, width, 3)` array.
    ///
    /// Arrays in a non-standard memory order are copied into row-major order.
    pub fn from_array(data: Array3<f64>) -> Result<Self, DeblurError> {
        let shape = GridShape::of(&data);
        if shape.channels != CHANNELS {
            return Err(DeblurError::ShapeMismatch {
                left: shape,
                right: GridShape::new(shape.height, shape.width, CHANNELS),
            });
        }
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok(Self { data })
    }

    /// Build a grid from interleaved `R, G, B` samples in row-major order.
    pub fn from_flat(samples: &[f64], width: usize, height: usize) -> Result<Self, DeblurError> {
        let expected = ImageSize::from_width_height(width, height)
            .rgb_sample_count()
            .ok_or(DeblurError::GridTooLarge { width, height })?;
        if samples.len() != expected {
            return Err(DeblurError::BufferLength {
                expected,
                actual: samples.len(),
            });
        }
        let data = Array3::from_shape_vec((height, width, CHANNELS), samples.to_vec()).map_err(
            |_| DeblurError::BufferLength {
                expected,
                actual: samples.len(),
            },
        )?;
        Ok(Self { data })
    }

    /// Build a grid from a decoded 8-bit frame.
    pub fn from_rgb(buffer: &RgbBuffer) -> Result<Self, DeblurError> {
        let size = buffer.size();
        let samples: Vec<f64> = buffer.samples().iter().map(|&s| f64::from(s)).collect();
        Self::from_flat(&samples, size.width, size.height)
    }

    /// Quantize into an 8-bit frame ready for encoding.
    pub fn to_rgb(&self) -> Result<RgbBuffer, DeblurError> {
        let samples: Vec<u8> = self.data.iter().map(|&v| quantize(v)).collect();
        let actual = samples.len();
        RgbBuffer::new(self.size(), samples).map_err(|_| DeblurError::BufferLength {
            expected: self.shape().sample_count(),
            actual,
        })
    }

    /// Quantized samples widened to `i32`, the form the quality metrics use.
    pub fn to_samples(&self) -> Vec<i32> {
        self.data.iter().map(|&v| i32::from(quantize(v))).collect()
    }

    pub fn shape(&self) -> GridShape {
        GridShape::of(&self.data)
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::from_width_height(self.width(), self.height())
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    pub fn get(&self, row: usize, col: usize, channel: usize) -> Option<f64> {
        self.data.get((row, col, channel)).copied()
    }

    pub fn view(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut3<'_, f64> {
        self.data.view_mut()
    }

    pub fn into_array(self) -> Array3<f64> {
        self.data
    }

    /// Iterate over every sample in row-major order.
    pub fn samples(&self) -> impl Iterator<Item = &f64> {
        self.data.iter()
    }

    /// Smallest sample, or `None` for an empty grid.
    pub fn min_sample(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::min)
    }

    /// Largest sample, or `None` for an empty grid.
    pub fn max_sample(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::max)
    }
}

/// Small grid of per-channel weights applied by a convolver.
///
/// Construction accepts any non-empty shape; the convolver rejects kernels
/// without a unique center (even rows or columns).
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Array3<f64>,
}

impl Kernel {
    /// Wrap a `(rows, cols, channels)` weight array.
    pub fn from_array(weights: Array3<f64>) -> Result<Self, DeblurError> {
        let (rows, cols, channels) = weights.dim();
        if rows == 0 || cols == 0 || channels == 0 {
            return Err(DeblurError::InvalidKernelSize { rows, cols });
        }
        let weights = if weights.is_standard_layout() {
            weights
        } else {
            weights.as_standard_layout().into_owned()
        };
        Ok(Self { weights })
    }

    /// Copy a single-channel weight map into every RGB channel, scaled by
    /// `channel_scale`.
    pub fn replicate_channels(
        weights: ArrayView2<'_, f64>,
        channel_scale: f64,
    ) -> Result<Self, DeblurError> {
        let (rows, cols) = weights.dim();
        Self::from_array(Array3::from_shape_fn(
            (rows, cols, CHANNELS),
            |(r, c, _)| weights[[r, c]] * channel_scale,
        ))
    }

    /// Kernel whose only non-zero weight is 1 at the center of every channel.
    pub fn identity(size: usize) -> Result<Self, DeblurError> {
        let mut weights = Array2::zeros((size, size));
        if size > 0 {
            weights[[size / 2, size / 2]] = 1.0;
        }
        Self::replicate_channels(weights.view(), 1.0)
    }

    /// Kernel with every weight set to zero.
    pub fn zeros(size: usize) -> Result<Self, DeblurError> {
        Self::from_array(Array3::zeros((size, size, CHANNELS)))
    }

    /// Box filter: every cell weighs `1 / size^2` in every channel.
    pub fn uniform(size: usize) -> Result<Self, DeblurError> {
        let weight = 1.0 / (size * size) as f64;
        Self::from_array(Array3::from_elem((size, size, CHANNELS), weight))
    }

    /// 180 degree rotation: cell `(r, c)` moves to `(rows-1-r, cols-1-c)`
    /// in every channel. Convolving with the rotated kernel applies the
    /// adjoint of convolving with the original.
    pub fn rotated_180(&self) -> Self {
        let (rows, cols, channels) = self.weights.dim();
        let weights = Array3::from_shape_fn((rows, cols, channels), |(r, c, k)| {
            self.weights[[rows - 1 - r, cols - 1 - c, k]]
        });
        Self { weights }
    }

    pub fn shape(&self) -> GridShape {
        GridShape::of(&self.weights)
    }

    pub fn rows(&self) -> usize {
        self.weights.dim().0
    }

    pub fn cols(&self) -> usize {
        self.weights.dim().1
    }

    pub fn channels(&self) -> usize {
        self.weights.dim().2
    }

    /// `(center_row, center_col)` using integer division.
    pub fn center(&self) -> (usize, usize) {
        (self.rows() / 2, self.cols() / 2)
    }

    pub fn has_odd_dims(&self) -> bool {
        self.rows() % 2 == 1 && self.cols() % 2 == 1
    }

    pub fn weight(&self, row: usize, col: usize, channel: usize) -> Option<f64> {
        self.weights.get((row, col, channel)).copied()
    }

    pub fn view(&self) -> ArrayView3<'_, f64> {
        self.weights.view()
    }

    /// Sum of every cell's weight in one channel.
    pub fn channel_sum(&self, channel: usize) -> f64 {
        (0..self.rows())
            .flat_map(|r| (0..self.cols()).map(move |c| (r, c)))
            .filter_map(|(r, c)| self.weight(r, c, channel))
            .sum()
    }

    /// Sum of every weight across all cells and channels.
    pub fn total_weight(&self) -> f64 {
        self.weights.sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_flat_is_row_major_interleaved() {
        let samples: Vec<f64> = (0..12).map(f64::from).collect();
        let grid = ImageGrid::from_flat(&samples, 2, 2).unwrap();

        assert_eq!(grid.shape(), GridShape::new(2, 2, 3));
        assert_eq!(grid.get(0, 0, 0), Some(0.0));
        assert_eq!(grid.get(0, 1, 2), Some(5.0));
        assert_eq!(grid.get(1, 0, 1), Some(7.0));
        assert_eq!(grid.get(1, 1, 2), Some(11.0));
        assert_eq!(grid.get(2, 0, 0), None);
    }

    #[test]
    fn test_from_flat_rejects_wrong_length() {
        let err = ImageGrid::from_flat(&[0.0; 10], 2, 2).unwrap_err();
        assert_eq!(
            err,
            DeblurError::BufferLength {
                expected: 12,
                actual: 10
            }
        );
    }

    #[test]
    fn test_from_flat_rejects_overflowing_dimensions() {
        let err = ImageGrid::from_flat(&[0.0; 3], usize::MAX, 2).unwrap_err();
        assert_eq!(
            err,
            DeblurError::GridTooLarge {
                width: usize::MAX,
                height: 2
            }
        );
    }

    #[test]
    fn test_from_array_requires_three_channels() {
        let err = ImageGrid::from_array(Array3::zeros((2, 2, 4))).unwrap_err();
        assert!(matches!(err, DeblurError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_from_array_normalizes_layout() {
        let data = Array3::from_shape_fn((3, 2, 3), |(r, c, k)| (r * 100 + c * 10 + k) as f64);
        let transposed = data.clone().permuted_axes([1, 0, 2]);
        let grid = ImageGrid::from_array(transposed).unwrap();

        assert!(grid.view().is_standard_layout());
        assert_eq!(grid.shape(), GridShape::new(2, 3, 3));
        assert_eq!(grid.get(1, 2, 1), Some(211.0));
    }

    #[test]
    fn test_quantization_rounds_and_clamps() {
        let grid = ImageGrid::from_flat(&[-4.0, 0.49, 0.5, 254.6, 300.0, f64::NAN], 2, 1).unwrap();
        let rgb = grid.to_rgb().unwrap();

        assert_eq!(rgb.samples(), &[0, 0, 1, 255, 255, 0]);
        assert_eq!(grid.to_samples(), vec![0, 0, 1, 255, 255, 0]);
        assert_eq!(rgb.size(), ImageSize::from_width_height(2, 1));
    }

    #[test]
    fn test_rgb_round_trip() {
        let size = ImageSize::from_width_height(2, 2);
        let samples: Vec<u8> = (0..12).map(|v| v * 20).collect();
        let buffer = RgbBuffer::new(size, samples).unwrap();

        let grid = ImageGrid::from_rgb(&buffer).unwrap();
        assert_eq!(grid.get(1, 1, 2), Some(220.0));
        assert_eq!(grid.to_rgb().unwrap(), buffer);
    }

    #[test]
    fn test_min_max_samples() {
        let grid = ImageGrid::from_flat(&[3.0, -1.0, 7.5], 1, 1).unwrap();
        assert_eq!(grid.min_sample(), Some(-1.0));
        assert_eq!(grid.max_sample(), Some(7.5));
        assert_eq!(ImageGrid::zeros(0, 0).min_sample(), None);
    }

    #[test]
    fn test_kernel_rotation() {
        let weights = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let kernel = Kernel::replicate_channels(weights.view(), 1.0).unwrap();
        let rotated = kernel.rotated_180();

        for r in 0..3 {
            for c in 0..3 {
                for k in 0..CHANNELS {
                    assert_eq!(rotated.weight(r, c, k), kernel.weight(2 - r, 2 - c, k));
                }
            }
        }
        assert_eq!(rotated.weight(0, 0, 0), Some(9.0));
        assert_eq!(rotated.rotated_180(), kernel);
    }

    #[test]
    fn test_kernel_constructors() {
        let identity = Kernel::identity(3).unwrap();
        assert_eq!(identity.center(), (1, 1));
        assert_eq!(identity.weight(1, 1, 2), Some(1.0));
        assert_eq!(identity.total_weight(), 3.0);

        let uniform = Kernel::uniform(3).unwrap();
        assert!((uniform.channel_sum(0) - 1.0).abs() < 1e-12);
        assert!(uniform.has_odd_dims());

        assert_eq!(Kernel::zeros(5).unwrap().total_weight(), 0.0);
        assert!(!Kernel::zeros(4).unwrap().has_odd_dims());
    }

    #[test]
    fn test_empty_kernel_is_rejected() {
        assert_eq!(
            Kernel::zeros(0).unwrap_err(),
            DeblurError::InvalidKernelSize { rows: 0, cols: 0 }
        );
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(GridShape::new(4, 5, 3).to_string(), "[4, 5, 3]");
    }
}
