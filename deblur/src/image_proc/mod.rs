//! Image processing primitives for the deconvolution core
//!
//! This module provides the RGB grid and kernel types, 2D convolution with
//! zero-padded borders, and the pointwise arithmetic the Richardson-Lucy
//! update is assembled from.

pub mod convolve2d;
pub mod elementwise;
pub mod grid;

// Re-export key functionality for easier access
pub use convolve2d::{convolve2d, ConvolveStrategy, Convolver, ParallelConvolver, SerialConvolver};
pub use elementwise::{divide, multiply, multiply_assign};
pub use grid::{GridShape, ImageGrid, Kernel, CHANNELS};
