//! Error taxonomy for the deconvolution core.

use crate::image_proc::grid::GridShape;
use thiserror::Error;

/// Errors raised by grid construction, convolution, pointwise operations
/// and PSF configuration.
///
/// Every variant is a precondition failure detected before any output is
/// written. Zero denominators inside pointwise division are not errors;
/// see [`crate::image_proc::elementwise::divide`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeblurError {
    #[error("Dimensions do not agree: {left} vs {right}")]
    ShapeMismatch { left: GridShape, right: GridShape },
    #[error("Kernel must have odd, non-zero dimensions, got {rows}x{cols}")]
    InvalidKernelSize { rows: usize, cols: usize },
    #[error("Invalid PSF configuration: {0}")]
    InvalidPsfConfig(String),
    #[error("Buffer holds {actual} samples but {expected} were expected")]
    BufferLength { expected: usize, actual: usize },
    #[error("A {width}x{height} RGB grid has more samples than fit in memory")]
    GridTooLarge { width: usize, height: usize },
    #[error("Configuration error: {0}")]
    Config(String),
}
