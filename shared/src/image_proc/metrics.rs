//! Image comparison metrics.
//!
//! Both metrics compare interleaved RGB sample buffers against a reference
//! of the same size:
//!
//! - **MSE**: squared per-channel error summed over every sample and divided
//!   by the pixel count (not the sample count), so a uniform error of `e` in
//!   every channel yields `3 * e^2`.
//! - **PSNR**: `10 * log10(255^2 / MSE)` in decibels. Identical buffers have
//!   zero error and report `f64::INFINITY`.
//!
//! An image with no pixels has no defined mean and is rejected.

use crate::image_size::{ImageSize, RGB_CHANNELS};
use thiserror::Error;

/// Peak sample value of an 8-bit channel.
pub const PEAK_SAMPLE: f64 = 255.0;

/// Errors raised when two buffers cannot be compared.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MetricsError {
    #[error("Image sizes are not the same: image has {image} samples, reference has {reference}")]
    SizeMismatch { image: usize, reference: usize },
    #[error("Buffer of {actual} samples does not describe a non-empty {size} RGB image")]
    InvalidDimensions { size: ImageSize, actual: usize },
}

fn check_buffers(image: &[i32], reference: &[i32], size: ImageSize) -> Result<(), MetricsError> {
    if image.len() != reference.len() {
        return Err(MetricsError::SizeMismatch {
            image: image.len(),
            reference: reference.len(),
        });
    }
    if size.is_empty() || size.rgb_sample_count() != Some(image.len()) {
        return Err(MetricsError::InvalidDimensions {
            size,
            actual: image.len(),
        });
    }
    Ok(())
}

/// Mean squared error between `image` and `reference`.
///
/// # Errors
/// * `MetricsError::SizeMismatch` - the buffers have different lengths
/// * `MetricsError::InvalidDimensions` - the length disagrees with `size`,
///   or `size` has no pixels
pub fn mse(image: &[i32], reference: &[i32], size: ImageSize) -> Result<f64, MetricsError> {
    check_buffers(image, reference, size)?;

    let sq_err: f64 = image
        .iter()
        .zip(reference)
        .map(|(&a, &b)| {
            let diff = f64::from(a) - f64::from(b);
            diff * diff
        })
        .sum();

    // check_buffers guarantees a non-zero pixel count that fits in usize
    let pixels = image.len() / RGB_CHANNELS;
    Ok(sq_err / pixels as f64)
}

/// Peak signal-to-noise ratio of `image` against `reference`, in dB.
pub fn psnr(image: &[i32], reference: &[i32], size: ImageSize) -> Result<f64, MetricsError> {
    let mean_sq_err = mse(image, reference, size)?;
    Ok(10.0 * (PEAK_SAMPLE * PEAK_SAMPLE / mean_sq_err).log10())
}
