//! 8-bit RGB image decode and encode.
//!
//! Decoded frames are flattened into interleaved `R, G, B` samples in
//! row-major order with any alpha channel discarded. Encoded frames are
//! written with an opaque alpha channel; the container format is chosen
//! from the file extension by the `image` crate.

use crate::image_size::{ImageSize, RGB_CHANNELS};
use image::{Rgba, RgbaImage};
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading or writing image files.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Image I/O failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Sample buffer holds {actual} samples but {size} RGB needs {expected}")]
    BufferLength {
        size: ImageSize,
        expected: usize,
        actual: usize,
    },
    #[error("Image dimension {0} does not fit in 32 bits")]
    DimensionOverflow(usize),
    #[error("Sample count of a {0} RGB image overflows usize")]
    SampleCountOverflow(ImageSize),
}

/// Interleaved 8-bit RGB samples together with their frame size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbBuffer {
    size: ImageSize,
    samples: Vec<u8>,
}

impl RgbBuffer {
    /// Wrap an interleaved sample buffer, checking it matches `size`.
    pub fn new(size: ImageSize, samples: Vec<u8>) -> Result<Self, CodecError> {
        let expected = size
            .rgb_sample_count()
            .ok_or(CodecError::SampleCountOverflow(size))?;
        if samples.len() != expected {
            return Err(CodecError::BufferLength {
                size,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self { size, samples })
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Samples widened to `i32`, the form the quality metrics consume.
    pub fn to_i32_samples(&self) -> Vec<i32> {
        self.samples.iter().map(|&s| i32::from(s)).collect()
    }
}

/// Decode an image file into interleaved RGB samples, dropping alpha.
pub fn decode_rgb<P: AsRef<Path>>(path: P) -> Result<RgbBuffer, CodecError> {
    let path = path.as_ref();
    let rgb = image::open(path)?.to_rgb8();
    let size = ImageSize::from_width_height(rgb.width() as usize, rgb.height() as usize);
    log::debug!("Decoded {} ({size})", path.display());
    RgbBuffer::new(size, rgb.into_raw())
}

/// Encode interleaved RGB samples to `path` with an opaque alpha channel.
pub fn encode_rgb<P: AsRef<Path>>(path: P, buffer: &RgbBuffer) -> Result<(), CodecError> {
    let path = path.as_ref();
    let width = to_u32(buffer.size.width)?;
    let height = to_u32(buffer.size.height)?;

    let mut rgba = RgbaImage::new(width, height);
    for (pixel, rgb) in rgba
        .pixels_mut()
        .zip(buffer.samples.chunks_exact(RGB_CHANNELS))
    {
        *pixel = Rgba([rgb[0], rgb[1], rgb[2], u8::MAX]);
    }

    rgba.save(path)?;
    log::debug!("Encoded {} ({})", path.display(), buffer.size);
    Ok(())
}

fn to_u32(dim: usize) -> Result<u32, CodecError> {
    u32::try_from(dim).map_err(|_| CodecError::DimensionOverflow(dim))
}
