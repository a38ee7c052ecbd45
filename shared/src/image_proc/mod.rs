//! Image collaborators around the deconvolution core
//!
//! This module provides the 8-bit codec used to move frames in and out of
//! the workspace and the quality metrics used to score a restored frame
//! against a sharp reference.

pub mod codec;
pub mod metrics;

// Re-export key functionality for easier access
pub use codec::{decode_rgb, encode_rgb, CodecError, RgbBuffer};
pub use metrics::{mse, psnr, MetricsError};
