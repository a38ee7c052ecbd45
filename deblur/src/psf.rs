//! Gaussian point spread function construction.
//!
//! The blur model is an anisotropic Gaussian sampled on a small odd-sized
//! square grid centered on `(size / 2, size / 2)`:
//!
//! ```text
//! w(r, c) = exp(-0.5 * (((r - cr) / sigma_row)^2 + ((c - cc) / sigma_col)^2))
//!           / (2 * pi * sigma_row * sigma_col)
//! ```
//!
//! The samples are normalized to sum to 1 and the unit mass is then split
//! equally across the three colour channels, so every channel carries a
//! third of the weight and the whole kernel sums to 1. The Richardson-Lucy
//! update is invariant to a uniform kernel scale, so the split does not move
//! the fixed point of the iteration.
//!
//! Alongside the PSF the builder returns its 180 degree rotation, the
//! adjoint kernel used to back-project the ratio image.

use crate::error::DeblurError;
use crate::image_proc::grid::{Kernel, CHANNELS};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Shape parameters of the Gaussian PSF.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsfConfig {
    /// Side length of the square kernel, must be odd
    pub size: usize,
    /// Standard deviation along rows, in pixels
    pub sigma_row: f64,
    /// Standard deviation along columns, in pixels
    pub sigma_col: f64,
}

impl Default for PsfConfig {
    fn default() -> Self {
        Self {
            size: 5,
            sigma_row: 49.0,
            sigma_col: 36.0,
        }
    }
}

impl PsfConfig {
    pub fn new(size: usize, sigma_row: f64, sigma_col: f64) -> Self {
        Self {
            size,
            sigma_row,
            sigma_col,
        }
    }

    /// Check the kernel has a unique center and both sigmas are positive.
    pub fn validate(&self) -> Result<(), DeblurError> {
        if self.size % 2 == 0 {
            return Err(DeblurError::InvalidPsfConfig(format!(
                "kernel size must be odd, got {}",
                self.size
            )));
        }
        for (name, sigma) in [("sigma_row", self.sigma_row), ("sigma_col", self.sigma_col)] {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(DeblurError::InvalidPsfConfig(format!(
                    "{name} must be positive and finite, got {sigma}"
                )));
            }
        }
        Ok(())
    }
}

/// A PSF together with its adjoint (180 degree rotated) kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct PsfPair {
    /// Forward blur kernel
    pub psf: Kernel,
    /// `psf_hat[r][c] = psf[size-1-r][size-1-c]`, per channel
    pub psf_hat: Kernel,
}

impl PsfPair {
    /// Pair an arbitrary kernel with its rotation.
    pub fn from_kernel(psf: Kernel) -> Self {
        let psf_hat = psf.rotated_180();
        Self { psf, psf_hat }
    }
}

/// Builds normalized Gaussian PSFs from a validated [`PsfConfig`].
#[derive(Debug, Clone, Copy)]
pub struct PsfBuilder {
    config: PsfConfig,
}

impl PsfBuilder {
    pub fn new(config: PsfConfig) -> Result<Self, DeblurError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PsfConfig {
        &self.config
    }

    /// Single-channel Gaussian samples normalized to sum to 1.
    pub fn gaussian_weights(&self) -> Array2<f64> {
        let PsfConfig {
            size,
            sigma_row,
            sigma_col,
        } = self.config;
        let center = (size / 2) as f64;

        let mut weights = Array2::from_shape_fn((size, size), |(r, c)| {
            let dr = (r as f64 - center) / sigma_row;
            let dc = (c as f64 - center) / sigma_col;
            (-0.5 * (dr * dr + dc * dc)).exp() / (2.0 * PI * sigma_row * sigma_col)
        });

        let sum = weights.sum();
        if sum > 0.0 {
            weights.mapv_inplace(|w| w / sum);
        }
        weights
    }

    /// Build the PSF (each channel weighted by a third) and its adjoint.
    pub fn build(&self) -> Result<PsfPair, DeblurError> {
        let weights = self.gaussian_weights();
        let psf = Kernel::replicate_channels(weights.view(), 1.0 / CHANNELS as f64)?;
        log::debug!(
            "Built {}x{} PSF (sigma_row={}, sigma_col={})",
            self.config.size,
            self.config.size,
            self.config.sigma_row,
            self.config.sigma_col
        );
        Ok(PsfPair::from_kernel(psf))
    }
}

/// Build the PSF pair for `size`, `sigma_row` and `sigma_col` in one call.
pub fn build_psf(size: usize, sigma_row: f64, sigma_col: f64) -> Result<PsfPair, DeblurError> {
    PsfBuilder::new(PsfConfig::new(size, sigma_row, sigma_col))?.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_total_weight_is_one() {
        for &(size, sr, sc) in &[
            (1, 1.0, 1.0),
            (3, 0.5, 2.0),
            (5, 49.0, 36.0),
            (7, 1.2, 1.2),
            (15, 3.0, 0.7),
        ] {
            let pair = build_psf(size, sr, sc).unwrap();
            assert_relative_eq!(pair.psf.total_weight(), 1.0, epsilon = 1e-9);
            assert_relative_eq!(pair.psf_hat.total_weight(), 1.0, epsilon = 1e-9);
            // Unit mass is split evenly across channels, so the total above is 1
            for k in 0..CHANNELS {
                assert_relative_eq!(pair.psf.channel_sum(k), 1.0 / 3.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_channels_share_one_shape() {
        let pair = build_psf(5, 1.5, 0.8).unwrap();
        for r in 0..5 {
            for c in 0..5 {
                let w = pair.psf.weight(r, c, 0);
                assert_eq!(pair.psf.weight(r, c, 1), w);
                assert_eq!(pair.psf.weight(r, c, 2), w);
            }
        }
    }

    #[test]
    fn test_adjoint_is_rotation() {
        let size = 7;
        let pair = build_psf(size, 2.0, 0.9).unwrap();
        for r in 0..size {
            for c in 0..size {
                for k in 0..CHANNELS {
                    assert_eq!(
                        pair.psf_hat.weight(r, c, k),
                        pair.psf.weight(size - 1 - r, size - 1 - c, k)
                    );
                }
            }
        }
    }

    #[test]
    fn test_adjoint_of_asymmetric_kernel() {
        let weights = array![[0.0, 1.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 2.0]];
        let pair = PsfPair::from_kernel(Kernel::replicate_channels(weights.view(), 1.0).unwrap());

        assert_eq!(pair.psf_hat.weight(0, 0, 1), Some(2.0));
        assert_eq!(pair.psf_hat.weight(2, 1, 2), Some(1.0));
        assert_eq!(pair.psf_hat.weight(2, 2, 0), Some(0.0));
    }

    #[test]
    fn test_peak_at_center_and_anisotropy() {
        let builder = PsfBuilder::new(PsfConfig::new(5, 0.8, 2.0)).unwrap();
        let w = builder.gaussian_weights();

        let peak = w[[2, 2]];
        assert!(w.iter().all(|&v| v <= peak));
        // Wider along columns: a column step costs less than a row step
        assert!(w[[2, 3]] > w[[3, 2]]);
        assert_relative_eq!(w[[1, 2]], w[[3, 2]], epsilon = 1e-15);
    }

    #[test]
    fn test_default_config() {
        let config = PsfConfig::default();
        assert_eq!(config, PsfConfig::new(5, 49.0, 36.0));
        assert!(config.validate().is_ok());

        // Very wide sigmas on a 5x5 grid are close to a box filter
        let w = PsfBuilder::new(config).unwrap().gaussian_weights();
        assert_relative_eq!(w[[0, 0]], 1.0 / 25.0, epsilon = 1e-3);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            build_psf(4, 1.0, 1.0),
            Err(DeblurError::InvalidPsfConfig(_))
        ));
        assert!(matches!(
            build_psf(0, 1.0, 1.0),
            Err(DeblurError::InvalidPsfConfig(_))
        ));
        assert!(build_psf(3, 0.0, 1.0).is_err());
        assert!(build_psf(3, 1.0, -2.0).is_err());
        assert!(build_psf(3, f64::NAN, 1.0).is_err());
    }
}
