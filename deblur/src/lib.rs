//! Richardson-Lucy deconvolution of RGB images.
//!
//! Restores a sharper estimate of a latent image from a blurry observation
//! and a known Gaussian point spread function:
//!
//! - [`image_proc`]: RGB grids, kernels, zero-padded convolution and
//!   pointwise arithmetic
//! - [`psf`]: Gaussian PSF and its adjoint
//! - [`deconvolution`]: the iterative Richardson-Lucy engine
//! - [`config`]: run configuration for the `deblur` tool
//!
//! ```
//! use deblur::image_proc::{ConvolveStrategy, ImageGrid};
//! use deblur::{deconvolve, psf::build_psf};
//!
//! # fn main() -> Result<(), deblur::DeblurError> {
//! let observed = ImageGrid::from_flat(&[120.0; 8 * 8 * 3], 8, 8)?;
//! let psf = build_psf(3, 1.0, 1.0)?;
//! let estimate = deconvolve(&observed, &psf, 5, ConvolveStrategy::Serial)?;
//! assert_eq!(estimate.shape(), observed.shape());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod deconvolution;
pub mod error;
pub mod image_proc;
pub mod psf;

pub use config::DeblurConfig;
pub use deconvolution::{deconvolve, EngineState, RichardsonLucy};
pub use error::DeblurError;
pub use psf::{PsfBuilder, PsfConfig, PsfPair};
