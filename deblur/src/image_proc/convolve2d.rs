//! 2D convolution of RGB grids against small per-channel kernels.
//!
//! Output cell `(i, j)`, channel `k` is
//!
//! ```text
//! sum over (m, n) of grid[i + m - cy][j + n - cx][k] * kernel[m][n][k]
//! ```
//!
//! with `(cy, cx)` the kernel center. Source indices that fall outside the
//! grid contribute zero (implicit zero padding), so the output always has the
//! shape of the input grid.
//!
//! Each output row depends only on the source grid and the kernel, which
//! makes the pass an embarrassingly parallel map over rows. The serial and
//! parallel implementations share [`convolve_row`] and therefore sum in the
//! same order: their results are bit-identical.

use crate::error::DeblurError;
use crate::image_proc::grid::{ImageGrid, Kernel};
use ndarray::parallel::prelude::*;
use ndarray::{ArrayView3, ArrayViewMut2, Axis};
use serde::{Deserialize, Serialize};

/// A 2D convolution strategy.
///
/// Implementations must produce an output of the same shape as `grid`, treat
/// out-of-range source cells as zero, and validate their inputs with
/// [`check_operands`] before doing any work.
pub trait Convolver: Send + Sync {
    fn convolve(&self, grid: &ImageGrid, kernel: &Kernel) -> Result<ImageGrid, DeblurError>;

    /// Short name used in log output.
    fn name(&self) -> &'static str;
}

impl<T: Convolver + ?Sized> Convolver for Box<T> {
    fn convolve(&self, grid: &ImageGrid, kernel: &Kernel) -> Result<ImageGrid, DeblurError> {
        (**self).convolve(grid, kernel)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Which [`Convolver`] implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvolveStrategy {
    /// One thread, rows in order
    #[default]
    Serial,
    /// Rows distributed across the rayon thread pool
    Parallel,
}

impl ConvolveStrategy {
    pub fn convolver(self) -> Box<dyn Convolver> {
        match self {
            ConvolveStrategy::Serial => Box::new(SerialConvolver),
            ConvolveStrategy::Parallel => Box::new(ParallelConvolver),
        }
    }
}

impl std::fmt::Display for ConvolveStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvolveStrategy::Serial => write!(f, "serial"),
            ConvolveStrategy::Parallel => write!(f, "parallel"),
        }
    }
}

/// Reject kernels without a unique center and kernels whose channel count
/// differs from the grid's.
pub fn check_operands(grid: &ImageGrid, kernel: &Kernel) -> Result<(), DeblurError> {
    if !kernel.has_odd_dims() {
        return Err(DeblurError::InvalidKernelSize {
            rows: kernel.rows(),
            cols: kernel.cols(),
        });
    }
    if kernel.channels() != grid.channels() {
        return Err(DeblurError::ShapeMismatch {
            left: grid.shape(),
            right: kernel.shape(),
        });
    }
    Ok(())
}

/// Compute output row `i` of `src` convolved with `kernel` into `out_row`
/// (shape `(width, channels)`).
fn convolve_row(
    src: &ArrayView3<'_, f64>,
    kernel: &ArrayView3<'_, f64>,
    i: usize,
    mut out_row: ArrayViewMut2<'_, f64>,
) {
    let (rows, cols, channels) = src.dim();
    let (ker_rows, ker_cols, _) = kernel.dim();
    let center_y = (ker_rows / 2) as isize;
    let center_x = (ker_cols / 2) as isize;

    for j in 0..cols {
        for m in 0..ker_rows {
            let src_row = i as isize + m as isize - center_y;
            if src_row < 0 || src_row >= rows as isize {
                continue;
            }
            for n in 0..ker_cols {
                let src_col = j as isize + n as isize - center_x;
                if src_col < 0 || src_col >= cols as isize {
                    continue;
                }
                let (sr, sc) = (src_row as usize, src_col as usize);
                for k in 0..channels {
                    out_row[[j, k]] += src[[sr, sc, k]] * kernel[[m, n, k]];
                }
            }
        }
    }
}

/// Single-threaded convolution, rows in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConvolver;

impl Convolver for SerialConvolver {
    fn convolve(&self, grid: &ImageGrid, kernel: &Kernel) -> Result<ImageGrid, DeblurError> {
        check_operands(grid, kernel)?;

        let src = grid.view();
        let weights = kernel.view();
        let mut output = ImageGrid::zeros(grid.height(), grid.width());

        for (i, out_row) in output.view_mut().axis_iter_mut(Axis(0)).enumerate() {
            convolve_row(&src, &weights, i, out_row);
        }

        Ok(output)
    }

    fn name(&self) -> &'static str {
        "serial"
    }
}

/// Convolution with output rows spread over the rayon thread pool.
///
/// The call returns only after every row is written, so callers never see a
/// partially convolved grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelConvolver;

impl Convolver for ParallelConvolver {
    fn convolve(&self, grid: &ImageGrid, kernel: &Kernel) -> Result<ImageGrid, DeblurError> {
        check_operands(grid, kernel)?;

        let src = grid.view();
        let weights = kernel.view();
        let mut output = ImageGrid::zeros(grid.height(), grid.width());

        output
            .view_mut()
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, out_row)| convolve_row(&src, &weights, i, out_row));

        Ok(output)
    }

    fn name(&self) -> &'static str {
        "parallel"
    }
}

/// Convolve `grid` with `kernel` on the calling thread.
pub fn convolve2d(grid: &ImageGrid, kernel: &Kernel) -> Result<ImageGrid, DeblurError> {
    SerialConvolver.convolve(grid, kernel)
}
