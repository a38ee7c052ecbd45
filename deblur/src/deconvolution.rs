//! Richardson-Lucy deconvolution engine.
//!
//! Recovers a latent image from an observed blurry image and a known PSF by
//! repeating the multiplicative update
//!
//! ```text
//! predicted  = estimate (*) psf
//! ratio      = observed / predicted        (zero denominator -> observed)
//! correction = ratio (*) psf_hat
//! estimate   = estimate * correction
//! ```
//!
//! where `(*)` is zero-padded 2D convolution and `psf_hat` is the PSF rotated
//! by 180 degrees. Every factor is non-negative for non-negative inputs, so the
//! estimate never goes negative.
//!
//! The engine runs through `Initialized -> Iterating -> Done` and owns its
//! estimate for the whole run. Each iteration completes, both convolutions
//! included, before the next one reads the estimate.

use crate::error::DeblurError;
use crate::image_proc::convolve2d::{check_operands, ConvolveStrategy, Convolver, SerialConvolver};
use crate::image_proc::elementwise;
use crate::image_proc::grid::ImageGrid;
use crate::psf::PsfPair;
use shared::timing::ScopedTimer;

/// Engine lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Estimate equals the observed image
    Initialized,
    /// At least one update has been applied
    Iterating { completed: usize },
    /// A requested run has finished
    Done { iterations: usize },
}

/// Richardson-Lucy iteration over one observed image.
pub struct RichardsonLucy<C: Convolver = SerialConvolver> {
    observed: ImageGrid,
    estimate: ImageGrid,
    psf: PsfPair,
    convolver: C,
    state: EngineState,
    completed: usize,
}

impl RichardsonLucy<SerialConvolver> {
    /// Create an engine that convolves on the calling thread.
    pub fn new(observed: ImageGrid, psf: PsfPair) -> Result<Self, DeblurError> {
        Self::with_convolver(observed, psf, SerialConvolver)
    }
}

impl<C: Convolver> RichardsonLucy<C> {
    /// Create an engine whose convolutions run on `convolver`.
    ///
    /// Both kernels are checked against the observed grid up front, so a
    /// malformed PSF fails here rather than partway through a run.
    pub fn with_convolver(
        observed: ImageGrid,
        psf: PsfPair,
        convolver: C,
    ) -> Result<Self, DeblurError> {
        check_operands(&observed, &psf.psf)?;
        check_operands(&observed, &psf.psf_hat)?;

        log::debug!(
            "Richardson-Lucy engine for {} grid, {}x{} PSF, {} convolver",
            observed.shape(),
            psf.psf.rows(),
            psf.psf.cols(),
            convolver.name()
        );

        Ok(Self {
            estimate: observed.clone(),
            observed,
            psf,
            convolver,
            state: EngineState::Initialized,
            completed: 0,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Total number of updates applied since construction.
    pub fn iterations_completed(&self) -> usize {
        self.completed
    }

    pub fn observed(&self) -> &ImageGrid {
        &self.observed
    }

    /// Current estimate of the latent image.
    pub fn estimate(&self) -> &ImageGrid {
        &self.estimate
    }

    pub fn psf(&self) -> &PsfPair {
        &self.psf
    }

    /// Apply one Richardson-Lucy update to the estimate.
    ///
    /// Stepping an engine that is `Done` resumes iterating from its current
    /// estimate.
    pub fn step(&mut self) -> Result<(), DeblurError> {
        let mut timer = ScopedTimer::begin(format!("iteration {}", self.completed + 1));

        let predicted = self.convolver.convolve(&self.estimate, &self.psf.psf)?;
        let ratio = elementwise::divide(&self.observed, &predicted)?;
        let correction = self.convolver.convolve(&ratio, &self.psf.psf_hat)?;
        elementwise::multiply_assign(&mut self.estimate, &correction)?;

        self.completed += 1;
        self.state = EngineState::Iterating {
            completed: self.completed,
        };

        let elapsed = timer.end();
        log::trace!(
            "Iteration {} done in {:.3} ms",
            self.completed,
            elapsed.as_secs_f64() * 1e3
        );
        Ok(())
    }

    /// Run `iterations` updates, calling `observer(index, estimate)` after
    /// each one with the 1-based index of the finished iteration.
    ///
    /// `iterations == 0` leaves the estimate untouched.
    pub fn run_with<F>(&mut self, iterations: usize, mut observer: F) -> Result<(), DeblurError>
    where
        F: FnMut(usize, &ImageGrid),
    {
        log::info!(
            "Running {} Richardson-Lucy iterations on {} grid",
            iterations,
            self.observed.shape()
        );

        for index in 1..=iterations {
            self.step()?;
            observer(index, &self.estimate);
        }

        self.state = EngineState::Done {
            iterations: self.completed,
        };
        log::info!("Richardson-Lucy finished after {} iterations", self.completed);
        Ok(())
    }

    /// Run `iterations` updates.
    pub fn run(&mut self, iterations: usize) -> Result<(), DeblurError> {
        self.run_with(iterations, |_, _| {})
    }

    /// Consume the engine and hand back the final estimate.
    pub fn finish(self) -> ImageGrid {
        self.estimate
    }
}

/// Deconvolve `observed` with `psf` for a fixed number of iterations.
///
/// Returns a new grid; `observed` is not modified.
pub fn deconvolve(
    observed: &ImageGrid,
    psf: &PsfPair,
    iterations: usize,
    strategy: ConvolveStrategy,
) -> Result<ImageGrid, DeblurError> {
    let mut engine =
        RichardsonLucy::with_convolver(observed.clone(), psf.clone(), strategy.convolver())?;
    engine.run(iterations)?;
    Ok(engine.finish())
}
