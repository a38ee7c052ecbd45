//! Richardson-Lucy deblurring tool
//!
//! Restores a blurry RGB image with a Gaussian PSF and optionally scores the
//! result against a sharp reference.
//!
//! # Usage
//!
//! ```bash
//! # Ten iterations with the default 5x5 PSF
//! cargo run --release --bin deblur -- blurry.png restored.png
//!
//! # Compare blurry and restored images against the original
//! cargo run --release --bin deblur -- blurry.png restored.png -r original.png -n 50
//!
//! # Custom PSF, single-threaded convolution
//! cargo run --release --bin deblur -- blurry.png restored.png \
//!     --psf-size 7 --sigma-row 1.5 --sigma-col 2.0 --strategy serial
//!
//! # Settings from a JSON file, flags still win
//! cargo run --release --bin deblur -- blurry.png restored.png -c deblur.json -n 20
//! ```
//!
//! Set `RUST_LOG=debug` for per-stage timings.

use clap::{Parser, ValueEnum};
use deblur::image_proc::{ConvolveStrategy, ImageGrid};
use deblur::{DeblurConfig, PsfBuilder, RichardsonLucy};
use indicatif::{ProgressBar, ProgressStyle};
use shared::image_proc::{decode_rgb, encode_rgb, mse, psnr};
use shared::timing::ScopedTimer;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Blurry input image
    blurry: PathBuf,

    /// Where to write the restored image
    output: PathBuf,

    /// Sharp reference image used to report MSE and PSNR
    #[arg(short, long)]
    reference: Option<PathBuf>,

    /// Number of Richardson-Lucy iterations
    #[arg(short = 'n', long)]
    iterations: Option<usize>,

    /// PSF side length in pixels (odd)
    #[arg(long)]
    psf_size: Option<usize>,

    /// PSF standard deviation along rows
    #[arg(long)]
    sigma_row: Option<f64>,

    /// PSF standard deviation along columns
    #[arg(long)]
    sigma_col: Option<f64>,

    /// Convolution implementation
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker threads for parallel convolution (default: all cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Show a progress bar while iterating
    #[arg(long)]
    progress: bool,
}

/// Available convolution strategies for selection
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Single-threaded
    Serial,
    /// Rows spread across all cores
    Parallel,
}

impl From<StrategyArg> for ConvolveStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Serial => ConvolveStrategy::Serial,
            StrategyArg::Parallel => ConvolveStrategy::Parallel,
        }
    }
}

impl Cli {
    /// Merge the optional config file with command-line overrides.
    fn resolve_config(&self) -> Result<DeblurConfig, deblur::DeblurError> {
        let mut config = match &self.config {
            Some(path) => DeblurConfig::load_from_file(path)?,
            None => DeblurConfig::default(),
        };

        if let Some(n) = self.iterations {
            config.iterations = n;
        }
        if let Some(size) = self.psf_size {
            config.psf.size = size;
        }
        if let Some(sigma) = self.sigma_row {
            config.psf.sigma_row = sigma;
        }
        if let Some(sigma) = self.sigma_col {
            config.psf.sigma_col = sigma;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy.into();
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    log::info!(
        "PSF {}x{} (sigma_row={}, sigma_col={}), {} iterations, {} convolution",
        config.psf.size,
        config.psf.size,
        config.psf.sigma_row,
        config.psf.sigma_col,
        config.iterations,
        config.strategy
    );

    let blurry = decode_rgb(&cli.blurry)?;
    let reference = cli.reference.as_ref().map(decode_rgb).transpose()?;

    let observed = ImageGrid::from_rgb(&blurry)?;
    let psf = PsfBuilder::new(config.psf)?.build()?;
    let mut engine =
        RichardsonLucy::with_convolver(observed, psf, config.strategy.convolver())?;

    let progress = if cli.progress {
        let bar = ProgressBar::new(config.iterations as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} iterations [{elapsed}]")?,
        );
        Some(bar)
    } else {
        None
    };

    let mut timer = ScopedTimer::begin("richardson-lucy");
    engine.run_with(config.iterations, |_, _| {
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    })?;
    let elapsed = timer.end();
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    println!("Elapsed time (ms): {}", elapsed.as_millis());

    let estimate = engine.finish();
    let restored = estimate.to_rgb()?;
    encode_rgb(&cli.output, &restored)?;
    log::info!("Wrote {}", cli.output.display());

    if let Some(reference) = reference {
        let size = blurry.size();
        let reference_samples = reference.to_i32_samples();
        let blurry_samples = blurry.to_i32_samples();
        let restored_samples = estimate.to_samples();

        println!(
            "The blurry MSE is {}",
            mse(&blurry_samples, &reference_samples, size)?
        );
        println!(
            "The blurry pSNR is {}",
            psnr(&blurry_samples, &reference_samples, size)?
        );
        println!(
            "The estimated MSE is {}",
            mse(&restored_samples, &reference_samples, size)?
        );
        println!(
            "The estimated pSNR is {}",
            psnr(&restored_samples, &reference_samples, size)?
        );
    }

    Ok(())
}
