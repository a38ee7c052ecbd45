//! Run configuration for the deblur tool.
//!
//! A configuration can be loaded from a JSON file; missing fields fall back
//! to the defaults below and command-line flags override whatever the file
//! provides.
//!
//! ```json
//! {
//!   "psf": { "size": 5, "sigma_row": 49.0, "sigma_col": 36.0 },
//!   "iterations": 10,
//!   "strategy": "serial"
//! }
//! ```

use crate::error::DeblurError;
use crate::image_proc::convolve2d::ConvolveStrategy;
use crate::psf::PsfConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of Richardson-Lucy iterations.
pub const DEFAULT_ITERATIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeblurConfig {
    /// Gaussian PSF parameters
    pub psf: PsfConfig,
    /// Number of Richardson-Lucy iterations
    pub iterations: usize,
    /// Convolution implementation
    pub strategy: ConvolveStrategy,
}

impl Default for DeblurConfig {
    fn default() -> Self {
        Self {
            psf: PsfConfig::default(),
            iterations: DEFAULT_ITERATIONS,
            strategy: ConvolveStrategy::default(),
        }
    }
}

impl DeblurConfig {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, DeblurError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DeblurError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load_from_file(path: &Path) -> Result<Self, DeblurError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DeblurError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Self::from_json_str(&contents)
    }

    pub fn to_json(&self) -> Result<String, DeblurError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DeblurError::Config(format!("Failed to serialize config: {e}")))
    }

    pub fn validate(&self) -> Result<(), DeblurError> {
        self.psf.validate()
    }
}
