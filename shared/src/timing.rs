//! Wall-clock timing for batch stages.
//!
//! [`ScopedTimer`] records a pair of begin/end markers around a stage and
//! reports the elapsed time between them. It knows nothing about what runs
//! inside the stage, so the same timer wraps a serial or a parallel
//! convolution pass alike.

use std::time::{Duration, Instant};

/// Paired begin/end markers around a named stage.
///
/// The timer starts on construction. Calling [`ScopedTimer::end`] freezes
/// the measurement; a timer dropped without being ended logs its running
/// time at trace level.
#[derive(Debug)]
pub struct ScopedTimer {
    label: String,
    start: Instant,
    stop: Option<Instant>,
}

impl ScopedTimer {
    /// Start timing a stage named `label`.
    pub fn begin(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
            stop: None,
        }
    }

    /// Record the end marker and return the elapsed time.
    ///
    /// Repeated calls keep the first end marker.
    pub fn end(&mut self) -> Duration {
        let stop = *self.stop.get_or_insert_with(Instant::now);
        let elapsed = stop.duration_since(self.start);
        log::debug!("{}: {:.3} ms", self.label, elapsed.as_secs_f64() * 1e3);
        elapsed
    }

    /// Time between the begin marker and the end marker, or now if the
    /// stage is still running.
    pub fn elapsed(&self) -> Duration {
        self.stop
            .unwrap_or_else(Instant::now)
            .duration_since(self.start)
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1e3
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_running(&self) -> bool {
        self.stop.is_none()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if self.stop.is_none() {
            log::trace!("{}: dropped after {:.3} ms", self.label, self.elapsed_ms());
        }
    }
}
