//! Progress-callback trait for per-preset sweep events.
//!
//! Inject an [`Arc<dyn SweepProgressCallback>`] via
//! [`crate::config::SweepConfigBuilder::progress_callback`] to receive events
//! as the driver works through the preset list. A single conversion can take
//! minutes, so the events carry enough to show "which preset, how far along,
//! how long left" to someone watching a terminal.
//!
//! # Example
//!
//! ```rust
//! use docling_sweep::{SweepConfig, SweepProgressCallback, Preset};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     started: AtomicUsize,
//! }
//!
//! impl SweepProgressCallback for CountingCallback {
//!     fn on_preset_start(&self, index: usize, total: usize, preset: &Preset) {
//!         self.started.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("[{}/{}] {}", index, total, preset.name);
//!     }
//! }
//!
//! let config = SweepConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { started: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::{RunResult, SweepSummary};
use crate::presets::Preset;
use std::sync::Arc;
use std::time::Duration;

/// Running totals after a preset finishes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepProgress {
    /// Presets finished so far (1-indexed position of the one just done).
    pub completed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Mean wall time of the presets finished so far.
    pub average: Duration,
}

impl SweepProgress {
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.completed)
    }

    /// Naive ETA: remaining presets × average so far.
    pub fn estimated_remaining(&self) -> Duration {
        self.average * self.remaining() as u32
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }
}

/// Called by the sweep driver as it processes each preset.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The driver is sequential, so calls never overlap,
/// but the trait is `Send + Sync` to allow sharing the callback freely.
pub trait SweepProgressCallback: Send + Sync {
    /// Called once before the first preset runs.
    fn on_sweep_start(&self, total_presets: usize) {
        let _ = total_presets;
    }

    /// Called just before the conversion for a preset is requested.
    ///
    /// # Arguments
    /// * `index`  — 1-indexed position in the preset list
    /// * `total`  — number of presets in the sweep
    fn on_preset_start(&self, index: usize, total: usize, preset: &Preset) {
        let _ = (index, total, preset);
    }

    /// Called after a preset finished, successfully or not.
    fn on_preset_complete(&self, result: &RunResult, progress: &SweepProgress) {
        let _ = (result, progress);
    }

    /// Called once after the report has been written.
    fn on_sweep_complete(&self, summary: &SweepSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SweepProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SweepConfig`].
pub type ProgressCallback = Arc<dyn SweepProgressCallback>;
