//! Result types produced by a sweep or a single conversion.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Files written for one successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    /// `{base}_{name}.md`
    pub markdown: PathBuf,
    /// `{base}_{name}.json`
    pub json: PathBuf,
    /// `{base}_{name}_artifacts/images/`, only under referenced image mode.
    pub images_dir: Option<PathBuf>,
    /// Number of picture files written into `images_dir`.
    pub image_count: usize,
}

/// Outcome of running one preset (or one ad-hoc configuration).
///
/// Created once when the run finishes; never modified afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Preset or config name.
    pub preset: String,
    pub success: bool,
    /// Wall time from option building to the last file written.
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// Present when `success` is true.
    pub outputs: Option<OutputPaths>,
    /// Human-readable cause, present when `success` is false.
    pub error: Option<String>,
}

impl RunResult {
    pub fn success(preset: impl Into<String>, elapsed: Duration, outputs: OutputPaths) -> Self {
        Self {
            preset: preset.into(),
            success: true,
            elapsed,
            outputs: Some(outputs),
            error: None,
        }
    }

    pub fn failure(preset: impl Into<String>, elapsed: Duration, error: impl Into<String>) -> Self {
        Self {
            preset: preset.into(),
            success: false,
            elapsed,
            outputs: None,
            error: Some(error.into()),
        }
    }
}

/// Everything a finished sweep produced.
#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    /// One result per preset, in preset order.
    pub results: Vec<RunResult>,
    pub report_path: PathBuf,
    #[serde(serialize_with = "serialize_secs")]
    pub total_elapsed: Duration,
}

impl SweepSummary {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }

    /// Mean wall time per preset.
    pub fn average(&self) -> Duration {
        average_of(self.results.iter().map(|r| r.elapsed))
    }
}

pub(crate) fn average_of(durations: impl Iterator<Item = Duration>) -> Duration {
    let (sum, n) = durations.fold((Duration::ZERO, 0u32), |(s, n), d| (s + d, n + 1));
    if n == 0 {
        Duration::ZERO
    } else {
        sum / n
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
