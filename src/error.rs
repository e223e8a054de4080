//! Error types for the docling-sweep library.
//!
//! Two error types reflect two stages at which things go wrong:
//!
//! * [`ConfigError`] — a preset, a flag or a service setting is invalid.
//!   Always raised before any request reaches the conversion service, so a
//!   bad option never costs a (possibly minutes-long) conversion.
//!
//! * [`SweepError`] — everything else: the document cannot be resolved, the
//!   service failed, or an output could not be written. Returned from
//!   [`crate::sweep::convert_single`] and from the fatal parts of
//!   [`crate::sweep::SweepDriver::run`].
//!
//! Inside a sweep a failing preset does not propagate its `SweepError`; the
//! driver stores the rendered message in [`crate::output::RunResult::error`]
//! and moves on to the next preset.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid option, preset or service configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// OCR engine name outside the supported set.
    #[error("Unknown OCR engine '{value}' (expected one of: auto, easyocr, rapidocr, tesseract, mac)")]
    UnknownOcrEngine { value: String },

    /// Image export mode outside the supported set.
    #[error("Unknown image mode '{value}' (expected one of: placeholder, embedded, referenced)")]
    UnknownImageMode { value: String },

    /// Image scale must be a finite, strictly positive number.
    #[error("Image scale must be a positive number, got {value}")]
    InvalidImageScale { value: f64 },

    /// Two presets share a name; their output files would collide.
    #[error("Duplicate preset name '{name}'")]
    DuplicatePreset { name: String },

    /// Preset names become part of output file names.
    #[error("Invalid preset name '{name}': use letters, digits, '-' and '_' only")]
    InvalidPresetName { name: String },

    /// A sweep needs at least one preset.
    #[error("No presets to run")]
    NoPresets,

    /// The report file name must be a plain file name inside the output directory.
    #[error("Invalid report file name '{name}': {reason}")]
    InvalidReportFile { name: String, reason: String },

    /// A preset's export would land on the report file.
    #[error("Preset '{preset}' would write '{file}', which is the report file; rename the preset or the report")]
    ReportCollision { preset: String, file: String },

    /// The conversion service base URL does not parse.
    #[error("Invalid service URL '{url}': {reason}")]
    InvalidServiceUrl { url: String, reason: String },
}

/// Coarse classification of a [`SweepError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document reference could not be resolved or read.
    Input,
    /// Options or presets were invalid; no external call was made.
    Configuration,
    /// The conversion service failed or answered with something unusable.
    Conversion,
    /// An output directory or file could not be written.
    Io,
}

/// All errors returned by the docling-sweep library.
#[derive(Debug, Error)]
pub enum SweepError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a usable file path nor an HTTP/HTTPS URL.
    #[error("Invalid document reference '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Option, preset or service validation failed.
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// A custom preset file could not be read or parsed.
    #[error("Failed to load presets from '{path}': {detail}")]
    PresetFileInvalid { path: PathBuf, detail: String },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The conversion service could not be reached.
    #[error("Conversion service unreachable at '{url}': {reason}\nIs docling-serve running?")]
    ServiceUnavailable { url: String, reason: String },

    /// The service answered with a non-success HTTP status.
    #[error("Conversion service returned HTTP {status}: {body}")]
    ServiceRejected { status: u16, body: String },

    /// The service processed the request but reported a failed conversion.
    #[error("Conversion failed ({status}): {detail}")]
    ConversionFailed { status: String, detail: String },

    /// The service response did not have the expected shape.
    #[error("Malformed response from conversion service: {0}")]
    MalformedResponse(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SweepError {
    /// Classify the error for exit-code and reporting decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SweepError::FileNotFound { .. }
            | SweepError::PermissionDenied { .. }
            | SweepError::InvalidInput { .. } => ErrorKind::Input,
            SweepError::Configuration(_) | SweepError::PresetFileInvalid { .. } => {
                ErrorKind::Configuration
            }
            SweepError::ServiceUnavailable { .. }
            | SweepError::ServiceRejected { .. }
            | SweepError::ConversionFailed { .. }
            | SweepError::MalformedResponse(_)
            | SweepError::Internal(_) => ErrorKind::Conversion,
            SweepError::OutputDirFailed { .. } | SweepError::OutputWriteFailed { .. } => {
                ErrorKind::Io
            }
        }
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SweepError::OutputWriteFailed {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_engine_display_lists_choices() {
        let e = ConfigError::UnknownOcrEngine {
            value: "invalid_engine".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("invalid_engine"), "got: {msg}");
        assert!(msg.contains("rapidocr"), "got: {msg}");
    }

    #[test]
    fn config_error_converts_and_classifies() {
        let e: SweepError = ConfigError::InvalidImageScale { value: -1.0 }.into();
        assert_eq!(e.kind(), ErrorKind::Configuration);
        assert!(e.to_string().contains("-1"));
    }

    #[test]
    fn service_errors_are_conversion_kind() {
        let e = SweepError::ServiceRejected {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Conversion);
        assert!(e.to_string().contains("500"));
    }

    #[test]
    fn write_failure_is_io_kind() {
        let e = SweepError::write_failed(
            "/tmp/x.md",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(e.kind(), ErrorKind::Io);
        assert!(e.to_string().contains("disk full"));
    }

    #[test]
    fn report_collision_names_both_sides() {
        let e: SweepError = ConfigError::ReportCollision {
            preset: "test_report".into(),
            file: "configuration_test_report.md".into(),
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::Configuration);
        let msg = e.to_string();
        assert!(msg.contains("test_report") && msg.contains("configuration_test_report.md"));
    }

    #[test]
    fn missing_file_is_input_kind() {
        let e = SweepError::FileNotFound {
            path: PathBuf::from("sample.pdf"),
        };
        assert_eq!(e.kind(), ErrorKind::Input);
    }
}
