//! # docling-sweep
//!
//! Run one document through a fixed list of docling conversion presets and
//! compare the results side by side.
//!
//! ## Why this crate?
//!
//! docling's conversion options interact: table cell matching changes column
//! order, OCR engines disagree on scanned pages, image export modes decide
//! whether pictures end up as placeholders, inline data or files. Tuning them
//! one flag at a time by hand is slow. This crate runs every preset against
//! the same document, writes each result under a unique name, and finishes
//! with a Markdown report that lists what succeeded, how long it took and
//! exactly which options produced which file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document (path or URL)
//!  │
//!  ├─ 1. Input    resolve local file or pass URL through
//!  ├─ 2. Options  flat preset flags → nested ConversionOptions
//!  ├─ 3. Convert  DocumentConverter (docling-serve over HTTP)
//!  ├─ 4. Export   {base}_{preset}.md / .json / _artifacts/images/
//!  └─ 5. Report   configuration_test_report.md
//! ```
//!
//! Presets run sequentially. A failing preset is recorded and the sweep moves
//! on; only an unusable input, output directory or report aborts it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docling_sweep::{DoclingServeConverter, ServiceConfig, SweepConfig, SweepDriver};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ServiceConfig::builder()
//!         .base_url("http://localhost:5001")
//!         .build()?;
//!     let converter = DoclingServeConverter::new(service)?;
//!     let summary = SweepDriver::new(converter, SweepConfig::default())
//!         .run("sample.pdf", "./output")?;
//!     eprintln!(
//!         "{}/{} presets succeeded, report at {}",
//!         summary.succeeded(),
//!         summary.results.len(),
//!         summary.report_path.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docling-sweep` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docling-sweep = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod converter;
pub mod error;
pub mod export;
pub mod input;
pub mod options;
pub mod output;
pub mod presets;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod sweep;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServiceConfig, ServiceConfigBuilder, SweepConfig, SweepConfigBuilder};
pub use converter::{ConvertedDocument, DoclingServeConverter, DocumentConverter};
pub use error::{ConfigError, ErrorKind, SweepError};
pub use input::{resolve_document, DocumentSource};
pub use options::{build_options, ConversionOptions, ConversionParams, ImageExportMode, OcrEngine};
pub use output::{OutputPaths, RunResult, SweepSummary};
pub use presets::{default_presets, load_presets, select_presets, Preset};
pub use progress::{NoopProgressCallback, ProgressCallback, SweepProgress, SweepProgressCallback};
pub use report::{format_duration, Report};
pub use sweep::{convert_single, SweepDriver};
