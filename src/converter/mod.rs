//! The conversion capability the sweep depends on.
//!
//! Everything that actually reads a PDF (layout analysis, table structure,
//! OCR, captioning) lives behind [`DocumentConverter`]. The driver only ever
//! calls [`DocumentConverter::convert`] and reads back the two exports, so a
//! test can swap in a fake that returns canned Markdown, or fails on demand,
//! without a running service.
//!
//! ## Implementations
//!
//! * [`DoclingServeConverter`] — posts to a docling-serve instance over HTTP.

mod docling_serve;

pub use docling_serve::DoclingServeConverter;

use crate::error::SweepError;
use crate::input::DocumentSource;
use crate::options::ConversionOptions;

/// A blocking document conversion call.
///
/// Implementations may take minutes and use a lot of memory; the driver never
/// calls two conversions at once.
pub trait DocumentConverter {
    fn convert(
        &self,
        source: &DocumentSource,
        options: &ConversionOptions,
    ) -> Result<ConvertedDocument, SweepError>;
}

impl<T: DocumentConverter + ?Sized> DocumentConverter for &T {
    fn convert(
        &self,
        source: &DocumentSource,
        options: &ConversionOptions,
    ) -> Result<ConvertedDocument, SweepError> {
        (**self).convert(source, options)
    }
}

impl<T: DocumentConverter + ?Sized> DocumentConverter for Box<T> {
    fn convert(
        &self,
        source: &DocumentSource,
        options: &ConversionOptions,
    ) -> Result<ConvertedDocument, SweepError> {
        (**self).convert(source, options)
    }
}

/// A successfully converted document.
///
/// Pictures, when requested with [`crate::options::ImageExportMode::Embedded`]
/// or `Referenced`, arrive inline as `data:` URIs in both exports;
/// [`crate::export`] turns them into files for referenced mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedDocument {
    markdown: String,
    json: serde_json::Value,
}

impl ConvertedDocument {
    pub fn new(markdown: impl Into<String>, json: serde_json::Value) -> Self {
        Self {
            markdown: markdown.into(),
            json,
        }
    }

    /// Text export (Markdown).
    pub fn export_markdown(&self) -> &str {
        &self.markdown
    }

    /// Structured export (the service's document JSON).
    pub fn export_json(&self) -> &serde_json::Value {
        &self.json
    }
}
