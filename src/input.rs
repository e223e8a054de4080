//! Input resolution: normalise a user-supplied path or URL to a document source.
//!
//! Local files are checked up front (exists, readable) so a typo fails the
//! whole command before the first preset runs. URLs are only checked for
//! syntax; fetching them is left to the conversion service, which accepts
//! HTTP sources directly.

use crate::error::SweepError;
use reqwest::Url;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A resolved document reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// A readable local file.
    Local(PathBuf),
    /// An HTTP/HTTPS URL passed through to the service.
    Remote(Url),
}

impl DocumentSource {
    /// File name without extension, used as the prefix of every output file.
    ///
    /// `reports/sample.pdf` → `sample`; `https://host/a/paper.pdf?x=1` → `paper`.
    /// Falls back to `document` when nothing usable is left.
    pub fn base_name(&self) -> String {
        let name = match self {
            DocumentSource::Local(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned()),
            DocumentSource::Remote(url) => url
                .path_segments()
                .and_then(|mut segs| segs.next_back().map(str::to_string))
                .filter(|last| !last.is_empty())
                .map(|last| match Path::new(&last).file_stem() {
                    Some(stem) => stem.to_string_lossy().into_owned(),
                    None => last,
                }),
        };
        name.filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "document".to_string())
    }

    /// File name (with extension) reported to the service.
    pub fn file_name(&self) -> String {
        match self {
            DocumentSource::Local(path) => path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document.pdf".to_string()),
            DocumentSource::Remote(_) => format!("{}.pdf", self.base_name()),
        }
    }
}

impl std::fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentSource::Local(path) => write!(f, "{}", path.display()),
            DocumentSource::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a [`DocumentSource`].
pub fn resolve_document(input: &str) -> Result<DocumentSource, SweepError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SweepError::InvalidInput {
            input: input.to_string(),
            reason: "empty document reference".into(),
        });
    }
    if is_url(input) {
        let url = Url::parse(input).map_err(|e| SweepError::InvalidInput {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        debug!("Resolved remote document: {}", url);
        return Ok(DocumentSource::Remote(url));
    }
    resolve_local(input)
}

fn resolve_local(path_str: &str) -> Result<DocumentSource, SweepError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(SweepError::FileNotFound { path });
    }
    if path.is_dir() {
        return Err(SweepError::InvalidInput {
            input: path_str.to_string(),
            reason: "is a directory".into(),
        });
    }

    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SweepError::PermissionDenied { path });
        }
        Err(_) => return Err(SweepError::FileNotFound { path }),
    }

    debug!("Resolved local document: {}", path.display());
    Ok(DocumentSource::Local(path))
}
