//! Persisting a converted document: Markdown, JSON and referenced images.
//!
//! ## File layout
//!
//! ```text
//! {output_dir}/
//!   {base}_{name}.md
//!   {base}_{name}.json
//!   {base}_{name}_artifacts/images/image_000000.png   (referenced mode only)
//! ```
//!
//! In referenced mode the service returns pictures inline as `data:` URIs.
//! Each distinct URI is decoded once, written under the artifacts directory,
//! and every occurrence in both exports is replaced by the file's path
//! relative to the output directory, so the Markdown renders from where it
//! sits.
//!
//! Files are written to a temporary file in the same directory and renamed
//! into place, so an interrupted run never leaves a half-written export.

use crate::converter::ConvertedDocument;
use crate::error::SweepError;
use crate::options::ConversionOptions;
use crate::output::OutputPaths;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

static RE_MD_DATA_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[([^\]]*)\]\((data:image/[A-Za-z0-9.+-]+;base64,[A-Za-z0-9+/=\s]+)\)").unwrap()
});

static RE_DATA_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^data:image/([A-Za-z0-9.+-]+);base64,(.+)$").unwrap());

/// `{base}_{name}`: the common prefix of every file a run writes.
pub fn output_stem(base_name: &str, run_name: &str) -> String {
    format!("{base_name}_{run_name}")
}

/// Paths a run with this stem writes to; nothing is created.
pub fn planned_paths(output_dir: &Path, stem: &str, options: &ConversionOptions) -> OutputPaths {
    OutputPaths {
        markdown: output_dir.join(format!("{stem}.md")),
        json: output_dir.join(format!("{stem}.json")),
        images_dir: options
            .writes_referenced_images()
            .then(|| output_dir.join(artifacts_rel_dir(stem))),
        image_count: 0,
    }
}

fn artifacts_rel_dir(stem: &str) -> String {
    format!("{stem}_artifacts/images")
}

/// Write the exports of `doc` into `output_dir` under `stem`.
pub fn save_outputs(
    doc: &ConvertedDocument,
    options: &ConversionOptions,
    output_dir: &Path,
    stem: &str,
) -> Result<OutputPaths, SweepError> {
    let mut paths = planned_paths(output_dir, stem, options);

    let (markdown, json) = match paths.images_dir {
        Some(ref images_dir) => {
            std::fs::create_dir_all(images_dir)
                .map_err(|e| SweepError::write_failed(images_dir, e))?;
            let mut writer = ImageArtifacts::new(images_dir.clone(), artifacts_rel_dir(stem));
            let markdown = writer.rewrite_markdown(doc.export_markdown())?;
            let mut json = doc.export_json().clone();
            writer.rewrite_json(&mut json)?;
            paths.image_count = writer.count();
            debug!("Wrote {} images to {}", writer.count(), images_dir.display());
            (markdown, json)
        }
        None => (doc.export_markdown().to_string(), doc.export_json().clone()),
    };

    write_atomic(&paths.markdown, markdown.as_bytes())?;
    let json_text = serde_json::to_string_pretty(&json)
        .map_err(|e| SweepError::Internal(format!("Failed to serialise JSON export: {e}")))?;
    write_atomic(&paths.json, json_text.as_bytes())?;

    Ok(paths)
}

/// Write `bytes` to `path` via a sibling temp file and rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SweepError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp =
        tempfile::NamedTempFile::new_in(dir).map_err(|e| SweepError::write_failed(path, e))?;
    tmp.write_all(bytes)
        .map_err(|e| SweepError::write_failed(path, e))?;
    tmp.persist(path)
        .map_err(|e| SweepError::write_failed(path, e.error))?;
    Ok(())
}

/// Decodes inline pictures to files, remembering each URI's file.
struct ImageArtifacts {
    dir: PathBuf,
    rel_dir: String,
    written: HashMap<String, String>,
}

impl ImageArtifacts {
    fn new(dir: PathBuf, rel_dir: String) -> Self {
        Self {
            dir,
            rel_dir,
            written: HashMap::new(),
        }
    }

    fn count(&self) -> usize {
        self.written.len()
    }

    /// Relative path for `uri`, writing the file on first sight.
    ///
    /// Returns `None` when the URI is not a decodable base64 image; the
    /// caller then leaves it untouched.
    fn materialise(&mut self, uri: &str) -> Result<Option<String>, SweepError> {
        if let Some(rel) = self.written.get(uri) {
            return Ok(Some(rel.clone()));
        }
        let Some(caps) = RE_DATA_URI.captures(uri) else {
            return Ok(None);
        };
        let payload: String = caps[2].split_whitespace().collect();
        let bytes = match base64::engine::general_purpose::STANDARD.decode(payload) {
            Ok(b) => b,
            Err(e) => {
                warn!("Skipping undecodable inline image: {}", e);
                return Ok(None);
            }
        };

        let ext = image_extension(&bytes, &caps[1]);
        let file_name = format!("image_{:06}.{}", self.written.len(), ext);
        let path = self.dir.join(&file_name);
        write_atomic(&path, &bytes)?;

        let rel = format!("{}/{}", self.rel_dir, file_name);
        self.written.insert(uri.to_string(), rel.clone());
        Ok(Some(rel))
    }

    fn rewrite_markdown(&mut self, markdown: &str) -> Result<String, SweepError> {
        let mut out = String::with_capacity(markdown.len());
        let mut last = 0;
        for caps in RE_MD_DATA_IMAGE.captures_iter(markdown) {
            let (Some(whole), Some(uri)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            if let Some(rel) = self.materialise(uri.as_str())? {
                out.push_str(&markdown[last..whole.start()]);
                out.push_str(&format!("![{}]({})", &caps[1], rel));
                last = whole.end();
            }
        }
        out.push_str(&markdown[last..]);
        Ok(out)
    }

    fn rewrite_json(&mut self, value: &mut serde_json::Value) -> Result<(), SweepError> {
        match value {
            serde_json::Value::String(s) if s.starts_with("data:image/") => {
                if let Some(rel) = self.materialise(s)? {
                    *s = rel;
                }
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    self.rewrite_json(item)?;
                }
            }
            serde_json::Value::Object(map) => {
                for (_, item) in map.iter_mut() {
                    self.rewrite_json(item)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// File extension from the image bytes, falling back to the MIME subtype.
fn image_extension(bytes: &[u8], mime_subtype: &str) -> String {
    if let Ok(format) = image::guess_format(bytes) {
        if let Some(ext) = format.extensions_str().first() {
            return (*ext).to_string();
        }
    }
    let subtype = mime_subtype.to_ascii_lowercase();
    match subtype.as_str() {
        "jpeg" => "jpg".to_string(),
        "svg+xml" => "svg".to_string(),
        other => {
            let cleaned: String = other.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
            if cleaned.is_empty() {
                "bin".to_string()
            } else {
                cleaned
            }
        }
    }
}
