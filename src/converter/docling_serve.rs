//! [`DocumentConverter`] backed by a docling-serve instance.
//!
//! ## Wire format
//!
//! `POST {base_url}/v1/convert/source` with
//!
//! ```text
//! { "options": { to_formats, image_export_mode, do_ocr, ocr_engine, ... },
//!   "sources": [ { "kind": "file", "base64_string": ..., "filename": ... }
//!              | { "kind": "http", "url": ... } ] }
//! ```
//!
//! The response carries `document.md_content` and `document.json_content`
//! plus a `status` of `success`, `partial_success`, `failure` or `skipped`.
//!
//! ## Blocking over async
//!
//! reqwest is async; the sweep is not. The converter owns a current-thread
//! tokio runtime and `block_on`s each request, so the driver sees a plain
//! blocking call and the process never has more than one conversion in
//! flight.

use super::{ConvertedDocument, DocumentConverter};
use crate::config::ServiceConfig;
use crate::error::SweepError;
use crate::input::DocumentSource;
use crate::options::{ConversionOptions, ImageExportMode, OcrEngine};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const CONVERT_PATH: &str = "/v1/convert/source";

/// Local captioning model requested when picture description is on.
const PICTURE_DESCRIPTION_REPO: &str = "HuggingFaceTB/SmolVLM-256M-Instruct";

/// Longest error body kept in an error message.
const MAX_ERROR_BODY: usize = 500;

/// HTTP client for docling-serve.
pub struct DoclingServeConverter {
    config: ServiceConfig,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl std::fmt::Debug for DoclingServeConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoclingServeConverter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DoclingServeConverter {
    pub fn new(config: ServiceConfig) -> Result<Self, SweepError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| SweepError::Internal(format!("Failed to build HTTP client: {e}")))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SweepError::Internal(format!("Failed to create tokio runtime: {e}")))?;

        Ok(Self {
            config,
            client,
            runtime,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    async fn post(&self, body: &ConvertRequest<'_>) -> Result<ConvertResponse, SweepError> {
        let url = self.config.endpoint(CONVERT_PATH);
        debug!("POST {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(ref key) = self.config.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SweepError::ConversionFailed {
                    status: "timeout".into(),
                    detail: format!(
                        "no response within {}s",
                        self.config.request_timeout_secs.unwrap_or_default()
                    ),
                }
            } else {
                SweepError::ServiceUnavailable {
                    url: url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SweepError::ServiceRejected {
                status: status.as_u16(),
                body: truncate(body.trim(), MAX_ERROR_BODY),
            });
        }

        response
            .json::<ConvertResponse>()
            .await
            .map_err(|e| SweepError::MalformedResponse(e.to_string()))
    }
}

impl DocumentConverter for DoclingServeConverter {
    fn convert(
        &self,
        source: &DocumentSource,
        options: &ConversionOptions,
    ) -> Result<ConvertedDocument, SweepError> {
        let payload = source_payload(source)?;
        let body = ConvertRequest {
            options: ServeOptions::from_options(options),
            sources: vec![payload],
        };

        info!(
            "Requesting conversion of {} (ocr={}, engine={}, images={})",
            source, options.ocr.enabled, options.ocr.engine, options.images.export_mode
        );
        let response = self.runtime.block_on(self.post(&body))?;
        interpret_response(response)
    }
}

// ── Request ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ConvertRequest<'a> {
    options: ServeOptions<'a>,
    sources: Vec<SourcePayload>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum SourcePayload {
    File {
        base64_string: String,
        filename: String,
    },
    Http {
        url: String,
    },
}

fn source_payload(source: &DocumentSource) -> Result<SourcePayload, SweepError> {
    match source {
        DocumentSource::Local(path) => {
            let bytes = std::fs::read(path).map_err(|e| match e.kind() {
                std::io::ErrorKind::PermissionDenied => SweepError::PermissionDenied {
                    path: path.clone(),
                },
                _ => SweepError::FileNotFound { path: path.clone() },
            })?;
            Ok(SourcePayload::File {
                base64_string: base64::engine::general_purpose::STANDARD.encode(bytes),
                filename: source.file_name(),
            })
        }
        DocumentSource::Remote(url) => Ok(SourcePayload::Http {
            url: url.to_string(),
        }),
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct ServeOptions<'a> {
    to_formats: [&'static str; 2],
    image_export_mode: &'static str,
    do_table_structure: bool,
    table_mode: &'static str,
    table_cell_matching: bool,
    do_ocr: bool,
    ocr_engine: &'static str,
    #[serde(skip_serializing_if = "no_languages")]
    ocr_lang: &'a [String],
    enable_remote_services: bool,
    include_images: bool,
    generate_page_images: bool,
    images_scale: f64,
    do_picture_description: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    picture_description_local: Option<PictureDescriptionLocal<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct PictureDescriptionLocal<'a> {
    repo_id: &'static str,
    prompt: &'a str,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, PartialEq)]
struct GenerationConfig {
    max_new_tokens: u32,
    do_sample: bool,
}

impl<'a> ServeOptions<'a> {
    fn from_options(options: &'a ConversionOptions) -> Self {
        let picture_description_local = match (
            options.picture_description.enabled,
            options.picture_description.prompt.as_deref(),
        ) {
            (true, Some(prompt)) => Some(PictureDescriptionLocal {
                repo_id: PICTURE_DESCRIPTION_REPO,
                prompt,
                generation_config: GenerationConfig {
                    max_new_tokens: 200,
                    do_sample: false,
                },
            }),
            _ => None,
        };

        Self {
            to_formats: ["md", "json"],
            image_export_mode: wire_image_mode(options.images.export_mode),
            do_table_structure: options.table.do_table_structure,
            table_mode: "accurate",
            table_cell_matching: options.table.cell_matching,
            do_ocr: options.ocr.enabled,
            ocr_engine: wire_engine(options.ocr.engine),
            ocr_lang: &options.ocr.languages,
            enable_remote_services: options.ocr.enable_remote_services,
            include_images: options.images.generate_picture_images,
            generate_page_images: options.images.generate_page_images,
            images_scale: options.images.images_scale,
            do_picture_description: options.picture_description.enabled,
            picture_description_local,
        }
    }
}

fn no_languages(langs: &&[String]) -> bool {
    langs.is_empty()
}

fn wire_engine(engine: OcrEngine) -> &'static str {
    match engine {
        OcrEngine::Mac => "ocrmac",
        other => other.as_str(),
    }
}

/// Referenced images are fetched inline and written to disk locally.
fn wire_image_mode(mode: ImageExportMode) -> &'static str {
    match mode {
        ImageExportMode::Placeholder => "placeholder",
        ImageExportMode::Embedded | ImageExportMode::Referenced => "embedded",
    }
}

// ── Response ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    document: Option<ExportDocument>,
    status: String,
    #[serde(default)]
    errors: Vec<ServeErrorItem>,
    #[serde(default)]
    processing_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ExportDocument {
    #[serde(default)]
    md_content: Option<String>,
    #[serde(default)]
    json_content: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ServeErrorItem {
    #[serde(default)]
    module_name: Option<String>,
    #[serde(default)]
    error_message: String,
}

impl ServeErrorItem {
    fn render(&self) -> String {
        match self.module_name {
            Some(ref m) if !m.is_empty() => format!("{m}: {}", self.error_message),
            _ => self.error_message.clone(),
        }
    }
}

fn interpret_response(response: ConvertResponse) -> Result<ConvertedDocument, SweepError> {
    let detail = || {
        let msgs: Vec<String> = response.errors.iter().map(ServeErrorItem::render).collect();
        if msgs.is_empty() {
            "no error details returned".to_string()
        } else {
            msgs.join("; ")
        }
    };

    match response.status.as_str() {
        "success" => {}
        "partial_success" => warn!("Conversion partially succeeded: {}", detail()),
        other => {
            return Err(SweepError::ConversionFailed {
                status: other.to_string(),
                detail: detail(),
            })
        }
    }

    if let Some(secs) = response.processing_time {
        debug!("Service processing time: {:.1}s", secs);
    }

    let document = response
        .document
        .ok_or_else(|| SweepError::MalformedResponse("missing 'document'".into()))?;
    let markdown = document
        .md_content
        .ok_or_else(|| SweepError::MalformedResponse("missing 'document.md_content'".into()))?;
    let json = document
        .json_content
        .ok_or_else(|| SweepError::MalformedResponse("missing 'document.json_content'".into()))?;

    Ok(ConvertedDocument::new(markdown, json))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max).collect();
    format!("{cut}\u{2026}")
}
