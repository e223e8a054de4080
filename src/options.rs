//! Option Builder: flat conversion parameters → nested service options.
//!
//! Presets and CLI flags speak in flat toggles (`enable_ocr`, `image_mode`,
//! …) because that is what a person comparing runs wants to read. The
//! conversion service wants grouped options with engine-specific details
//! filled in. [`ConversionParams::build_options`] is the single place that
//! maps one onto the other; it is pure, so building the same params twice
//! always yields equal [`ConversionOptions`].

use crate::error::ConfigError;
use crate::prompts::DEFAULT_PICTURE_PROMPT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Flat parameters ──────────────────────────────────────────────────────

/// The flat, user-facing parameter set of one conversion.
///
/// Engine and image-mode names are kept as strings so that a preset file or
/// a CLI flag with a typo reaches [`ConversionParams::build_options`] and
/// fails there with a [`ConfigError`] naming the bad value.
///
/// # Example
/// ```rust
/// use docling_sweep::ConversionParams;
///
/// let params = ConversionParams {
///     enable_ocr: true,
///     ocr_engine: "easyocr".into(),
///     ..ConversionParams::default()
/// };
/// let options = params.build_options().unwrap();
/// assert!(options.ocr.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionParams {
    /// Map predicted table structure back onto the document's own cells. Default: true.
    pub table_cell_matching: bool,
    /// Run OCR on bitmap regions. Default: false.
    pub enable_ocr: bool,
    /// One of `auto`, `easyocr`, `rapidocr`, `tesseract`, `mac`. Default: `auto`.
    pub ocr_engine: String,
    /// Allow the service to call out to remote OCR / VLM endpoints. Default: false.
    pub enable_remote_services: bool,
    /// Extract figure images. Default: false.
    pub generate_picture_images: bool,
    /// Render full-page images. Default: false.
    pub generate_page_images: bool,
    /// Resolution multiplier for generated images. Default: 2.0.
    pub images_scale: f64,
    /// One of `placeholder`, `embedded`, `referenced`. Default: `placeholder`.
    pub image_mode: String,
    /// Caption pictures with a vision model. Default: false.
    pub picture_description: bool,
    /// Prompt for picture captions; only used with `picture_description`.
    pub picture_description_prompt: Option<String>,
}

impl Default for ConversionParams {
    fn default() -> Self {
        Self {
            table_cell_matching: true,
            enable_ocr: false,
            ocr_engine: OcrEngine::Auto.as_str().to_string(),
            enable_remote_services: false,
            generate_picture_images: false,
            generate_page_images: false,
            images_scale: 2.0,
            image_mode: ImageExportMode::Placeholder.as_str().to_string(),
            picture_description: false,
            picture_description_prompt: None,
        }
    }
}

impl ConversionParams {
    /// Validate the parameters and produce the nested service options.
    ///
    /// Engine and mode names are validated even when the feature they belong
    /// to is switched off, so a typo in a preset is caught regardless of
    /// which toggles happen to be on.
    pub fn build_options(&self) -> Result<ConversionOptions, ConfigError> {
        let engine: OcrEngine = self.ocr_engine.parse()?;
        let export_mode: ImageExportMode = self.image_mode.parse()?;

        if !self.images_scale.is_finite() || self.images_scale <= 0.0 {
            return Err(ConfigError::InvalidImageScale {
                value: self.images_scale,
            });
        }

        let ocr = OcrOptions {
            enabled: self.enable_ocr,
            engine,
            languages: if self.enable_ocr {
                engine.default_languages()
            } else {
                Vec::new()
            },
            enable_remote_services: self.enable_remote_services,
        };

        let picture_description = PictureDescriptionOptions {
            enabled: self.picture_description,
            prompt: self.picture_description.then(|| {
                self.picture_description_prompt
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .unwrap_or(DEFAULT_PICTURE_PROMPT)
                    .to_string()
            }),
        };

        Ok(ConversionOptions {
            table: TableOptions {
                do_table_structure: true,
                cell_matching: self.table_cell_matching,
            },
            ocr,
            images: ImageOptions {
                generate_picture_images: self.generate_picture_images,
                generate_page_images: self.generate_page_images,
                images_scale: self.images_scale,
                export_mode,
            },
            picture_description,
        })
    }

    /// `(name, value)` pairs in declaration order, for reports and logs.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("table_cell_matching", self.table_cell_matching.to_string()),
            ("enable_ocr", self.enable_ocr.to_string()),
            ("ocr_engine", self.ocr_engine.clone()),
            ("enable_remote_services", self.enable_remote_services.to_string()),
            ("generate_picture_images", self.generate_picture_images.to_string()),
            ("generate_page_images", self.generate_page_images.to_string()),
            ("images_scale", format!("{:?}", self.images_scale)),
            ("image_mode", self.image_mode.clone()),
            ("picture_description", self.picture_description.to_string()),
            (
                "picture_description_prompt",
                match &self.picture_description_prompt {
                    Some(p) => format!("{p:?}"),
                    None => "None".to_string(),
                },
            ),
        ]
    }
}

/// Free-function form of [`ConversionParams::build_options`].
pub fn build_options(params: &ConversionParams) -> Result<ConversionOptions, ConfigError> {
    params.build_options()
}

// ── Nested options ───────────────────────────────────────────────────────

/// The structured options object handed to the conversion service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionOptions {
    pub table: TableOptions,
    pub ocr: OcrOptions,
    pub images: ImageOptions,
    pub picture_description: PictureDescriptionOptions,
}

impl ConversionOptions {
    /// True when the run should leave picture files next to the Markdown.
    pub fn writes_referenced_images(&self) -> bool {
        self.images.generate_picture_images
            && self.images.export_mode == ImageExportMode::Referenced
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        // Default params are always valid.
        ConversionParams::default()
            .build_options()
            .unwrap_or_else(|e| unreachable!("default params rejected: {e}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableOptions {
    pub do_table_structure: bool,
    pub cell_matching: bool,
}

/// OCR settings. `languages` is only populated when `enabled` is true.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrOptions {
    pub enabled: bool,
    pub engine: OcrEngine,
    pub languages: Vec<String>,
    pub enable_remote_services: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageOptions {
    pub generate_picture_images: bool,
    pub generate_page_images: bool,
    pub images_scale: f64,
    pub export_mode: ImageExportMode,
}

/// Captioning settings. `prompt` is `Some` exactly when `enabled` is true.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PictureDescriptionOptions {
    pub enabled: bool,
    pub prompt: Option<String>,
}

// ── Enums ────────────────────────────────────────────────────────────────

/// OCR engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngine {
    /// Let the service pick whatever engine is installed.
    #[default]
    Auto,
    EasyOcr,
    RapidOcr,
    Tesseract,
    /// Apple Vision framework; only available when the service runs on macOS.
    Mac,
}

impl OcrEngine {
    pub const ALL: [OcrEngine; 5] = [
        OcrEngine::Auto,
        OcrEngine::EasyOcr,
        OcrEngine::RapidOcr,
        OcrEngine::Tesseract,
        OcrEngine::Mac,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OcrEngine::Auto => "auto",
            OcrEngine::EasyOcr => "easyocr",
            OcrEngine::RapidOcr => "rapidocr",
            OcrEngine::Tesseract => "tesseract",
            OcrEngine::Mac => "mac",
        }
    }

    pub fn is_platform_restricted(self) -> bool {
        matches!(self, OcrEngine::Mac)
    }

    /// Language codes each engine expects by default, in its own notation.
    pub fn default_languages(self) -> Vec<String> {
        let langs: &[&str] = match self {
            OcrEngine::Auto => &[],
            OcrEngine::EasyOcr => &["fr", "de", "es", "en"],
            OcrEngine::RapidOcr => &["english", "chinese"],
            OcrEngine::Tesseract => &["fra", "deu", "spa", "eng"],
            OcrEngine::Mac => &["fr-FR", "de-DE", "es-ES", "en-US"],
        };
        langs.iter().map(|l| l.to_string()).collect()
    }
}

impl FromStr for OcrEngine {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OcrEngine::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownOcrEngine {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for OcrEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How pictures appear in the Markdown export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageExportMode {
    /// `<!-- image -->` comment where the picture was.
    #[default]
    Placeholder,
    /// Inline `data:` URI.
    Embedded,
    /// Separate file under `{stem}_artifacts/images/`, linked by relative path.
    Referenced,
}

impl ImageExportMode {
    pub const ALL: [ImageExportMode; 3] = [
        ImageExportMode::Placeholder,
        ImageExportMode::Embedded,
        ImageExportMode::Referenced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageExportMode::Placeholder => "placeholder",
            ImageExportMode::Embedded => "embedded",
            ImageExportMode::Referenced => "referenced",
        }
    }
}

impl FromStr for ImageExportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageExportMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownImageMode {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for ImageExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_documented_options() {
        let o = ConversionParams::default().build_options().unwrap();
        assert!(o.table.cell_matching);
        assert!(o.table.do_table_structure);
        assert!(!o.ocr.enabled);
        assert_eq!(o.ocr.engine, OcrEngine::Auto);
        assert!(o.ocr.languages.is_empty());
        assert!(!o.ocr.enable_remote_services);
        assert!(!o.images.generate_picture_images);
        assert!(!o.images.generate_page_images);
        assert_eq!(o.images.images_scale, 2.0);
        assert_eq!(o.images.export_mode, ImageExportMode::Placeholder);
        assert!(!o.picture_description.enabled);
        assert_eq!(o.picture_description.prompt, None);
        assert_eq!(o, ConversionOptions::default());
    }

    #[test]
    fn requested_settings_are_carried_through() {
        let params = ConversionParams {
            table_cell_matching: false,
            enable_ocr: true,
            ocr_engine: "tesseract".into(),
            enable_remote_services: true,
            generate_picture_images: true,
            generate_page_images: true,
            images_scale: 1.5,
            image_mode: "referenced".into(),
            picture_description: true,
            picture_description_prompt: Some("Describe the chart.".into()),
        };
        let o = params.build_options().unwrap();
        assert!(!o.table.cell_matching);
        assert!(o.ocr.enabled);
        assert_eq!(o.ocr.engine, OcrEngine::Tesseract);
        assert_eq!(o.ocr.languages, vec!["fra", "deu", "spa", "eng"]);
        assert!(o.ocr.enable_remote_services);
        assert!(o.images.generate_picture_images);
        assert!(o.images.generate_page_images);
        assert_eq!(o.images.images_scale, 1.5);
        assert_eq!(o.images.export_mode, ImageExportMode::Referenced);
        assert!(o.writes_referenced_images());
        assert_eq!(
            o.picture_description.prompt.as_deref(),
            Some("Describe the chart.")
        );
    }

    #[test]
    fn every_known_engine_parses() {
        for name in ["auto", "easyocr", "rapidocr", "tesseract", "mac"] {
            let params = ConversionParams {
                enable_ocr: true,
                ocr_engine: name.into(),
                ..Default::default()
            };
            assert!(params.build_options().is_ok(), "engine {name:?} rejected");
        }
    }

    #[test]
    fn unknown_engine_is_rejected_even_with_ocr_off() {
        for name in [
            "invalid_engine",
            "",
            "tesserocr",
            "ocrmac",
            "AUTO",
            " easyocr ",
            "Tesseract",
        ] {
            let params = ConversionParams {
                ocr_engine: name.into(),
                ..Default::default()
            };
            assert_eq!(
                params.build_options(),
                Err(ConfigError::UnknownOcrEngine { value: name.into() })
            );
        }
    }

    #[test]
    fn unknown_image_mode_is_rejected() {
        for mode in ["inline", "", "reference", "REFERENCED", " embedded"] {
            let params = ConversionParams {
                image_mode: mode.into(),
                ..Default::default()
            };
            assert_eq!(
                params.build_options(),
                Err(ConfigError::UnknownImageMode { value: mode.into() })
            );
        }
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        for scale in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let params = ConversionParams {
                images_scale: scale,
                ..Default::default()
            };
            assert!(matches!(
                params.build_options(),
                Err(ConfigError::InvalidImageScale { .. })
            ));
        }
    }

    #[test]
    fn engine_with_ocr_disabled_is_harmless() {
        let params = ConversionParams {
            enable_ocr: false,
            ocr_engine: "easyocr".into(),
            ..Default::default()
        };
        let o = params.build_options().unwrap();
        assert!(!o.ocr.enabled);
        assert_eq!(o.ocr.engine, OcrEngine::EasyOcr);
        assert!(o.ocr.languages.is_empty());
    }

    #[test]
    fn prompt_is_dropped_when_captioning_is_off() {
        let params = ConversionParams {
            picture_description: false,
            picture_description_prompt: Some("ignored".into()),
            ..Default::default()
        };
        let o = params.build_options().unwrap();
        assert_eq!(o.picture_description.prompt, None);
    }

    #[test]
    fn captioning_without_prompt_uses_default() {
        let params = ConversionParams {
            picture_description: true,
            picture_description_prompt: Some("   ".into()),
            ..Default::default()
        };
        let o = params.build_options().unwrap();
        assert_eq!(
            o.picture_description.prompt.as_deref(),
            Some(DEFAULT_PICTURE_PROMPT)
        );
    }

    #[test]
    fn building_twice_yields_equal_options() {
        let params = ConversionParams {
            enable_ocr: true,
            ocr_engine: "rapidocr".into(),
            generate_picture_images: true,
            image_mode: "embedded".into(),
            ..Default::default()
        };
        assert_eq!(params.build_options(), params.build_options());
    }

    #[test]
    fn referenced_requires_picture_images() {
        let params = ConversionParams {
            generate_picture_images: false,
            image_mode: "referenced".into(),
            ..Default::default()
        };
        assert!(!params.build_options().unwrap().writes_referenced_images());
    }

    #[test]
    fn entries_follow_declaration_order() {
        let names: Vec<_> = ConversionParams::default()
            .entries()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(names.first(), Some(&"table_cell_matching"));
        assert_eq!(names.last(), Some(&"picture_description_prompt"));
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let p: ConversionParams =
            serde_json::from_str(r#"{"enable_ocr": true, "ocr_engine": "mac"}"#).unwrap();
        assert!(p.enable_ocr);
        assert_eq!(p.ocr_engine, "mac");
        assert!(p.table_cell_matching);
        assert_eq!(p.images_scale, 2.0);
    }
}
