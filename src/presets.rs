//! Named option presets swept by [`crate::sweep::SweepDriver`].
//!
//! The built-in catalogue targets the two things that most often go wrong
//! when converting technical PDFs: tables (cell matching on/off) and figures
//! (OCR engine, image extraction, captions). Custom catalogues can be loaded
//! from a JSON file with [`load_presets`].

use crate::error::{ConfigError, SweepError};
use crate::options::ConversionParams;
use crate::prompts::{OCR_PICTURE_PROMPT, TECHNICAL_PICTURE_PROMPT};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

static RE_PRESET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").unwrap());

/// A named bundle of conversion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Identifier; also the suffix of every output file of the run.
    pub name: String,
    /// Short human title.
    #[serde(default)]
    pub description: String,
    /// Why this combination is worth trying.
    #[serde(default)]
    pub rationale: String,
    #[serde(rename = "args", default)]
    pub params: ConversionParams,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        rationale: impl Into<String>,
        params: ConversionParams,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            rationale: rationale.into(),
            params,
        }
    }
}

/// Check that a run name is usable as a file-name suffix.
pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    if RE_PRESET_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidPresetName {
            name: name.to_string(),
        })
    }
}

/// Check that preset names are usable in file names and unique.
pub fn validate_presets(presets: &[Preset]) -> Result<(), ConfigError> {
    if presets.is_empty() {
        return Err(ConfigError::NoPresets);
    }
    let mut seen = HashSet::new();
    for preset in presets {
        validate_name(&preset.name)?;
        if !seen.insert(preset.name.as_str()) {
            return Err(ConfigError::DuplicatePreset {
                name: preset.name.clone(),
            });
        }
    }
    Ok(())
}

/// Load a preset list from a JSON array of `{name, description, rationale, args}`.
///
/// Omitted `args` fields take their documented defaults.
pub fn load_presets(path: impl AsRef<Path>) -> Result<Vec<Preset>, SweepError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| SweepError::PresetFileInvalid {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let presets: Vec<Preset> =
        serde_json::from_str(&text).map_err(|e| SweepError::PresetFileInvalid {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    validate_presets(&presets)?;
    Ok(presets)
}

/// Keep only the presets named in `names`, preserving catalogue order.
///
/// Unknown names are reported as [`ConfigError::InvalidPresetName`].
pub fn select_presets(presets: &[Preset], names: &[String]) -> Result<Vec<Preset>, ConfigError> {
    if let Some(missing) = names
        .iter()
        .find(|n| !presets.iter().any(|p| &p.name == *n))
    {
        return Err(ConfigError::InvalidPresetName {
            name: missing.clone(),
        });
    }
    Ok(presets
        .iter()
        .filter(|p| names.iter().any(|n| n == &p.name))
        .cloned()
        .collect())
}

/// Parameters shared by every built-in preset: referenced picture images at 2× scale.
fn with_images() -> ConversionParams {
    ConversionParams {
        generate_picture_images: true,
        image_mode: "referenced".into(),
        ..ConversionParams::default()
    }
}

fn ocr(engine: &str, cell_matching: bool) -> ConversionParams {
    ConversionParams {
        table_cell_matching: cell_matching,
        enable_ocr: true,
        ocr_engine: engine.into(),
        ..with_images()
    }
}

/// The built-in sweep catalogue, in execution order.
pub fn default_presets() -> Vec<Preset> {
    vec![
        Preset::new(
            "baseline",
            "Baseline with Image Extraction",
            "Default settings with image extraction - baseline for comparison",
            with_images(),
        ),
        Preset::new(
            "no_cell_matching",
            "Disable Cell Matching + Images",
            "May fix merged column issues by using structure prediction instead of PDF cell mapping",
            ConversionParams {
                table_cell_matching: false,
                ..with_images()
            },
        ),
        Preset::new(
            "ocr_auto",
            "OCR + Image Extraction",
            "Extract text from images using automatic OCR engine selection",
            ocr("auto", true),
        ),
        Preset::new(
            "ocr_no_cell_matching",
            "OCR + No Cell Matching + Images",
            "Combine OCR with structure prediction approach for tables",
            ocr("auto", false),
        ),
        Preset::new(
            "ocr_easyocr",
            "OCR (EasyOCR) + Images",
            "Test EasyOCR engine quality for image text extraction",
            ocr("easyocr", false),
        ),
        Preset::new(
            "ocr_mac",
            "OCR (macOS) + Images",
            "Use macOS Vision framework for OCR (may provide better results on macOS)",
            ocr("mac", false),
        ),
        Preset::new(
            "ocr_remote_services",
            "OCR (Remote) + Images",
            "Enable remote OCR services for potentially better quality",
            ConversionParams {
                enable_remote_services: true,
                ..ocr("auto", false)
            },
        ),
        Preset::new(
            "images_with_descriptions",
            "Images + AI Descriptions",
            "Extract images with AI-generated descriptions using VLM",
            ConversionParams {
                picture_description: true,
                picture_description_prompt: Some(TECHNICAL_PICTURE_PROMPT.into()),
                ..with_images()
            },
        ),
        Preset::new(
            "ocr_with_descriptions",
            "OCR + Images + AI Descriptions",
            "Combine OCR text extraction with AI-powered image descriptions for comprehensive image analysis",
            ConversionParams {
                picture_description: true,
                picture_description_prompt: Some(OCR_PICTURE_PROMPT.into()),
                ..ocr("auto", false)
            },
        ),
        Preset::new(
            "full_page_thumbnails",
            "Full-Page Thumbnails + Images",
            "Generate both figure images and full-page thumbnails for complete visual documentation",
            ConversionParams {
                generate_page_images: true,
                ..with_images()
            },
        ),
        Preset::new(
            "ocr_easyocr_with_descriptions",
            "OCR (EasyOCR) + Images + AI Descriptions",
            "Combines EasyOCR's clean text extraction with AI-powered image descriptions for comprehensive document understanding",
            ConversionParams {
                picture_description: true,
                picture_description_prompt: Some(TECHNICAL_PICTURE_PROMPT.into()),
                ..ocr("easyocr", false)
            },
        ),
    ]
}
