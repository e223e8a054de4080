//! Picture-description prompts.
//!
//! Centralising the prompts keeps the built-in presets and the Option
//! Builder's fallback in one place, and lets tests compare against them
//! without copying strings around.

/// Prompt used when captioning is enabled but no prompt was given.
pub const DEFAULT_PICTURE_PROMPT: &str = "Describe this image in a few sentences.";

/// Prompt used by the caption-only presets.
pub const TECHNICAL_PICTURE_PROMPT: &str = "Provide a detailed technical description of this image, \
including any charts, diagrams, or visual elements.";

/// Prompt used when captioning is combined with OCR.
pub const OCR_PICTURE_PROMPT: &str = "Describe this image in detail, focusing on technical \
content, charts, and any textual elements.";
