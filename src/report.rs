//! The Markdown comparison report written at the end of a sweep.
//!
//! Layout: a header, a summary table (preset → status, time), one section
//! per preset in sweep order with its full configuration, rationale, output
//! files and, for failures, the error, and finally static guidance on what
//! to compare between the outputs.

use crate::error::SweepError;
use crate::export::write_atomic;
use crate::output::RunResult;
use crate::presets::Preset;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

const STATUS_OK: &str = "✅ Success";
const STATUS_FAILED: &str = "❌ Failed";

const EVALUATION_GUIDANCE: &str = "## Output Files

Each configuration generates the following files:
- `{base_name}_{config_name}.md` - Markdown output with image references
- `{base_name}_{config_name}.json` - Full JSON document structure
- `{base_name}_{config_name}_artifacts/images/` - Extracted image files (when using referenced mode)

Compare the markdown files to evaluate:
- Table extraction quality (headers, column order, cell alignment)
- Image extraction quality (extracted images, OCR text, AI descriptions)
- Image reference accuracy in markdown
- Overall markdown structure
";

/// Everything the report shows, borrowed from the finished sweep.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    /// The document reference as the user gave it.
    pub document: &'a str,
    pub generated_at: DateTime<Local>,
    pub presets: &'a [Preset],
    /// One per preset, in preset order.
    pub results: &'a [RunResult],
    pub total_elapsed: Duration,
}

impl<'a> Report<'a> {
    pub fn new(document: &'a str, presets: &'a [Preset], results: &'a [RunResult]) -> Self {
        Self {
            document,
            generated_at: Local::now(),
            presets,
            results,
            total_elapsed: results.iter().map(|r| r.elapsed).sum(),
        }
    }

    pub fn with_total_elapsed(mut self, total: Duration) -> Self {
        self.total_elapsed = total;
        self
    }

    /// Render the report as Markdown.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let succeeded = self.results.iter().filter(|r| r.success).count();
        let failed = self.results.len() - succeeded;

        // `write!` into a String cannot fail.
        let _ = writeln!(out, "# Docling Configuration Test Report\n");
        let _ = writeln!(
            out,
            "**Generated:** {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "**Test Document:** `{}`\n", self.document);
        let _ = writeln!(
            out,
            "**Configurations:** {} ({} succeeded, {} failed)\n",
            self.results.len(),
            succeeded,
            failed
        );
        let _ = writeln!(
            out,
            "**Total time:** {}\n",
            format_duration(self.total_elapsed)
        );
        out.push_str("---\n\n");

        out.push_str("## Summary\n\n");
        out.push_str("| Configuration | Status | Time | Description |\n");
        out.push_str("|---------------|--------|------|-------------|\n");
        for result in self.results {
            let description = self
                .preset_for(result)
                .map(|p| p.description.as_str())
                .unwrap_or("");
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                table_cell(&result.preset),
                status(result),
                format_duration(result.elapsed),
                table_cell(description)
            );
        }
        out.push_str("\n---\n\n");

        out.push_str("## Detailed Results\n\n");
        for result in self.results {
            self.render_section(&mut out, result);
        }

        out.push_str(EVALUATION_GUIDANCE);
        out
    }

    fn render_section(&self, out: &mut String, result: &RunResult) {
        let preset = self.preset_for(result);
        match preset {
            Some(p) if !p.description.is_empty() => {
                let _ = writeln!(out, "### {}: {}\n", result.preset, p.description);
            }
            _ => {
                let _ = writeln!(out, "### {}\n", result.preset);
            }
        }

        if let Some(p) = preset.filter(|p| !p.rationale.is_empty()) {
            let _ = writeln!(out, "**Rationale:** {}\n", p.rationale);
        }
        let _ = writeln!(
            out,
            "**Status:** {} ({})\n",
            status(result),
            format_duration(result.elapsed)
        );

        if let Some(p) = preset {
            out.push_str("**Configuration:**\n```text\n");
            for (key, value) in p.params.entries() {
                let _ = writeln!(out, "  {key} = {value}");
            }
            out.push_str("```\n\n");
        }

        if let Some(ref outputs) = result.outputs {
            out.push_str("**Outputs:**\n");
            let _ = writeln!(out, "- `{}`", file_name(&outputs.markdown));
            let _ = writeln!(out, "- `{}`", file_name(&outputs.json));
            if let Some(ref dir) = outputs.images_dir {
                let _ = writeln!(
                    out,
                    "- `{}` ({} images)",
                    dir.display(),
                    outputs.image_count
                );
            }
            out.push('\n');
        }

        if let Some(ref error) = result.error {
            out.push_str("**Error Output:**\n```\n");
            out.push_str(error.trim_end());
            out.push_str("\n```\n\n");
        }

        out.push_str("---\n\n");
    }

    fn preset_for(&self, result: &RunResult) -> Option<&'a Preset> {
        self.presets.iter().find(|p| p.name == result.preset)
    }

    /// Render and write the report atomically to `path`.
    pub fn write_to(&self, path: &Path) -> Result<(), SweepError> {
        write_atomic(path, self.render().as_bytes())
    }
}

fn status(result: &RunResult) -> &'static str {
    if result.success {
        STATUS_OK
    } else {
        STATUS_FAILED
    }
}

fn table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable duration: `12.3s`, `2m 5s`, `1h 3m`.
pub fn format_duration(d: Duration) -> String {
    let seconds = d.as_secs_f64();
    if seconds < 60.0 {
        format!("{seconds:.1}s")
    } else if seconds < 3600.0 {
        let total = d.as_secs();
        format!("{}m {}s", total / 60, total % 60)
    } else {
        let total = d.as_secs();
        format!("{}h {}m", total / 3600, (total % 3600) / 60)
    }
}
