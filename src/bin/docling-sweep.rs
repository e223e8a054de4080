//! CLI binary for docling-sweep.
//!
//! A thin shim over the library crate: maps CLI flags to `ServiceConfig`,
//! `SweepConfig` and `ConversionParams`, and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docling_sweep::{
    convert_single, default_presets, format_duration, load_presets, select_presets,
    ConversionParams, DoclingServeConverter, Preset, ProgressCallback, RunResult, ServiceConfig,
    SweepConfig, SweepDriver, SweepProgress, SweepProgressCallback, SweepSummary,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the preset list plus a log line
/// per finished preset.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:32.green/238}] {pos:>2}/{len} presets  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Sweeping");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl SweepProgressCallback for CliProgressCallback {
    fn on_sweep_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Running {total} configurations…"))
        ));
    }

    fn on_preset_start(&self, _index: usize, _total: usize, preset: &Preset) {
        self.bar.set_message(preset.name.clone());
    }

    fn on_preset_complete(&self, result: &RunResult, progress: &SweepProgress) {
        let time = dim(&format_duration(result.elapsed));
        if result.success {
            self.bar.println(format!(
                "  {} {:<32} {}",
                green("✓"),
                result.preset,
                time
            ));
        } else {
            let error = result.error.as_deref().unwrap_or("unknown error");
            let first_line = error.lines().next().unwrap_or(error);
            let msg = if first_line.chars().count() > 80 {
                let cut: String = first_line.chars().take(79).collect();
                format!("{cut}\u{2026}")
            } else {
                first_line.to_string()
            };
            self.bar.println(format!(
                "  {} {:<32} {}  {}",
                red("✗"),
                result.preset,
                time,
                red(&msg)
            ));
        }
        self.bar.inc(1);
        if progress.remaining() > 0 {
            self.bar.set_message(format!(
                "ETA ~{}",
                format_duration(progress.estimated_remaining())
            ));
        }
    }

    fn on_sweep_complete(&self, summary: &SweepSummary) {
        self.bar.finish_and_clear();
        print_summary(summary);
    }
}

fn print_summary(summary: &SweepSummary) {
    let total = summary.results.len();
    let failed = summary.failed();
    let mark = if failed == 0 {
        green("✔")
    } else if failed == total {
        red("✘")
    } else {
        cyan("⚠")
    };
    eprintln!(
        "{} {}/{} configurations succeeded  ({} total, ~{} each)",
        mark,
        bold(&summary.succeeded().to_string()),
        total,
        format_duration(summary.total_elapsed),
        format_duration(summary.average()),
    );
    eprintln!(
        "   report  →  {}",
        bold(&summary.report_path.display().to_string())
    );
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run every built-in preset against a document
  docling-sweep sweep sample.pdf ./output

  # Only a subset, in catalogue order
  docling-sweep sweep sample.pdf --only baseline,ocr_auto

  # Custom preset list
  docling-sweep sweep report.pdf --presets my_presets.json

  # One ad-hoc conversion
  docling-sweep convert sample.pdf --enable-ocr --ocr-engine tesseract \
      --config-name tesseract_test

  # Extract pictures as files and caption them
  docling-sweep convert sample.pdf --generate-picture-images \
      --image-mode referenced --picture-description

  # List the built-in presets
  docling-sweep presets

OCR ENGINES:
  auto, easyocr, rapidocr, tesseract, mac (macOS hosts only)

IMAGE MODES:
  placeholder  pictures replaced by a marker
  embedded     pictures inlined as base64 data URIs
  referenced   pictures written to {base}_{name}_artifacts/images/

PRESET FILE FORMAT (JSON):
  [
    { "name": "baseline", "description": "Baseline", "rationale": "…",
      "args": { "table_cell_matching": true, "image_mode": "referenced" } }
  ]

ENVIRONMENT VARIABLES:
  DOCLING_SERVE_URL       docling-serve base URL (default http://localhost:5001)
  DOCLING_SERVE_API_KEY   API key sent as X-Api-Key
  RUST_LOG                Override log filter (e.g. docling_sweep=debug)
"#;

/// Sweep docling conversion settings over a document and compare results.
#[derive(Parser, Debug)]
#[command(
    name = "docling-sweep",
    version,
    about = "Run a document through docling conversion presets and compare the results",
    long_about = "Run one document through a list of docling conversion presets (table cell \
matching, OCR engines, image export modes, picture description) against a docling-serve \
instance, write each result under its own name, and summarise everything in \
configuration_test_report.md.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// docling-serve base URL.
    #[arg(
        long,
        global = true,
        env = "DOCLING_SERVE_URL",
        default_value = docling_sweep::config::DEFAULT_SERVICE_URL
    )]
    service_url: String,

    /// API key for docling-serve (sent as X-Api-Key).
    #[arg(long, global = true, env = "DOCLING_SERVE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Per-request timeout in seconds (default: none).
    #[arg(long, global = true, env = "DOCLING_SWEEP_REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCLING_SWEEP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCLING_SWEEP_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "DOCLING_SWEEP_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every preset against one document and write the comparison report.
    Sweep {
        /// Local file path or HTTP/HTTPS URL.
        document: String,

        /// Directory for outputs and the report.
        #[arg(default_value = "./output")]
        output_dir: PathBuf,

        /// JSON file with a custom preset list.
        #[arg(long)]
        presets: Option<PathBuf>,

        /// Comma-separated preset names to run.
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
    },

    /// Convert a document once with ad-hoc options.
    Convert {
        /// Local file path or HTTP/HTTPS URL.
        document: String,

        #[command(flatten)]
        options: ConvertArgs,

        /// Directory for outputs.
        #[arg(long, default_value = "./output")]
        output_dir: PathBuf,

        /// Name used in output filenames.
        #[arg(long, default_value = "default")]
        config_name: String,

        /// Do not print the Markdown to stdout.
        #[arg(long)]
        no_print: bool,
    },

    /// List the built-in presets.
    Presets,
}

/// Flat conversion flags, one per `ConversionParams` field.
#[derive(Args, Debug, Clone)]
struct ConvertArgs {
    /// Map predicted table structure back onto the document's cells.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    table_cell_matching: bool,

    /// Run OCR on bitmap content.
    #[arg(long)]
    enable_ocr: bool,

    /// OCR engine: auto, easyocr, rapidocr, tesseract, mac.
    #[arg(long, default_value = "auto")]
    ocr_engine: String,

    /// Allow OCR/captioning models that call remote services.
    #[arg(long)]
    enable_remote_services: bool,

    /// Extract pictures as images.
    #[arg(long)]
    generate_picture_images: bool,

    /// Render full-page images.
    #[arg(long)]
    generate_page_images: bool,

    /// Scale factor for generated images.
    #[arg(long, default_value_t = 2.0)]
    images_scale: f64,

    /// Image export mode: placeholder, embedded, referenced.
    #[arg(long, default_value = "placeholder")]
    image_mode: String,

    /// Describe pictures with a vision-language model.
    #[arg(long)]
    picture_description: bool,

    /// Prompt used for picture description.
    #[arg(long)]
    picture_description_prompt: Option<String>,
}

impl From<ConvertArgs> for ConversionParams {
    fn from(a: ConvertArgs) -> Self {
        ConversionParams {
            table_cell_matching: a.table_cell_matching,
            enable_ocr: a.enable_ocr,
            ocr_engine: a.ocr_engine,
            enable_remote_services: a.enable_remote_services,
            generate_picture_images: a.generate_picture_images,
            generate_page_images: a.generate_page_images,
            images_scale: a.images_scale,
            image_mode: a.image_mode,
            picture_description: a.picture_description,
            picture_description_prompt: a.picture_description_prompt,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let is_sweep = matches!(cli.command, Command::Sweep { .. });
    let show_progress = is_sweep && !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Presets => {
            list_presets();
            Ok(())
        }
        Command::Sweep {
            ref document,
            ref output_dir,
            ref presets,
            ref only,
        } => {
            let converter = build_converter(&cli)?;
            let presets = resolve_presets(presets.as_ref(), only)?;

            let mut builder = SweepConfig::builder().presets(presets);
            if show_progress {
                let cb = CliProgressCallback::new();
                builder = builder.progress_callback(cb as ProgressCallback);
            }
            let config = builder.build().context("Invalid sweep configuration")?;

            let summary = SweepDriver::new(converter, config)
                .run(document, output_dir)
                .context("Sweep failed")?;

            // The progress callback already printed the summary.
            if !cli.quiet && !show_progress {
                print_summary(&summary);
            }
            Ok(())
        }
        Command::Convert {
            ref document,
            ref options,
            ref output_dir,
            ref config_name,
            no_print,
        } => {
            let converter = build_converter(&cli)?;
            let params = ConversionParams::from(options.clone());
            let result = convert_single(&converter, document, &params, config_name, output_dir)
                .context("Conversion failed")?;
            report_single(&result, no_print, cli.quiet)
        }
    }
}

fn build_converter(cli: &Cli) -> Result<DoclingServeConverter> {
    let mut builder = ServiceConfig::builder().base_url(cli.service_url.clone());
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(secs) = cli.request_timeout {
        builder = builder.request_timeout_secs(secs);
    }
    let config = builder.build().context("Invalid service configuration")?;
    DoclingServeConverter::new(config).context("Failed to create docling-serve client")
}

/// Built-in catalogue or `--presets` file, narrowed by `--only`.
fn resolve_presets(file: Option<&PathBuf>, only: &[String]) -> Result<Vec<Preset>> {
    let presets = match file {
        Some(path) => load_presets(path)
            .with_context(|| format!("Failed to load presets from {}", path.display()))?,
        None => default_presets(),
    };
    if only.is_empty() {
        return Ok(presets);
    }
    select_presets(&presets, only).context("Invalid --only selection")
}

fn report_single(result: &RunResult, no_print: bool, quiet: bool) -> Result<()> {
    let Some(ref outputs) = result.outputs else {
        anyhow::bail!("Conversion produced no outputs");
    };

    if !no_print {
        let markdown = std::fs::read_to_string(&outputs.markdown).with_context(|| {
            format!("Failed to read back {}", outputs.markdown.display())
        })?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(markdown.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure a trailing newline on stdout.
        if !markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !quiet {
        eprintln!(
            "{}  {}  {}  →  {}",
            green("✔"),
            result.preset,
            dim(&format_duration(result.elapsed)),
            bold(&outputs.markdown.display().to_string()),
        );
        eprintln!("   {}", dim(&outputs.json.display().to_string()));
        if let Some(ref dir) = outputs.images_dir {
            eprintln!(
                "   {}  ({} images)",
                dim(&dir.display().to_string()),
                outputs.image_count
            );
        }
    }
    Ok(())
}

fn list_presets() {
    for preset in default_presets() {
        println!("{}  {}", bold(&format!("{:<32}", preset.name)), preset.description);
        let changed: Vec<String> = preset
            .params
            .entries()
            .into_iter()
            .zip(ConversionParams::default().entries())
            .filter(|(set, default)| set.1 != default.1)
            .map(|((key, value), _)| format!("{key}={value}"))
            .collect();
        if !changed.is_empty() {
            println!("  {}", dim(&changed.join("  ")));
        }
    }
}
