//! Sweep driver and single-conversion entry points.
//!
//! ## Why sequential?
//!
//! Each conversion can hold several GB of OCR and layout models in memory
//! and run for minutes. Running presets one after another bounds peak memory
//! and CPU, and keeps "preset 4 of 11, ~6m left" honest for whoever is
//! watching. Presets therefore run strictly in list order, one at a time,
//! and the report follows the same order.
//!
//! ## Failure isolation
//!
//! Anything that goes wrong inside one preset (invalid options, the service
//! failing, a file that cannot be written) becomes that preset's
//! [`RunResult`] with `success = false`; the sweep carries on. Only problems
//! that make the whole sweep meaningless are returned as `Err`: an invalid
//! preset list or report name, a document that cannot be resolved, an output
//! directory that cannot be created, or a report that cannot be written.

use crate::config::SweepConfig;
use crate::converter::DocumentConverter;
use crate::error::{ConfigError, SweepError};
use crate::export::{output_stem, save_outputs};
use crate::input::{resolve_document, DocumentSource};
use crate::options::ConversionParams;
use crate::output::{average_of, OutputPaths, RunResult, SweepSummary};
use crate::presets::{validate_name, Preset};
use crate::progress::SweepProgress;
use crate::report::Report;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs a fixed, ordered list of presets against one document.
///
/// # Example
/// ```rust,no_run
/// use docling_sweep::{DoclingServeConverter, ServiceConfig, SweepConfig, SweepDriver};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let converter = DoclingServeConverter::new(ServiceConfig::default())?;
/// let driver = SweepDriver::new(converter, SweepConfig::default());
/// let summary = driver.run("sample.pdf", "./output")?;
/// println!("{}/{} presets succeeded", summary.succeeded(), summary.results.len());
/// # Ok(())
/// # }
/// ```
pub struct SweepDriver<C> {
    converter: C,
    config: SweepConfig,
}

impl<C: DocumentConverter> SweepDriver<C> {
    pub fn new(converter: C, config: SweepConfig) -> Self {
        Self { converter, config }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Run every preset against `document`, writing outputs and the report
    /// into `output_dir`.
    ///
    /// # Errors
    /// Only for failures that affect the whole sweep: invalid preset list or
    /// report name (including a preset whose export would overwrite the
    /// report), unresolvable document, output directory or report not
    /// writable. Per-preset failures are in the returned summary.
    pub fn run(
        &self,
        document: &str,
        output_dir: impl AsRef<Path>,
    ) -> Result<SweepSummary, SweepError> {
        let sweep_start = Instant::now();
        let output_dir = output_dir.as_ref();

        // ── Step 1: Validate, resolve input and output ───────────────────
        self.config.validate()?;
        let source = resolve_document(document)?;
        let base_name = source.base_name();
        let presets = &self.config.presets;
        check_report_collision(&base_name, presets, &self.config.report_file)?;
        create_output_dir(output_dir)?;

        let total = presets.len();
        let callback = self.config.progress_callback.as_ref();

        info!(
            "Starting sweep of {} presets on {} → {}",
            total,
            source,
            output_dir.display()
        );
        if let Some(cb) = callback {
            cb.on_sweep_start(total);
        }

        // ── Step 2: Run presets in order ─────────────────────────────────
        let mut results: Vec<RunResult> = Vec::with_capacity(total);
        for (i, preset) in presets.iter().enumerate() {
            let index = i + 1;
            if let Some(cb) = callback {
                cb.on_preset_start(index, total, preset);
            }
            info!(
                "[{}/{}] Running preset '{}': {}",
                index, total, preset.name, preset.description
            );

            let result = run_preset(
                &self.converter,
                &source,
                &preset.params,
                &preset.name,
                &base_name,
                output_dir,
            );
            match result.error {
                None => info!(
                    "Preset '{}' succeeded in {:.1}s",
                    preset.name,
                    result.elapsed.as_secs_f64()
                ),
                Some(ref e) => warn!("Preset '{}' failed: {}", preset.name, e),
            }
            results.push(result);

            if let Some(cb) = callback {
                let succeeded = results.iter().filter(|r| r.success).count();
                let progress = SweepProgress {
                    completed: index,
                    total,
                    succeeded,
                    failed: index - succeeded,
                    average: average_of(results.iter().map(|r| r.elapsed)),
                };
                if let Some(last) = results.last() {
                    cb.on_preset_complete(last, &progress);
                }
            }
        }

        // ── Step 3: Report ───────────────────────────────────────────────
        let report_path = output_dir.join(&self.config.report_file);
        let total_elapsed = sweep_start.elapsed();
        Report::new(document, presets, &results)
            .with_total_elapsed(total_elapsed)
            .write_to(&report_path)?;
        info!("Report written to {}", report_path.display());

        let summary = SweepSummary {
            results,
            report_path,
            total_elapsed,
        };
        info!(
            "Sweep complete: {}/{} presets succeeded",
            summary.succeeded(),
            summary.results.len()
        );
        if let Some(cb) = callback {
            cb.on_sweep_complete(&summary);
        }
        Ok(summary)
    }
}

/// Convert `document` once with ad-hoc parameters.
///
/// Options are validated before anything touches the disk or the service,
/// so an invalid engine or image mode leaves no files behind.
///
/// # Errors
/// Every failure is returned: configuration, input, conversion and I/O.
pub fn convert_single<C: DocumentConverter>(
    converter: &C,
    document: &str,
    params: &ConversionParams,
    config_name: &str,
    output_dir: impl AsRef<Path>,
) -> Result<RunResult, SweepError> {
    let start = Instant::now();
    let output_dir = output_dir.as_ref();

    validate_name(config_name)?;
    params.build_options()?;

    let source = resolve_document(document)?;
    create_output_dir(output_dir)?;

    let outputs = execute(
        converter,
        &source,
        params,
        &output_stem(&source.base_name(), config_name),
        output_dir,
    )?;
    Ok(RunResult::success(config_name, start.elapsed(), outputs))
}

/// Refuse a sweep in which some preset's export has the report's file name.
fn check_report_collision(
    base_name: &str,
    presets: &[Preset],
    report_file: &str,
) -> Result<(), ConfigError> {
    for preset in presets {
        let stem = output_stem(base_name, &preset.name);
        for ext in ["md", "json"] {
            let file = format!("{stem}.{ext}");
            if file == report_file {
                return Err(ConfigError::ReportCollision {
                    preset: preset.name.clone(),
                    file,
                });
            }
        }
    }
    Ok(())
}

/// Run one preset, folding every error into the result.
fn run_preset<C: DocumentConverter>(
    converter: &C,
    source: &DocumentSource,
    params: &ConversionParams,
    name: &str,
    base_name: &str,
    output_dir: &Path,
) -> RunResult {
    let start = Instant::now();
    let stem = output_stem(base_name, name);
    match execute(converter, source, params, &stem, output_dir) {
        Ok(outputs) => RunResult::success(name, start.elapsed(), outputs),
        Err(e) => RunResult::failure(name, start.elapsed(), e.to_string()),
    }
}

fn execute<C: DocumentConverter>(
    converter: &C,
    source: &DocumentSource,
    params: &ConversionParams,
    stem: &str,
    output_dir: &Path,
) -> Result<OutputPaths, SweepError> {
    let options = params.build_options()?;
    debug!("Options for {}: {:?}", stem, options);

    if options.ocr.enabled && options.ocr.engine.is_platform_restricted() && !cfg!(target_os = "macos")
    {
        warn!(
            "OCR engine '{}' only works when the conversion service runs on macOS",
            options.ocr.engine
        );
    }

    let document = converter.convert(source, &options)?;
    save_outputs(&document, &options, output_dir, stem)
}

fn create_output_dir(dir: &Path) -> Result<(), SweepError> {
    std::fs::create_dir_all(dir).map_err(|e| SweepError::OutputDirFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConvertedDocument;
    use crate::error::ErrorKind;
    use crate::options::ConversionOptions;
    use std::cell::RefCell;

    /// Records every call; fails when OCR is enabled.
    struct FailOnOcr {
        calls: RefCell<Vec<ConversionOptions>>,
    }

    impl DocumentConverter for FailOnOcr {
        fn convert(
            &self,
            _source: &DocumentSource,
            options: &ConversionOptions,
        ) -> Result<ConvertedDocument, SweepError> {
            self.calls.borrow_mut().push(options.clone());
            if options.ocr.enabled {
                return Err(SweepError::ConversionFailed {
                    status: "failure".into(),
                    detail: "no OCR models installed".into(),
                });
            }
            Ok(ConvertedDocument::new(
                "# Doc\n",
                serde_json::json!({"ok": true}),
            ))
        }
    }

    fn converter() -> FailOnOcr {
        FailOnOcr {
            calls: RefCell::new(Vec::new()),
        }
    }

    fn sample_pdf(dir: &Path) -> String {
        let pdf = dir.join("sample.pdf");
        std::fs::write(&pdf, b"%PDF-1.7\n").unwrap();
        pdf.to_string_lossy().into_owned()
    }

    #[test]
    fn failing_preset_does_not_stop_the_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sample_pdf(dir.path());
        let out = dir.path().join("out");
        let presets = vec![
            Preset::new("plain", "", "", ConversionParams::default()),
            Preset::new(
                "ocr",
                "",
                "",
                ConversionParams {
                    enable_ocr: true,
                    ..Default::default()
                },
            ),
            Preset::new(
                "tables_off",
                "",
                "",
                ConversionParams {
                    table_cell_matching: false,
                    ..Default::default()
                },
            ),
        ];
        let config = SweepConfig::builder().presets(presets).build().unwrap();
        let fake = converter();
        let summary = SweepDriver::new(&fake, config).run(&doc, &out).unwrap();

        let names: Vec<_> = summary.results.iter().map(|r| r.preset.as_str()).collect();
        assert_eq!(names, vec!["plain", "ocr", "tables_off"]);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 1);
        assert!(summary.results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("no OCR models installed"));
        assert_eq!(fake.calls.borrow().len(), 3);
        assert!(out.join("sample_tables_off.md").is_file());
        assert!(summary.report_path.is_file());
    }

    #[test]
    fn invalid_preset_options_fail_only_that_preset() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sample_pdf(dir.path());
        let presets = vec![
            Preset::new(
                "bad",
                "",
                "",
                ConversionParams {
                    image_mode: "inline".into(),
                    ..Default::default()
                },
            ),
            Preset::new("good", "", "", ConversionParams::default()),
        ];
        let config = SweepConfig::builder().presets(presets).build().unwrap();
        let fake = converter();
        let summary = SweepDriver::new(&fake, config).run(&doc, dir.path()).unwrap();

        assert!(!summary.results[0].success);
        assert!(summary.results[0].error.as_deref().unwrap().contains("inline"));
        assert!(summary.results[1].success);
        assert_eq!(fake.calls.borrow().len(), 1, "bad preset must not reach the service");
    }

    #[test]
    fn missing_document_aborts_before_any_preset() {
        let dir = tempfile::tempdir().unwrap();
        let fake = converter();
        let err = SweepDriver::new(&fake, SweepConfig::default())
            .run("/no/such/sample.pdf", dir.path().join("out"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(fake.calls.borrow().is_empty());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn struct_literal_config_with_duplicates_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sample_pdf(dir.path());
        let out = dir.path().join("out");
        let p = Preset::new("dup", "", "", ConversionParams::default());
        let config = SweepConfig {
            presets: vec![p.clone(), p],
            ..SweepConfig::default()
        };
        let fake = converter();
        let err = SweepDriver::new(&fake, config).run(&doc, &out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(fake.calls.borrow().is_empty());
        assert!(!out.exists());
    }

    #[test]
    fn struct_literal_config_with_report_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sample_pdf(dir.path());
        let config = SweepConfig {
            report_file: "../report.md".into(),
            ..SweepConfig::default()
        };
        let err = SweepDriver::new(converter(), config)
            .run(&doc, dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(
            err,
            SweepError::Configuration(ConfigError::InvalidReportFile { .. })
        ));
    }

    #[test]
    fn preset_export_named_like_the_report_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("configuration.pdf");
        std::fs::write(&doc, b"%PDF-1.7\n").unwrap();
        let config = SweepConfig::builder()
            .presets(vec![
                Preset::new("baseline", "", "", ConversionParams::default()),
                Preset::new("test_report", "", "", ConversionParams::default()),
            ])
            .build()
            .unwrap();
        let fake = converter();
        let err = SweepDriver::new(&fake, config)
            .run(&doc.to_string_lossy(), dir.path())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            SweepError::from(ConfigError::ReportCollision {
                preset: "test_report".into(),
                file: "configuration_test_report.md".into(),
            })
            .to_string()
        );
        assert!(fake.calls.borrow().is_empty());
    }

    #[test]
    fn single_conversion_rejects_bad_engine_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sample_pdf(dir.path());
        let out = dir.path().join("out");
        let fake = converter();
        let params = ConversionParams {
            enable_ocr: true,
            ocr_engine: "invalid_engine".into(),
            ..Default::default()
        };
        let err = convert_single(&fake, &doc, &params, "adhoc", &out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!out.exists());
        assert!(fake.calls.borrow().is_empty());
    }

    #[test]
    fn single_conversion_surfaces_service_failure() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sample_pdf(dir.path());
        let fake = converter();
        let params = ConversionParams {
            enable_ocr: true,
            ..Default::default()
        };
        let err = convert_single(&fake, &doc, &params, "adhoc", dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }

    #[test]
    fn single_conversion_writes_named_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sample_pdf(dir.path());
        let fake = converter();
        let result =
            convert_single(&fake, &doc, &ConversionParams::default(), "default", dir.path())
                .unwrap();
        assert!(result.success);
        let outputs = result.outputs.unwrap();
        assert_eq!(outputs.markdown, dir.path().join("sample_default.md"));
        assert_eq!(outputs.json, dir.path().join("sample_default.json"));
    }

    #[test]
    fn single_conversion_rejects_unsafe_name() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sample_pdf(dir.path());
        let err = convert_single(
            &converter(),
            &doc,
            &ConversionParams::default(),
            "../escape",
            dir.path(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
