//! Configuration types for the sweep driver and the conversion service client.
//!
//! Two structs, two concerns:
//!
//! * [`SweepConfig`] — *what* to run: the ordered preset list, where the
//!   report goes, and who hears about progress. Passed explicitly into
//!   [`crate::sweep::SweepDriver`], so tests can sweep a two-preset list
//!   without touching the built-in catalogue.
//! * [`ServiceConfig`] — *where* to run it: the docling-serve endpoint used by
//!   [`crate::converter::DoclingServeConverter`].
//!
//! Both are built via builders whose `build()` validates, mirroring how the
//! rest of the crate rejects bad settings before any conversion starts.

use crate::error::ConfigError;
use crate::presets::{default_presets, validate_presets, Preset};
use crate::progress::ProgressCallback;
use reqwest::Url;
use std::fmt;

/// File name of the comparison report written into the output directory.
pub const DEFAULT_REPORT_FILE: &str = "configuration_test_report.md";

/// Default docling-serve endpoint.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5001";

// ── SweepConfig ──────────────────────────────────────────────────────────

/// Configuration for one sweep.
///
/// # Example
/// ```rust
/// use docling_sweep::{default_presets, SweepConfig};
///
/// let config = SweepConfig::builder()
///     .presets(default_presets().into_iter().take(2).collect())
///     .build()
///     .unwrap();
/// assert_eq!(config.presets.len(), 2);
/// ```
#[derive(Clone)]
pub struct SweepConfig {
    /// Presets, executed strictly in this order. Default: the built-in catalogue.
    pub presets: Vec<Preset>,

    /// Report file name, relative to the output directory.
    /// Default: `configuration_test_report.md`.
    ///
    /// Must be a plain file name. A sweep refuses to start when a preset's
    /// export (`{base}_{preset}.md` / `.json`) would have this name.
    pub report_file: String,

    /// Optional progress callback for per-preset events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            presets: default_presets(),
            report_file: DEFAULT_REPORT_FILE.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SweepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweepConfig")
            .field(
                "presets",
                &self.presets.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            )
            .field("report_file", &self.report_file)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn SweepProgressCallback>"),
            )
            .finish()
    }
}

impl SweepConfig {
    /// Create a new builder for `SweepConfig`.
    pub fn builder() -> SweepConfigBuilder {
        SweepConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check preset names and the report file name.
    ///
    /// The fields are public, so [`crate::sweep::SweepDriver::run`] calls
    /// this again rather than trusting the builder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_presets(&self.presets)?;
        validate_report_file(&self.report_file)
    }
}

fn validate_report_file(name: &str) -> Result<(), ConfigError> {
    let reason = if name.trim().is_empty() {
        Some("empty file name")
    } else if name.contains(['/', '\\']) {
        Some("must not contain a path separator")
    } else if name == "." || name == ".." {
        Some("not a file name")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ConfigError::InvalidReportFile {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Builder for [`SweepConfig`].
#[derive(Debug)]
pub struct SweepConfigBuilder {
    config: SweepConfig,
}

impl SweepConfigBuilder {
    pub fn presets(mut self, presets: Vec<Preset>) -> Self {
        self.config.presets = presets;
        self
    }

    pub fn report_file(mut self, name: impl Into<String>) -> Self {
        self.config.report_file = name.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating preset names and the report file name.
    pub fn build(self) -> Result<SweepConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── ServiceConfig ────────────────────────────────────────────────────────

/// Connection settings for docling-serve.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Base URL, e.g. `http://localhost:5001`. Default: [`DEFAULT_SERVICE_URL`].
    pub base_url: Url,

    /// Sent as `X-Api-Key` when the server requires one.
    pub api_key: Option<String>,

    /// Per-request timeout in seconds. Default: None.
    ///
    /// A conversion with OCR and captioning on a long document can take many
    /// minutes, so no timeout is applied unless one is asked for.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_SERVICE_URL)
                .unwrap_or_else(|e| unreachable!("default service URL: {e}")),
            api_key: None,
            request_timeout_secs: None,
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            base_url: None,
            config: Self::default(),
        }
    }

    /// Absolute URL of an API path below the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    base_url: Option<String>,
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.config.api_key = (!key.is_empty()).then_some(key);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = (secs > 0).then_some(secs);
        self
    }

    /// Build the configuration, validating the base URL.
    pub fn build(mut self) -> Result<ServiceConfig, ConfigError> {
        if let Some(raw) = self.base_url.take() {
            let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidServiceUrl {
                url: raw.clone(),
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidServiceUrl {
                    url: raw,
                    reason: "scheme must be http or https".into(),
                });
            }
            self.config.base_url = url;
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ConversionParams;

    #[test]
    fn sweep_defaults_use_builtin_catalogue() {
        let config = SweepConfig::builder().build().unwrap();
        assert_eq!(config.presets.len(), 11);
        assert_eq!(config.report_file, DEFAULT_REPORT_FILE);
        assert!(config.progress_callback.is_none());
    }

    #[test]
    fn sweep_rejects_empty_and_duplicate_presets() {
        assert_eq!(
            SweepConfig::builder().presets(vec![]).build().unwrap_err(),
            ConfigError::NoPresets
        );
        let p = Preset::new("same", "", "", ConversionParams::default());
        assert!(matches!(
            SweepConfig::builder().presets(vec![p.clone(), p]).build(),
            Err(ConfigError::DuplicatePreset { .. })
        ));
    }

    #[test]
    fn sweep_rejects_report_paths() {
        for name in ["", "reports/out.md", "..\\out.md", ".."] {
            assert!(
                matches!(
                    SweepConfig::builder().report_file(name).build(),
                    Err(ConfigError::InvalidReportFile { .. })
                ),
                "report file {name:?} accepted"
            );
        }
        assert!(SweepConfig::builder().report_file("compare.md").build().is_ok());
    }

    #[test]
    fn validate_catches_struct_literal_configs() {
        let p = Preset::new("dup", "", "", ConversionParams::default());
        let config = SweepConfig {
            presets: vec![p.clone(), p],
            ..SweepConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicatePreset { name: "dup".into() })
        );
    }

    #[test]
    fn sweep_debug_lists_preset_names() {
        let config = SweepConfig::default();
        let dbg = format!("{config:?}");
        assert!(dbg.contains("baseline"));
    }

    #[test]
    fn service_default_endpoint() {
        let config = ServiceConfig::builder().build().unwrap();
        assert_eq!(
            config.endpoint("/v1/convert/source"),
            "http://localhost:5001/v1/convert/source"
        );
        assert_eq!(config.request_timeout_secs, None);
    }

    #[test]
    fn service_custom_url_with_path_prefix() {
        let config = ServiceConfig::builder()
            .base_url("https://docling.internal/api/")
            .build()
            .unwrap();
        assert_eq!(
            config.endpoint("v1/convert/source"),
            "https://docling.internal/api/v1/convert/source"
        );
    }

    #[test]
    fn service_rejects_bad_urls() {
        for url in ["not a url", "ftp://host/"] {
            assert!(matches!(
                ServiceConfig::builder().base_url(url).build(),
                Err(ConfigError::InvalidServiceUrl { .. })
            ));
        }
    }

    #[test]
    fn service_debug_redacts_api_key() {
        let config = ServiceConfig::builder().api_key("secret-key").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn zero_timeout_means_none() {
        let config = ServiceConfig::builder()
            .request_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(config.request_timeout_secs, None);
    }
}
