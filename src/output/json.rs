//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of the validation report
//! - Structured file-by-file diagnostics with a UTC timestamp

use crate::domain::{Diagnostic, ManifestReport, ValidationReport};
use crate::output::{OutputFormatter, Verbosity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level decides which diagnostics are included
    verbosity: Verbosity,
}

impl JsonFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of the full report
#[derive(Serialize)]
struct JsonOutput<'a> {
    checked_at: DateTime<Utc>,
    success: bool,
    fix_mode: bool,
    summary: JsonSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<&'a Diagnostic>,
    manifests: Vec<JsonManifest<'a>>,
}

/// JSON representation of summary statistics
#[derive(Serialize)]
struct JsonSummary {
    manifests: usize,
    packages: usize,
    errors: usize,
    warnings: usize,
    modified: usize,
}

/// JSON representation of a manifest result
#[derive(Serialize)]
struct JsonManifest<'a> {
    path: String,
    packages: usize,
    modified: bool,
    diagnostics: Vec<&'a Diagnostic>,
}

impl JsonFormatter {
    fn manifest_to_json<'a>(&self, manifest: &'a ManifestReport) -> JsonManifest<'a> {
        JsonManifest {
            path: manifest.path.display().to_string(),
            packages: manifest.packages,
            modified: manifest.modified,
            diagnostics: manifest
                .diagnostics
                .iter()
                .filter(|d| self.verbosity.shows(d))
                .collect(),
        }
    }

    fn write_json<T: Serialize>(&self, value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
        writeln!(writer, "{}", json)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &ValidationReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = JsonOutput {
            checked_at: Utc::now(),
            success: report.is_success(),
            fix_mode: report.fix_mode,
            summary: JsonSummary {
                manifests: report.manifests.len(),
                packages: report.manifests.iter().map(|m| m.packages).sum(),
                errors: report.error_count(),
                warnings: report.warning_count(),
                modified: report.modified_count(),
            },
            diagnostics: report
                .general
                .iter()
                .filter(|d| self.verbosity.shows(d))
                .collect(),
            manifests: report
                .manifests
                .iter()
                .map(|m| self.manifest_to_json(m))
                .collect(),
        };
        self.write_json(&output, writer)
    }

    fn format_manifest(
        &self,
        manifest: &ManifestReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.write_json(&self.manifest_to_json(manifest), writer)
    }
}
