//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Diagnostics grouped by manifest, colored by severity
//! - A summary line with error, warning and rewrite counts

use crate::domain::{Diagnostic, ManifestReport, Severity, ValidationReport};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    color: bool,
}

impl TextFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn severity_label(&self, severity: Severity) -> String {
        let label = severity.to_string();
        if !self.color {
            return label;
        }
        match severity {
            Severity::Error => label.red().bold().to_string(),
            Severity::Warning => label.yellow().to_string(),
            Severity::Info => label.dimmed().to_string(),
        }
    }

    fn format_diagnostic(
        &self,
        diagnostic: &Diagnostic,
        indent: &str,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        writeln!(
            writer,
            "{}{}: {}",
            indent,
            self.severity_label(diagnostic.severity),
            diagnostic.message
        )
    }

    fn format_summary(&self, report: &ValidationReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let errors = report.error_count();
        let warnings = report.warning_count();
        let manifests = report.manifests.len();

        let mut line = if errors == 0 {
            format!(
                "✓ {} {} checked, no errors",
                manifests,
                if manifests == 1 { "manifest" } else { "manifests" }
            )
        } else {
            format!(
                "✗ {} {} in {} {}",
                errors,
                if errors == 1 { "error" } else { "errors" },
                manifests,
                if manifests == 1 { "manifest" } else { "manifests" }
            )
        };
        if warnings > 0 {
            line.push_str(&format!(
                ", {} {}",
                warnings,
                if warnings == 1 { "warning" } else { "warnings" }
            ));
        }
        if report.fix_mode {
            line.push_str(&format!(", {} rewritten", report.modified_count()));
        }

        if !self.color {
            return writeln!(writer, "{}", line);
        }
        if errors == 0 {
            writeln!(writer, "{}", line.green())
        } else {
            writeln!(writer, "{}", line.red().bold())
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &ValidationReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let general: Vec<_> = report
            .general
            .iter()
            .filter(|d| self.verbosity.shows(d))
            .collect();
        for diagnostic in &general {
            self.format_diagnostic(diagnostic, "", writer)?;
        }
        if !general.is_empty() {
            writeln!(writer)?;
        }

        for manifest in &report.manifests {
            self.format_manifest(manifest, writer)?;
        }

        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }
        self.format_summary(report, writer)
    }

    fn format_manifest(
        &self,
        manifest: &ManifestReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let shown: Vec<_> = manifest
            .diagnostics
            .iter()
            .filter(|d| self.verbosity.shows(d))
            .collect();

        // Skip clean manifests
        if shown.is_empty() && !(self.verbosity == Verbosity::Verbose && manifest.modified) {
            return Ok(());
        }

        let path_display = manifest.path.display().to_string();
        let errors = manifest.count(Severity::Error);
        let warnings = manifest.count(Severity::Warning);
        let modified = if manifest.modified { " (rewritten)" } else { "" };

        if self.color {
            writeln!(
                writer,
                "{} {}{}",
                path_display.bold(),
                format!("— {} errors, {} warnings", errors, warnings).dimmed(),
                modified.cyan()
            )?;
        } else {
            writeln!(
                writer,
                "{} — {} errors, {} warnings{}",
                path_display, errors, warnings, modified
            )?;
        }

        for diagnostic in shown {
            self.format_diagnostic(diagnostic, "  ", writer)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}
