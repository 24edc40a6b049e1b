//! Validation report types
//!
//! Provides structures for tracking results at manifest and overall levels.

use super::{Diagnostic, Severity};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of validating a single manifest file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestReport {
    /// Path to the manifest file
    pub path: PathBuf,
    /// Number of declared dependencies visited
    pub packages: usize,
    /// Whether the file was rewritten
    pub modified: bool,
    /// Diagnostics attributed to this manifest
    pub diagnostics: Vec<Diagnostic>,
}

impl ManifestReport {
    /// Creates a new ManifestReport
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            packages: 0,
            modified: false,
            diagnostics: Vec::new(),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }
}

/// Overall result of a validation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Per-manifest results, in discovery order
    pub manifests: Vec<ManifestReport>,
    /// Diagnostics not tied to one manifest (configuration, cross-manifest checks)
    pub general: Vec<Diagnostic>,
    /// Whether fix mode was enabled
    pub fix_mode: bool,
}

impl ValidationReport {
    /// Creates a new, empty report
    pub fn new(fix_mode: bool) -> Self {
        Self {
            manifests: Vec::new(),
            general: Vec::new(),
            fix_mode,
        }
    }

    /// Record a diagnostic, attributing it to its manifest when one is known
    pub fn push(&mut self, diagnostic: Diagnostic) {
        let Some(path) = diagnostic.manifest.clone() else {
            self.general.push(diagnostic);
            return;
        };
        self.manifest_mut(&path).diagnostics.push(diagnostic);
    }

    /// Record several diagnostics
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    /// Get or create the report for a manifest
    pub fn manifest_mut(&mut self, path: &std::path::Path) -> &mut ManifestReport {
        match self.manifests.iter().position(|m| m.path == path) {
            Some(idx) => &mut self.manifests[idx],
            None => {
                self.manifests.push(ManifestReport::new(path));
                let last = self.manifests.len() - 1;
                &mut self.manifests[last]
            }
        }
    }

    /// Iterate over every diagnostic
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.general
            .iter()
            .chain(self.manifests.iter().flat_map(|m| m.diagnostics.iter()))
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Number of manifests rewritten during the run
    pub fn modified_count(&self) -> usize {
        self.manifests.iter().filter(|m| m.modified).count()
    }

    /// The run succeeds exactly when no error was reported
    pub fn is_success(&self) -> bool {
        self.error_count() == 0
    }
}
