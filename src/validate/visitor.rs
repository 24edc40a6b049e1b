//! Traversal of declared dependencies across manifests
//!
//! The `DependencyVisitor` parses each manifest, hands every declared
//! dependency to a `PackageVisitor`, persists manifests whose entries were
//! updated, and finally gives the visitor one cross-manifest pass.

use crate::domain::{Diagnostic, DiagnosticKind, ValidationReport};
use crate::manifest::{Manifest, PackageEntry};
use crate::progress::Progress;
use std::path::{Path, PathBuf};

/// Outcome of visiting one declared dependency
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitResult {
    /// Whether the entry's version was changed
    pub updated: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl VisitResult {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Callbacks driven by the `DependencyVisitor`
pub trait PackageVisitor {
    /// Inspect one declared dependency, optionally rewriting `entry.version`
    fn visit_package(&mut self, entry: &mut PackageEntry, manifest_path: &Path) -> VisitResult;

    /// Cross-manifest checks after every manifest was visited
    fn post_visit(&mut self) -> Vec<Diagnostic>;
}

/// Drives a `PackageVisitor` over a set of manifests
pub struct DependencyVisitor<'a> {
    manifests: &'a [PathBuf],
    progress: Progress,
}

impl<'a> DependencyVisitor<'a> {
    pub fn new(manifests: &'a [PathBuf]) -> Self {
        Self {
            manifests,
            progress: Progress::disabled(),
        }
    }

    /// Show a progress bar while visiting
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Visit every manifest, recording diagnostics in `report`
    pub fn run(mut self, visitor: &mut dyn PackageVisitor, report: &mut ValidationReport) {
        self.progress
            .start(self.manifests.len() as u64, "Checking dependency policy");

        for path in self.manifests {
            self.progress.set_message(&format!("Checking {}", path.display()));
            visit_manifest(path, visitor, report);
            self.progress.inc();
        }
        self.progress.finish_and_clear();

        report.extend(visitor.post_visit());
    }
}

fn visit_manifest(path: &Path, visitor: &mut dyn PackageVisitor, report: &mut ValidationReport) {
    let mut manifest = match Manifest::load(path) {
        Ok(m) => m,
        Err(e) => {
            report.push(Diagnostic::error(DiagnosticKind::Io, e.to_string()).with_manifest(path));
            return;
        }
    };

    report.manifest_mut(path).packages = manifest.package_count();

    let positions: Vec<(usize, usize)> = manifest
        .sections()
        .iter()
        .enumerate()
        .flat_map(|(s, section)| (0..section.packages.len()).map(move |p| (s, p)))
        .collect();

    for (s, p) in positions {
        // Read fresh: an earlier rewrite of the same id updates later sections too
        let mut entry = manifest.sections()[s].packages[p].clone();
        let before = entry.version.clone();

        let result = visitor.visit_package(&mut entry, path);
        report.extend(result.diagnostics);

        if result.updated && entry.version != before {
            if let Err(e) = manifest.set_version(&entry.id, &before, &entry.version) {
                report.push(
                    Diagnostic::error(DiagnosticKind::Io, e.to_string())
                        .with_manifest(path)
                        .with_package(&entry.id),
                );
            }
        }
    }

    match manifest.save() {
        Ok(true) => {
            tracing::debug!(path = %path.display(), "manifest rewritten");
            report.manifest_mut(path).modified = true;
        }
        Ok(false) => {}
        Err(e) => {
            report.push(Diagnostic::error(DiagnosticKind::Io, e.to_string()).with_manifest(path))
        }
    }
}
