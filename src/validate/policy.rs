//! Version policy validation
//!
//! `PolicyValidator` is a `PackageVisitor` that enforces:
//! - Pattern rules expecting an exact version or a prerelease label
//! - The floating-version prohibition
//! - Consistent casing of package ids across all visited manifests
//!
//! In fix mode rule violations and case mismatches are rewritten instead of
//! reported as errors.

use crate::domain::{
    Diagnostic, DiagnosticKind, PackageVersion, RuleExpectation, ValidationRule, FLOATING_MARKER,
};
use crate::manifest::{clear_readonly, read_manifest, replace_all_text, write_manifest, PackageEntry};
use crate::validate::visitor::{PackageVisitor, VisitResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Policy switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyOptions {
    pub prohibit_floating: bool,
    pub prohibit_case_mismatch: bool,
    /// Rewrite violations instead of reporting them
    pub fix: bool,
}

/// Every distinct (id, manifest) sighting of one lowercased id
#[derive(Debug, Default)]
struct CaseSightings {
    sightings: Vec<(String, PathBuf)>,
    conflicting: bool,
}

impl CaseSightings {
    fn record(&mut self, id: &str, path: &Path) {
        if self.sightings.iter().any(|(i, p)| i == id && p == path) {
            return;
        }
        if self.sightings.iter().any(|(i, _)| i != id) {
            self.conflicting = true;
        }
        self.sightings.push((id.to_string(), path.to_path_buf()));
    }

    /// Ordinal maximum of the sighted spellings
    fn preferred(&self) -> Option<&str> {
        self.sightings.iter().map(|(id, _)| id.as_str()).max()
    }
}

/// Enforces version policy over every visited dependency
pub struct PolicyValidator {
    rules: Vec<ValidationRule>,
    options: PolicyOptions,
    casing: BTreeMap<String, CaseSightings>,
}

impl PolicyValidator {
    pub fn new(rules: Vec<ValidationRule>, options: PolicyOptions) -> Self {
        Self {
            rules,
            options,
            casing: BTreeMap::new(),
        }
    }

    fn apply_rule(
        &self,
        rule: &ValidationRule,
        entry: &mut PackageEntry,
        manifest_path: &Path,
    ) -> Option<Diagnostic> {
        let (replacement, expected) = match rule.expectation() {
            RuleExpectation::Version(expected) => {
                if entry.version == *expected {
                    return None;
                }
                (Some(expected.clone()), format!("version {}", expected))
            }
            RuleExpectation::Prerelease(expected) => {
                let version = PackageVersion::parse(&entry.version)?;
                if !version.is_prerelease() || version.release_label() == expected {
                    return None;
                }
                (
                    version
                        .with_prerelease(expected)
                        .map(|v| v.to_full_string()),
                    format!("prerelease '{}'", expected),
                )
            }
        };

        let violation = format!(
            "{} {} does not match {} required by pattern '{}'",
            entry.id,
            entry.version,
            expected,
            rule.pattern()
        );

        if !self.options.fix {
            return Some(policy_error(violation, manifest_path, &entry.id));
        }

        let Some(replacement) = replacement else {
            return Some(policy_error(
                format!("{}; '{}' is not a valid prerelease label", violation, expected),
                manifest_path,
                &entry.id,
            ));
        };

        let message = format!(
            "updated {} from {} to {} (pattern '{}')",
            entry.id,
            entry.version,
            replacement,
            rule.pattern()
        );
        entry.version = replacement;
        Some(
            Diagnostic::warning(DiagnosticKind::Fix, message)
                .with_manifest(manifest_path)
                .with_package(&entry.id),
        )
    }

    fn fix_case(&self, id: &str, preferred: &str, path: &Path) -> Diagnostic {
        let result = read_manifest(path).and_then(|content| {
            let (updated, count) = replace_all_text(&content, id, preferred);
            if count > 0 {
                clear_readonly(path)?;
                write_manifest(path, &updated)?;
            }
            Ok(count)
        });

        match result {
            Ok(count) => {
                tracing::info!(path = %path.display(), from = id, to = preferred, count, "normalized package id casing");
                Diagnostic::warning(
                    DiagnosticKind::Fix,
                    format!(
                        "renamed '{}' to '{}' in {} ({} occurrences)",
                        id,
                        preferred,
                        path.display(),
                        count
                    ),
                )
                .with_manifest(path)
                .with_package(preferred)
            }
            Err(e) => Diagnostic::error(DiagnosticKind::Io, e.to_string())
                .with_manifest(path)
                .with_package(id),
        }
    }
}

impl PackageVisitor for PolicyValidator {
    fn visit_package(&mut self, entry: &mut PackageEntry, manifest_path: &Path) -> VisitResult {
        let mut result = VisitResult::unchanged();
        let mut rewritten_by: Option<String> = None;

        for rule in &self.rules {
            if !rule.matches(&entry.id) {
                continue;
            }
            let before = entry.version.clone();
            let Some(diagnostic) = self.apply_rule(rule, entry, manifest_path) else {
                continue;
            };
            result.push(diagnostic);

            if entry.version != before {
                if let Some(previous) = &rewritten_by {
                    result.push(
                        Diagnostic::warning(
                            DiagnosticKind::Configuration,
                            format!(
                                "rules '{}' and '{}' both rewrite {}",
                                previous,
                                rule.pattern(),
                                entry.id
                            ),
                        )
                        .with_manifest(manifest_path)
                        .with_package(&entry.id),
                    );
                }
                rewritten_by = Some(rule.pattern().to_string());
                result.updated = true;
            }
        }

        if self.options.prohibit_floating
            && !result.updated
            && entry.version.contains(FLOATING_MARKER)
        {
            result.push(policy_error(
                format!("{} uses floating version {}", entry.id, entry.version),
                manifest_path,
                &entry.id,
            ));
        }

        if self.options.prohibit_case_mismatch {
            self.casing
                .entry(entry.id.to_lowercase())
                .or_default()
                .record(&entry.id, manifest_path);
        }

        result
    }

    fn post_visit(&mut self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for record in self.casing.values().filter(|r| r.conflicting) {
            let Some(preferred) = record.preferred() else {
                continue;
            };
            for (id, path) in record.sightings.iter().filter(|(id, _)| id != preferred) {
                if self.options.fix {
                    diagnostics.push(self.fix_case(id, preferred, path));
                } else {
                    diagnostics.push(policy_error(
                        format!(
                            "package id '{}' differs in case from '{}' used elsewhere",
                            id, preferred
                        ),
                        path,
                        id,
                    ));
                }
            }
        }

        diagnostics
    }
}

fn policy_error(message: String, manifest_path: &Path, package: &str) -> Diagnostic {
    Diagnostic::error(DiagnosticKind::PolicyViolation, message)
        .with_manifest(manifest_path)
        .with_package(package)
}
