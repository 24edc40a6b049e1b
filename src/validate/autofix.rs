//! Automatic repair of prerelease mismatches
//!
//! When a requested prerelease version was not restored, the declaration is
//! rewritten to a version with the same `major.minor.patch` and the same
//! prerelease label. The candidate comes from the lockfile's resolved versions
//! first, then from a `VersionLookup` against the package sources.

use crate::domain::{Diagnostic, DiagnosticKind, PackageVersion};
use crate::lockfile::manifest_path_for;
use crate::lookup::VersionLookup;
use crate::manifest::{read_manifest, replace_dependency_version, write_manifest};
use crate::validate::restore::{mismatch_error, Mismatch, MismatchHandler};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key of a rewrite already applied: (manifest, package id, requested version)
type AppliedKey = (PathBuf, String, String);

/// Mismatch strategy that rewrites prerelease declarations in place
///
/// A declaration repeated under several target frameworks shows up once per
/// framework group; only the first mismatch rewrites the manifest.
pub struct AutoFixMismatch<L: VersionLookup> {
    lookup: L,
    applied: Mutex<HashMap<AppliedKey, String>>,
}

/// Outcome of rewriting a single declaration
enum Rewrite {
    Updated,
    NotDeclared,
}

impl<L: VersionLookup> AutoFixMismatch<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            applied: Mutex::new(HashMap::new()),
        }
    }

    fn applied_replacement(&self, key: &AppliedKey) -> Option<String> {
        self.applied
            .lock()
            .ok()
            .and_then(|applied| applied.get(key).cloned())
    }

    fn record_applied(&self, key: AppliedKey, replacement: &str) {
        if let Ok(mut applied) = self.applied.lock() {
            applied.insert(key, replacement.to_string());
        }
    }

    async fn find_replacement(
        &self,
        mismatch: &Mismatch,
        requested: &PackageVersion,
    ) -> Result<PackageVersion, Diagnostic> {
        // Same core, different label, any stability
        let restored = mismatch
            .resolved
            .iter()
            .filter_map(|v| PackageVersion::parse(v))
            .find(|v| v.same_core(requested) && v.release_label() != requested.release_label());
        if let Some(version) = restored {
            return Ok(version);
        }

        match self
            .lookup
            .find_version(&mismatch.id, requested.release_label())
            .await
        {
            Ok(Some(version)) => Ok(version),
            Ok(None) => Err(fix_error(
                mismatch,
                format!(
                    "{} {} was not restored and no version labelled '{}' is available from the package sources",
                    mismatch.id,
                    mismatch.requested,
                    requested.release_label()
                ),
            )),
            Err(e) => Err(fix_error(
                mismatch,
                format!(
                    "{} {} was not restored and the package sources could not be queried: {}",
                    mismatch.id, mismatch.requested, e
                ),
            )),
        }
    }
}

#[async_trait]
impl<L: VersionLookup> MismatchHandler for AutoFixMismatch<L> {
    async fn on_mismatch(&self, mismatch: &Mismatch) -> Vec<Diagnostic> {
        let requested = match PackageVersion::parse(&mismatch.requested) {
            Some(v) if v.is_prerelease() => v,
            // Only prerelease requests can be repaired
            _ => return vec![mismatch_error(mismatch)],
        };

        let Some(manifest_path) = manifest_path_for(&mismatch.lockfile_path) else {
            return vec![fix_error(
                mismatch,
                format!(
                    "cannot derive a manifest path from {}",
                    mismatch.lockfile_path.display()
                ),
            )];
        };

        let key = (
            manifest_path.clone(),
            mismatch.id.clone(),
            mismatch.requested.clone(),
        );
        if let Some(replacement) = self.applied_replacement(&key) {
            tracing::debug!(
                package = %mismatch.id,
                to = %replacement,
                "declaration already rewritten"
            );
            return Vec::new();
        }

        let replacement = match self.find_replacement(mismatch, &requested).await {
            Ok(v) => v.to_normalized_string(),
            Err(diagnostic) => return vec![diagnostic],
        };

        match rewrite(&manifest_path, mismatch, &replacement) {
            Ok(Rewrite::Updated) => {
                self.record_applied(key, &replacement);
                tracing::info!(
                    package = %mismatch.id,
                    from = %mismatch.requested,
                    to = %replacement,
                    "rewrote prerelease dependency"
                );
                vec![Diagnostic::warning(
                    DiagnosticKind::Fix,
                    format!(
                        "updated {} from {} to {} in {}",
                        mismatch.id,
                        mismatch.requested,
                        replacement,
                        manifest_path.display()
                    ),
                )
                .with_manifest(&mismatch.manifest_path)
                .with_package(&mismatch.id)]
            }
            // Rewritten earlier in the run, e.g. by a policy rule
            Ok(Rewrite::NotDeclared) => vec![Diagnostic::info(
                DiagnosticKind::Status,
                format!(
                    "{} {} is no longer declared in {}, nothing to rewrite",
                    mismatch.id,
                    mismatch.requested,
                    manifest_path.display()
                ),
            )
            .with_manifest(&mismatch.manifest_path)
            .with_package(&mismatch.id)],
            Err(message) => vec![fix_error(mismatch, message)],
        }
    }
}

fn rewrite(manifest_path: &Path, mismatch: &Mismatch, replacement: &str) -> Result<Rewrite, String> {
    if !manifest_path.exists() {
        return Err(format!(
            "manifest {} for {} does not exist",
            manifest_path.display(),
            mismatch.lockfile_path.display()
        ));
    }
    let content = read_manifest(manifest_path).map_err(|e| e.to_string())?;
    let Some(updated) =
        replace_dependency_version(&content, &mismatch.id, &mismatch.requested, replacement)
    else {
        return Ok(Rewrite::NotDeclared);
    };
    write_manifest(manifest_path, &updated).map_err(|e| e.to_string())?;
    Ok(Rewrite::Updated)
}

fn fix_error(mismatch: &Mismatch, message: String) -> Diagnostic {
    Diagnostic::error(DiagnosticKind::ResolutionMismatch, message)
        .with_manifest(&mismatch.manifest_path)
        .with_package(&mismatch.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::lockfile::Lockfile;
    use crate::lookup::DisabledLookup;
    use crate::validate::restore::RestoreValidator;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// In-memory package source listing
    #[derive(Default)]
    struct FakeLookup {
        listings: HashMap<String, Vec<String>>,
        queries: AtomicUsize,
    }

    impl FakeLookup {
        fn with(package: &str, versions: &[&str]) -> Self {
            let mut listings = HashMap::new();
            listings.insert(
                package.to_string(),
                versions.iter().map(|v| v.to_string()).collect(),
            );
            Self {
                listings,
                queries: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VersionLookup for FakeLookup {
        async fn find_version(
            &self,
            package: &str,
            prerelease: &str,
        ) -> Result<Option<PackageVersion>, LookupError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.listings.get(package).and_then(|versions| {
                versions
                    .iter()
                    .filter_map(|v| PackageVersion::parse(v))
                    .find(|v| v.release_label() == prerelease)
            }))
        }
    }

    fn setup(manifest: &str) -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let manifest_path = dir.path().join("project.json");
        let lock_path = dir.path().join("project.lock.json");
        fs::write(&manifest_path, manifest).unwrap();
        (dir, manifest_path, lock_path)
    }

    fn mismatch(id: &str, requested: &str, resolved: &[&str], manifest: &Path, lock: &Path) -> Mismatch {
        Mismatch {
            id: id.to_string(),
            requested: requested.to_string(),
            resolved: resolved.iter().map(|v| v.to_string()).collect(),
            manifest_path: manifest.to_path_buf(),
            lockfile_path: lock.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_uses_restored_version_with_same_core() {
        let (_dir, manifest, lock) = setup(r#"{"dependencies": {"Pkg.A": "1.0.0-beta"}}"#);
        let lookup = FakeLookup::default();
        let handler = AutoFixMismatch::new(lookup);

        let diagnostics = handler
            .on_mismatch(&mismatch("Pkg.A", "1.0.0-beta", &["1.0.0-beta2"], &manifest, &lock))
            .await;

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Fix);
        assert!(!diagnostics[0].is_error());
        assert_eq!(
            fs::read_to_string(&manifest).unwrap(),
            r#"{"dependencies": {"Pkg.A": "1.0.0-beta2"}}"#
        );
        assert_eq!(handler.lookup.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stable_request_is_not_fixable() {
        let (_dir, manifest, lock) = setup(r#"{"dependencies": {"Pkg.B": "2.0.0"}}"#);
        let handler = AutoFixMismatch::new(FakeLookup::with("Pkg.B", &["2.0.1"]));

        let diagnostics = handler
            .on_mismatch(&mismatch("Pkg.B", "2.0.0", &[], &manifest, &lock))
            .await;

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_error());
        assert_eq!(
            fs::read_to_string(&manifest).unwrap(),
            r#"{"dependencies": {"Pkg.B": "2.0.0"}}"#
        );
        assert_eq!(handler.lookup.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_lookup() {
        let (_dir, manifest, lock) = setup(r#"{"dependencies": {"Pkg.A": "1.0.0-rc1"}}"#);
        let handler = AutoFixMismatch::new(FakeLookup::with(
            "Pkg.A",
            &["1.0.0-beta", "1.0.3-rc1", "1.0.4-rc1"],
        ));

        // resolved version has a different core, so it is not a candidate
        let diagnostics = handler
            .on_mismatch(&mismatch("Pkg.A", "1.0.0-rc1", &["0.9.0-rc2"], &manifest, &lock))
            .await;

        assert_eq!(diagnostics[0].kind, DiagnosticKind::Fix);
        assert!(fs::read_to_string(&manifest)
            .unwrap()
            .contains(r#""Pkg.A": "1.0.3-rc1""#));
        assert_eq!(handler.lookup.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_without_match_is_error() {
        let (_dir, manifest, lock) = setup(r#"{"dependencies": {"Pkg.A": "1.0.0-rc1"}}"#);
        let handler = AutoFixMismatch::new(FakeLookup::with("Pkg.A", &["1.0.0-beta"]));

        let diagnostics = handler
            .on_mismatch(&mismatch("Pkg.A", "1.0.0-rc1", &[], &manifest, &lock))
            .await;

        assert!(diagnostics[0].is_error());
        assert!(diagnostics[0].message.contains("'rc1'"));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_error() {
        let (_dir, manifest, lock) = setup(r#"{"dependencies": {"Pkg.A": "1.0.0-rc1"}}"#);
        let handler = AutoFixMismatch::new(DisabledLookup);

        let diagnostics = handler
            .on_mismatch(&mismatch("Pkg.A", "1.0.0-rc1", &[], &manifest, &lock))
            .await;

        assert!(diagnostics[0].is_error());
        assert!(diagnostics[0].message.contains("could not be queried"));
    }

    #[tokio::test]
    async fn test_missing_manifest_is_error() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("project.json");
        let lock = dir.path().join("project.lock.json");
        let handler = AutoFixMismatch::new(FakeLookup::default());

        let diagnostics = handler
            .on_mismatch(&mismatch("Pkg.A", "1.0.0-beta", &["1.0.0-beta2"], &manifest, &lock))
            .await;

        assert!(diagnostics[0].is_error());
        assert!(diagnostics[0].message.contains("does not exist"));
    }

    #[tokio::test]
    async fn test_declaration_already_changed_is_informational() {
        let original = r#"{"dependencies": {"Pkg.A": "1.0.0-rc1"}}"#;
        let (_dir, manifest, lock) = setup(original);
        let handler = AutoFixMismatch::new(FakeLookup::default());

        let diagnostics = handler
            .on_mismatch(&mismatch("Pkg.A", "1.0.0-beta", &["1.0.0-beta2"], &manifest, &lock))
            .await;

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, crate::domain::Severity::Info);
        assert!(diagnostics[0].message.contains("no longer declared"));
        assert_eq!(fs::read_to_string(&manifest).unwrap(), original);
    }

    #[tokio::test]
    async fn test_repeated_mismatch_is_fixed_once() {
        let (_dir, manifest, lock) = setup(
            r#"{"frameworks": {"net46": {"dependencies": {"Pkg.A": "1.0.0-beta"}}, "netstandard1.3": {"dependencies": {"Pkg.A": "1.0.0-beta"}}}}"#,
        );
        let handler = AutoFixMismatch::new(FakeLookup::default());
        let m = mismatch("Pkg.A", "1.0.0-beta", &["1.0.0-beta2"], &manifest, &lock);

        let first = handler.on_mismatch(&m).await;
        let second = handler.on_mismatch(&m).await;

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind, DiagnosticKind::Fix);
        assert!(second.is_empty());
        assert_eq!(
            fs::read_to_string(&manifest).unwrap(),
            r#"{"frameworks": {"net46": {"dependencies": {"Pkg.A": "1.0.0-beta2"}}, "netstandard1.3": {"dependencies": {"Pkg.A": "1.0.0-beta2"}}}}"#
        );
    }

    #[tokio::test]
    async fn test_multi_framework_manifest_fixes_cleanly() {
        let (_dir, manifest, lock_path) = setup(
            r#"{
  "frameworks": {
    "net46": { "dependencies": { "Pkg.A": "1.0.0-beta" } },
    "netstandard1.3": { "dependencies": { "Pkg.A": "1.0.0-beta" } }
  }
}"#,
        );
        fs::write(
            &lock_path,
            r#"{
  "libraries": { "Pkg.A/1.0.0-beta2": {} },
  "projectFileDependencyGroups": {
    "": [],
    ".NETFramework,Version=v4.6": [ "Pkg.A >= 1.0.0-beta" ],
    ".NETStandard,Version=v1.3": [ "Pkg.A >= 1.0.0-beta" ]
  }
}"#,
        )
        .unwrap();

        let lock = Lockfile::load(&lock_path).unwrap();
        let validator = RestoreValidator::new(AutoFixMismatch::new(FakeLookup::default()));
        let diagnostics = validator.validate(&manifest, &lock).await;

        assert_eq!(diagnostics.iter().filter(|d| d.is_error()).count(), 0);
        assert_eq!(
            diagnostics
                .iter()
                .filter(|d| d.kind == DiagnosticKind::Fix)
                .count(),
            1
        );
        let content = fs::read_to_string(&manifest).unwrap();
        assert_eq!(content.matches(r#""Pkg.A": "1.0.0-beta2""#).count(), 2);
        assert!(!content.contains(r#""1.0.0-beta""#));
    }

    #[tokio::test]
    async fn test_restore_validator_with_autofix() {
        let (_dir, manifest, lock_path) = setup(
            r#"{"dependencies": {"Pkg.A": "1.0.0-beta", "Pkg.B": "2.0.0"}}"#,
        );
        fs::write(
            &lock_path,
            r#"{
  "libraries": { "Pkg.A/1.0.0-beta2": {} },
  "projectFileDependencyGroups": { "": [ "Pkg.A >= 1.0.0-beta", "Pkg.B >= 2.0.0" ] }
}"#,
        )
        .unwrap();

        let lock = Lockfile::load(&lock_path).unwrap();
        let validator = RestoreValidator::new(AutoFixMismatch::new(FakeLookup::default()));
        let diagnostics = validator.validate(&manifest, &lock).await;

        let fixes = diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Fix)
            .count();
        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        assert_eq!(fixes, 1);
        assert_eq!(errors, 1);
        assert_eq!(
            fs::read_to_string(&manifest).unwrap(),
            r#"{"dependencies": {"Pkg.A": "1.0.0-beta2", "Pkg.B": "2.0.0"}}"#
        );
    }
}
