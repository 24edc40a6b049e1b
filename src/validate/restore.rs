//! Restore validation
//!
//! Compares the requests recorded in a lockfile's framework groups against the
//! libraries the restore actually resolved. Every request whose version was
//! not restored is handed to a `MismatchHandler` strategy.

use crate::domain::{versions_equal, Diagnostic, DiagnosticKind};
use crate::lockfile::{DependencyRequest, Lockfile};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A declared version that is missing from the resolved set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub id: String,
    pub requested: String,
    /// Versions of `id` that were restored, possibly empty
    pub resolved: Vec<String>,
    pub manifest_path: PathBuf,
    pub lockfile_path: PathBuf,
}

/// Strategy invoked for every non-existent dependency
#[async_trait]
pub trait MismatchHandler: Send + Sync {
    async fn on_mismatch(&self, mismatch: &Mismatch) -> Vec<Diagnostic>;
}

/// Default strategy: report the mismatch as an error
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportMismatch;

#[async_trait]
impl MismatchHandler for ReportMismatch {
    async fn on_mismatch(&self, mismatch: &Mismatch) -> Vec<Diagnostic> {
        vec![mismatch_error(mismatch)]
    }
}

/// Error describing what was restored instead of the requested version
pub fn mismatch_error(mismatch: &Mismatch) -> Diagnostic {
    let restored = if mismatch.resolved.is_empty() {
        "no version was restored".to_string()
    } else {
        format!("restored: {}", mismatch.resolved.join(", "))
    };
    Diagnostic::error(
        DiagnosticKind::ResolutionMismatch,
        format!(
            "{} {} was requested by {} but not restored ({})",
            mismatch.id,
            mismatch.requested,
            mismatch.manifest_path.display(),
            restored
        ),
    )
    .with_manifest(&mismatch.manifest_path)
    .with_package(&mismatch.id)
}

/// Returns true when `requested` is among the resolved versions, either
/// textually, with a `.0` appended, or by semantic equality
pub fn is_restored<S: AsRef<str>>(requested: &str, resolved: &[S]) -> bool {
    let padded = format!("{}.0", requested);
    resolved
        .iter()
        .any(|r| r.as_ref() == requested || r.as_ref() == padded)
        || resolved.iter().any(|r| versions_equal(r.as_ref(), requested))
}

/// Validates lockfile requests with a pluggable mismatch strategy
pub struct RestoreValidator<H: MismatchHandler> {
    handler: H,
}

impl RestoreValidator<ReportMismatch> {
    /// Validator that reports every mismatch as an error
    pub fn reporting() -> Self {
        Self::new(ReportMismatch)
    }
}

impl<H: MismatchHandler> RestoreValidator<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// Validate one manifest against its lockfile
    pub async fn validate(&self, manifest_path: &Path, lockfile: &Lockfile) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let resolved = lockfile.resolved_versions();

        for group in lockfile.groups() {
            let mut mismatches = 0usize;

            for raw in &group.requests {
                let Some(request) = DependencyRequest::parse(raw) else {
                    diagnostics.push(
                        Diagnostic::error(
                            DiagnosticKind::ResolutionMismatch,
                            format!(
                                "malformed dependency request '{}' in {}",
                                raw,
                                lockfile.path().display()
                            ),
                        )
                        .with_manifest(manifest_path),
                    );
                    continue;
                };

                let versions: &[&str] = resolved
                    .get(request.id.as_str())
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                if is_restored(&request.version, versions) {
                    continue;
                }

                mismatches += 1;
                tracing::debug!(
                    package = %request.id,
                    requested = %request.version,
                    framework = group.display_name(),
                    "dependency not restored"
                );

                let mismatch = Mismatch {
                    id: request.id.clone(),
                    requested: request.version.clone(),
                    resolved: versions.iter().map(|v| v.to_string()).collect(),
                    manifest_path: manifest_path.to_path_buf(),
                    lockfile_path: lockfile.path().to_path_buf(),
                };
                diagnostics.extend(self.handler.on_mismatch(&mismatch).await);
            }

            if mismatches > 0 {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::ResolutionMismatch,
                        format!(
                            "{} dependencies for framework {} in {} do not match restored versions",
                            mismatches,
                            group.display_name(),
                            manifest_path.display()
                        ),
                    )
                    .with_manifest(manifest_path),
                );
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;
    use std::sync::Mutex;

    const LOCK: &str = r#"{
  "libraries": {
    "Pkg.A/1.0.0-beta2": {},
    "Pkg.C/1.4.0": {},
    "Pkg.D/2.0.0-RC1": {},
    "Pkg.E/3.0.0": {}
  },
  "projectFileDependencyGroups": {
    "": [ "Pkg.A >= 1.0.0-beta", "Pkg.C >= 1.4", "Pkg.E >= 3.0.0" ],
    "net46": [ "Pkg.D >= 2.0.0-rc1", "Pkg.B >= 2.0.0" ]
  }
}"#;

    /// Collects mismatches without producing diagnostics
    #[derive(Default)]
    struct Collect(Mutex<Vec<Mismatch>>);

    #[async_trait]
    impl MismatchHandler for Collect {
        async fn on_mismatch(&self, mismatch: &Mismatch) -> Vec<Diagnostic> {
            self.0.lock().unwrap().push(mismatch.clone());
            Vec::new()
        }
    }

    #[test]
    fn test_is_restored() {
        assert!(is_restored("1.0.0", &["1.0.0"]));
        assert!(is_restored("1.4", &["1.4.0"]));
        assert!(is_restored("2.0.0-rc1", &["2.0.0-RC1"]));
        assert!(!is_restored("1.0.0-beta", &["1.0.0-beta2"]));
        assert!(!is_restored::<&str>("1.0.0", &[]));
    }

    #[tokio::test]
    async fn test_handler_receives_each_mismatch() {
        let lock = Lockfile::parse("/src/project.lock.json", LOCK).unwrap();
        let validator = RestoreValidator::new(Collect::default());
        let diagnostics = validator
            .validate(Path::new("/src/project.json"), &lock)
            .await;

        let mismatches = validator.handler.0.lock().unwrap().clone();
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].id, "Pkg.A");
        assert_eq!(mismatches[0].requested, "1.0.0-beta");
        assert_eq!(mismatches[0].resolved, vec!["1.0.0-beta2"]);
        assert_eq!(mismatches[1].id, "Pkg.B");
        assert!(mismatches[1].resolved.is_empty());

        // one summary warning per framework group with mismatches
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.severity == Severity::Warning));
        assert!(diagnostics[1].message.contains("net46"));
    }

    #[tokio::test]
    async fn test_reporting_handler_lists_restored_versions() {
        let lock = Lockfile::parse("/src/project.lock.json", LOCK).unwrap();
        let diagnostics = RestoreValidator::reporting()
            .validate(Path::new("/src/project.json"), &lock)
            .await;

        let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("restored: 1.0.0-beta2"));
        assert!(errors[1].message.contains("no version was restored"));
        assert_eq!(errors[0].package.as_deref(), Some("Pkg.A"));
    }

    #[tokio::test]
    async fn test_clean_lockfile_has_no_diagnostics() {
        let lock = Lockfile::parse(
            "/src/project.lock.json",
            r#"{"libraries": {"Pkg.A/1.0.0": {}}, "projectFileDependencyGroups": {"": ["Pkg.A >= 1.0.0"]}}"#,
        )
        .unwrap();
        let diagnostics = RestoreValidator::reporting()
            .validate(Path::new("/src/project.json"), &lock)
            .await;
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_name_match_is_case_sensitive() {
        let lock = Lockfile::parse(
            "/src/project.lock.json",
            r#"{"libraries": {"pkg.a/1.0.0": {}}, "projectFileDependencyGroups": {"": ["Pkg.A >= 1.0.0"]}}"#,
        )
        .unwrap();
        let diagnostics = RestoreValidator::reporting()
            .validate(Path::new("/src/project.json"), &lock)
            .await;
        assert_eq!(diagnostics.iter().filter(|d| d.is_error()).count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_request_is_error() {
        let lock = Lockfile::parse(
            "/src/project.lock.json",
            r#"{"projectFileDependencyGroups": {"": ["Pkg.A"]}}"#,
        )
        .unwrap();
        let diagnostics = RestoreValidator::reporting()
            .validate(Path::new("/src/project.json"), &lock)
            .await;
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("malformed"));
    }
}
