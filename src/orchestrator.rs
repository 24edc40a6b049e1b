//! Validation orchestrator for coordinating a full run
//!
//! This module provides:
//! - Workflow coordination: configure → detect → policy pass → restore pass
//! - Selection of the mismatch strategy (report or auto-fix)
//! - Error handling with partial continuation: every manifest is processed

use crate::cli::CliArgs;
use crate::config::Config;
use crate::domain::{compile_rules, Diagnostic, DiagnosticKind, ValidationReport};
use crate::error::{AppError, IoError};
use crate::lockfile::{lockfile_path_for, Lockfile};
use crate::lookup::{DisabledLookup, ToolVersionLookup, VersionLookup};
use crate::manifest::detect_manifests;
use crate::progress::Progress;
use crate::validate::{
    AutoFixMismatch, DependencyVisitor, MismatchHandler, PolicyValidator, RestoreValidator,
};
use std::path::PathBuf;

/// Orchestrator for coordinating the validation workflow
pub struct Orchestrator {
    /// Effective configuration (file overlaid with CLI flags)
    config: Config,
    /// Manifest files or directories to scan
    paths: Vec<PathBuf>,
    run_policy: bool,
    run_restore: bool,
    show_progress: bool,
}

impl Orchestrator {
    /// Create an orchestrator running both passes without progress display
    pub fn new(config: Config, paths: Vec<PathBuf>) -> Self {
        Self {
            config,
            paths,
            run_policy: true,
            run_restore: true,
            show_progress: false,
        }
    }

    /// Create an orchestrator from CLI arguments, loading the configuration file
    pub fn from_args(args: &CliArgs) -> Result<Self, AppError> {
        let base_dir = std::env::current_dir().map_err(|e| IoError::from_io(".", e))?;
        let mut config = Config::discover(args.config.as_deref(), &base_dir)?;
        config.apply_cli(args);

        Ok(Self::new(config, args.paths.clone())
            .with_passes(!args.skip_policy, !args.skip_restore)
            .with_progress(args.show_progress()))
    }

    /// Enable or disable the policy and restore passes
    pub fn with_passes(mut self, policy: bool, restore: bool) -> Self {
        self.run_policy = policy;
        self.run_restore = restore;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the validation workflow with the configured lookup tool
    pub async fn run(&self) -> ValidationReport {
        match &self.config.lookup_tool {
            Some(tool) => {
                let lookup = ToolVersionLookup::new(tool, self.config.package_sources.clone())
                    .with_timeout(self.config.lookup_timeout());
                self.run_with_lookup(lookup).await
            }
            None => self.run_with_lookup(DisabledLookup).await,
        }
    }

    /// Run the validation workflow with an explicit version lookup
    pub async fn run_with_lookup<L: VersionLookup>(&self, lookup: L) -> ValidationReport {
        let fix_mode = self.config.fix_mode();
        let mut report = ValidationReport::new(fix_mode);
        let mut progress = Progress::new(self.show_progress);

        tracing::info!(
            fix = fix_mode,
            rules = self.config.rules.len(),
            "starting validation"
        );

        // Step 1: Detect manifest files
        progress.spinner("Detecting manifest files...");
        let manifests = detect_manifests(&self.paths);
        progress.finish_and_clear();

        if manifests.is_empty() {
            report.push(Diagnostic::info(
                DiagnosticKind::Status,
                "no project.json manifests found",
            ));
            return report;
        }
        tracing::debug!(count = manifests.len(), "detected manifests");

        // Step 2: Policy pass
        if self.run_policy {
            let (rules, errors) = compile_rules(&self.config.rules);
            report.extend(
                errors
                    .into_iter()
                    .map(|e| Diagnostic::error(DiagnosticKind::Configuration, e.to_string())),
            );

            let mut policy = PolicyValidator::new(rules, self.config.policy_options());
            DependencyVisitor::new(&manifests)
                .with_progress(Progress::new(self.show_progress))
                .run(&mut policy, &mut report);
        }

        // Step 3: Restore pass
        if self.run_restore {
            if fix_mode {
                let validator = RestoreValidator::new(AutoFixMismatch::new(lookup));
                self.restore_pass(&manifests, &validator, &mut progress, &mut report)
                    .await;
            } else {
                let validator = RestoreValidator::reporting();
                self.restore_pass(&manifests, &validator, &mut progress, &mut report)
                    .await;
            }
        }

        tracing::info!(
            errors = report.error_count(),
            warnings = report.warning_count(),
            modified = report.modified_count(),
            "validation finished"
        );
        report
    }

    async fn restore_pass<H: MismatchHandler>(
        &self,
        manifests: &[PathBuf],
        validator: &RestoreValidator<H>,
        progress: &mut Progress,
        report: &mut ValidationReport,
    ) {
        progress.start(manifests.len() as u64, "Checking restored versions");

        for manifest_path in manifests {
            progress.set_message(&format!("Checking {}", manifest_path.display()));
            report.manifest_mut(manifest_path);

            let lock_path = match lockfile_path_for(manifest_path) {
                Some(p) if p.is_file() => p,
                _ => {
                    report.push(
                        Diagnostic::info(
                            DiagnosticKind::Status,
                            format!(
                                "no lockfile for {}, restore validation skipped",
                                manifest_path.display()
                            ),
                        )
                        .with_manifest(manifest_path),
                    );
                    progress.inc();
                    continue;
                }
            };

            match Lockfile::load(&lock_path) {
                Ok(lockfile) => {
                    let diagnostics = validator.validate(manifest_path, &lockfile).await;
                    if diagnostics.iter().any(|d| d.kind == DiagnosticKind::Fix) {
                        report.manifest_mut(manifest_path).modified = true;
                    }
                    report.extend(diagnostics);
                }
                Err(e) => report.push(
                    Diagnostic::error(DiagnosticKind::Io, e.to_string()).with_manifest(manifest_path),
                ),
            }
            progress.inc();
        }

        progress.finish_and_clear();
    }
}
