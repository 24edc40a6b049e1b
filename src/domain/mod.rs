//! Core domain models for depvet
//!
//! This module contains the fundamental types used throughout the application:
//! - Package versions and version constraints
//! - Validation pattern rules
//! - Diagnostics and the aggregated validation report

mod constraint;
mod diagnostic;
mod report;
mod rule;
mod version;

pub use constraint::{VersionConstraint, FLOATING_MARKER};
pub use diagnostic::{has_errors, Diagnostic, DiagnosticKind, Severity};
pub use report::{ManifestReport, ValidationReport};
pub use rule::{compile_rules, RuleExpectation, RuleSpec, ValidationRule};
pub use version::{versions_equal, PackageVersion};
