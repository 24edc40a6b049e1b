//! Validation passes
//!
//! - `visitor`: traversal of declared dependencies across manifests
//! - `policy`: pattern rules, floating-version and case-consistency checks
//! - `restore`: lockfile restore validation with a pluggable mismatch strategy
//! - `autofix`: mismatch strategy that repairs prerelease declarations

mod autofix;
mod policy;
mod restore;
mod visitor;

pub use autofix::AutoFixMismatch;
pub use policy::{PolicyOptions, PolicyValidator};
pub use restore::{is_restored, mismatch_error, Mismatch, MismatchHandler, ReportMismatch, RestoreValidator};
pub use visitor::{DependencyVisitor, PackageVisitor, VisitResult};
