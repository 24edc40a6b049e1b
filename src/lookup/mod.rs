//! Version lookup against configured package sources
//!
//! This module provides:
//! - The `VersionLookup` trait used by the auto-fix handler
//! - `ToolVersionLookup`, which shells out to an external feed query tool

mod tool;

pub use tool::{parse_listing_line, ToolVersionLookup, DEFAULT_LOOKUP_TIMEOUT};

use crate::domain::PackageVersion;
use crate::error::LookupError;
use async_trait::async_trait;

/// Finds an available version of a package carrying a given prerelease label
#[async_trait]
pub trait VersionLookup: Send + Sync {
    /// Return the first listed version of `package` whose prerelease label
    /// equals `prerelease`, or None when the listing has no such version
    async fn find_version(
        &self,
        package: &str,
        prerelease: &str,
    ) -> Result<Option<PackageVersion>, LookupError>;
}

/// Lookup used when no tool is configured; every query fails
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledLookup;

#[async_trait]
impl VersionLookup for DisabledLookup {
    async fn find_version(
        &self,
        package: &str,
        _prerelease: &str,
    ) -> Result<Option<PackageVersion>, LookupError> {
        Err(LookupError::NotConfigured {
            package: package.to_string(),
        })
    }
}
