//! Package version type
//!
//! Handles versions of the form `major.minor[.patch[.revision]][-prerelease][+metadata]`.
//! Missing numeric components default to zero, so `1.4` and `1.4.0` are equal.

use regex::Regex;
use semver::{BuildMetadata, Prerelease};
use std::fmt;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.(\d+))?(?:-([0-9A-Za-z][0-9A-Za-z.\-]*))?(?:\+([0-9A-Za-z][0-9A-Za-z.\-]*))?$",
    )
    .unwrap()
});

/// A parsed package version
#[derive(Debug, Clone)]
pub struct PackageVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Fourth numeric component, zero when absent
    pub revision: u64,
    pub pre: Prerelease,
    pub build: BuildMetadata,
}

impl PackageVersion {
    /// Parse a version string, returning None when it is not a plain version
    pub fn parse(version_str: &str) -> Option<Self> {
        let trimmed = version_str.trim();
        let caps = VERSION_RE.captures(trimmed)?;

        let number = |idx: usize| -> Option<u64> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };

        let pre = match caps.get(5) {
            Some(m) => Prerelease::new(m.as_str()).ok()?,
            None => Prerelease::EMPTY,
        };
        let build = match caps.get(6) {
            Some(m) => BuildMetadata::new(m.as_str()).ok()?,
            None => BuildMetadata::EMPTY,
        };

        Some(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            revision: number(4)?,
            pre,
            build,
        })
    }

    /// Returns true if this version carries a prerelease label
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// The prerelease label, empty for stable versions
    pub fn release_label(&self) -> &str {
        self.pre.as_str()
    }

    /// Returns true when both versions share major.minor.patch.revision
    pub fn same_core(&self, other: &PackageVersion) -> bool {
        self.major == other.major
            && self.minor == other.minor
            && self.patch == other.patch
            && self.revision == other.revision
    }

    /// Same numeric components and metadata with a different prerelease label
    pub fn with_prerelease(&self, label: &str) -> Option<Self> {
        let pre = Prerelease::new(label).ok()?;
        Some(Self {
            pre,
            ..self.clone()
        })
    }

    /// Normalized form without build metadata
    pub fn to_normalized_string(&self) -> String {
        let mut s = format!("{}.{}.{}", self.major, self.minor, self.patch);
        if self.revision > 0 {
            s.push_str(&format!(".{}", self.revision));
        }
        if self.is_prerelease() {
            s.push('-');
            s.push_str(self.pre.as_str());
        }
        s
    }

    /// Normalized form including build metadata
    pub fn to_full_string(&self) -> String {
        let mut s = self.to_normalized_string();
        if !self.build.is_empty() {
            s.push('+');
            s.push_str(self.build.as_str());
        }
        s
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.same_core(other) && self.pre.as_str().eq_ignore_ascii_case(other.pre.as_str())
    }
}

impl Eq for PackageVersion {}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_full_string())
    }
}

/// Semantic equality of two version strings; false when either fails to parse
pub fn versions_equal(a: &str, b: &str) -> bool {
    match (PackageVersion::parse(a), PackageVersion::parse(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
