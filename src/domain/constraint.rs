//! Version constraint parsing
//!
//! Handles the constraint forms found in `project.json`:
//! - Exact: `1.2.3`, `1.0.0-beta2`
//! - Floating: `*`, `1.0.*`, `1.0.0-*`, `1.0.0-beta*`
//! - Range: `[1.0, 2.0)`, `(, 2.0]`, `[1.0, )`, `[1.2.3]`

use super::PackageVersion;
use regex::Regex;
use std::sync::LazyLock;

static FLOATING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d+){0,3}\.)?\*$|^\d+(?:\.\d+){0,3}-[0-9A-Za-z.\-]*\*$").unwrap()
});

/// Marker for floating versions
pub const FLOATING_MARKER: char = '*';

/// A parsed version constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// A single version
    Exact(PackageVersion),
    /// A wildcard constraint resolving to the latest matching version
    Floating {
        pattern: String,
        min: Option<PackageVersion>,
    },
    /// A bracketed range with optional bounds
    Range {
        min: Option<PackageVersion>,
        min_inclusive: bool,
        max: Option<PackageVersion>,
        max_inclusive: bool,
    },
}

impl VersionConstraint {
    /// Parse a constraint string, returning None when it does not follow the grammar
    pub fn parse(constraint: &str) -> Option<Self> {
        let trimmed = constraint.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.contains(FLOATING_MARKER) {
            return parse_floating(trimmed);
        }

        if trimmed.starts_with('[') || trimmed.starts_with('(') {
            return parse_range(trimmed);
        }

        PackageVersion::parse(trimmed).map(VersionConstraint::Exact)
    }

    /// Returns true for wildcard constraints
    pub fn is_floating(&self) -> bool {
        matches!(self, VersionConstraint::Floating { .. })
    }

    /// The version when this is an exact constraint
    pub fn exact(&self) -> Option<&PackageVersion> {
        match self {
            VersionConstraint::Exact(v) => Some(v),
            _ => None,
        }
    }
}

fn parse_floating(trimmed: &str) -> Option<VersionConstraint> {
    if !FLOATING_RE.is_match(trimmed) {
        return None;
    }

    let base = trimmed
        .trim_end_matches(FLOATING_MARKER)
        .trim_end_matches(['.', '-']);
    let min = if base.is_empty() {
        None
    } else {
        Some(PackageVersion::parse(base)?)
    };

    Some(VersionConstraint::Floating {
        pattern: trimmed.to_string(),
        min,
    })
}

fn parse_range(trimmed: &str) -> Option<VersionConstraint> {
    let min_inclusive = trimmed.starts_with('[');
    let max_inclusive = match trimmed.chars().last()? {
        ']' => true,
        ')' => false,
        _ => return None,
    };
    if trimmed.len() < 2 {
        return None;
    }
    let inner = &trimmed[1..trimmed.len() - 1];

    let bound = |s: &str| -> Option<Option<PackageVersion>> {
        let s = s.trim();
        if s.is_empty() {
            Some(None)
        } else {
            PackageVersion::parse(s).map(Some)
        }
    };

    match inner.split_once(',') {
        None => {
            // [1.0] pins a single version
            if !(min_inclusive && max_inclusive) {
                return None;
            }
            let version = bound(inner)??;
            Some(VersionConstraint::Range {
                min: Some(version.clone()),
                min_inclusive: true,
                max: Some(version),
                max_inclusive: true,
            })
        }
        Some((lower, upper)) => {
            if upper.contains(',') {
                return None;
            }
            let min = bound(lower)?;
            let max = bound(upper)?;
            if min.is_none() && max.is_none() {
                return None;
            }
            Some(VersionConstraint::Range {
                min,
                min_inclusive,
                max,
                max_inclusive,
            })
        }
    }
}
