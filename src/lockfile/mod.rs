//! Lockfile (`project.lock.json`) model
//!
//! The lockfile records the outcome of a restore:
//! - `libraries`: keys of the form `name/version`, one per resolved package
//! - `projectFileDependencyGroups`: requests per target framework, each an
//!   `"id operator version"` string; the empty key is the framework-agnostic group
//!
//! Lockfiles are only ever read.

use crate::error::LockfileError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Lockfile suffix paired with the manifest suffix
pub const LOCKFILE_SUFFIX: &str = ".lock.json";
const MANIFEST_SUFFIX: &str = ".json";

/// A resolved (name, version) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLibrary {
    pub name: String,
    pub version: String,
}

/// A requested dependency from a framework group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRequest {
    pub id: String,
    /// Comparison operator as written, usually `>=`
    pub operator: String,
    pub version: String,
}

impl DependencyRequest {
    /// Parse an `"id operator version"` request string
    pub fn parse(request: &str) -> Option<Self> {
        let tokens: Vec<&str> = request.split_whitespace().collect();
        if tokens.len() < 3 {
            return None;
        }
        Some(Self {
            id: tokens[0].to_string(),
            operator: tokens[1].to_string(),
            version: tokens[2].to_string(),
        })
    }
}

/// Requests for one target framework
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    /// Target framework name, empty for the framework-agnostic group
    pub framework: String,
    /// Raw request strings in file order
    pub requests: Vec<String>,
}

impl DependencyGroup {
    /// Human-readable framework name
    pub fn display_name(&self) -> &str {
        if self.framework.is_empty() {
            "(all frameworks)"
        } else {
            &self.framework
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawLockfile {
    #[serde(default)]
    libraries: serde_json::Map<String, Value>,
    #[serde(default, rename = "projectFileDependencyGroups")]
    groups: serde_json::Map<String, Value>,
}

/// In-memory representation of a lockfile
#[derive(Debug, Clone)]
pub struct Lockfile {
    path: PathBuf,
    libraries: Vec<ResolvedLibrary>,
    groups: Vec<DependencyGroup>,
}

impl Lockfile {
    /// Read and parse a lockfile from disk
    pub fn load(path: &Path) -> Result<Self, LockfileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LockfileError::read_error(path, e))?;
        Self::parse(path, &content)
    }

    /// Parse lockfile content
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self, LockfileError> {
        let path = path.into();
        let raw: RawLockfile = serde_json::from_str(content)
            .map_err(|e| LockfileError::json_parse_error(&path, e.to_string()))?;

        let mut libraries = Vec::with_capacity(raw.libraries.len());
        for key in raw.libraries.keys() {
            let (name, version) = key
                .split_once('/')
                .filter(|(n, v)| !n.is_empty() && !v.is_empty())
                .ok_or_else(|| LockfileError::MalformedLibrary {
                    path: path.clone(),
                    key: key.clone(),
                })?;
            libraries.push(ResolvedLibrary {
                name: name.to_string(),
                version: version.to_string(),
            });
        }

        let mut groups = Vec::with_capacity(raw.groups.len());
        for (framework, requests) in &raw.groups {
            let requests = requests
                .as_array()
                .ok_or_else(|| {
                    LockfileError::json_parse_error(
                        &path,
                        format!("dependency group '{}' is not an array", framework),
                    )
                })?
                .iter()
                .filter_map(|r| r.as_str().map(str::to_string))
                .collect();
            groups.push(DependencyGroup {
                framework: framework.clone(),
                requests,
            });
        }

        tracing::debug!(
            path = %path.display(),
            libraries = libraries.len(),
            groups = groups.len(),
            "parsed lockfile"
        );

        Ok(Self {
            path,
            libraries,
            groups,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn libraries(&self) -> &[ResolvedLibrary] {
        &self.libraries
    }

    pub fn groups(&self) -> &[DependencyGroup] {
        &self.groups
    }

    /// Map of resolved library name to its resolved versions (exact name match)
    pub fn resolved_versions(&self) -> HashMap<&str, Vec<&str>> {
        let mut map: HashMap<&str, Vec<&str>> = HashMap::new();
        for library in &self.libraries {
            map.entry(library.name.as_str())
                .or_default()
                .push(library.version.as_str());
        }
        map
    }
}

/// `project.lock.json` → `project.json`, `x.project.lock.json` → `x.project.json`
pub fn manifest_path_for(lockfile: &Path) -> Option<PathBuf> {
    let name = lockfile.file_name()?.to_str()?;
    let stem = name.strip_suffix(LOCKFILE_SUFFIX)?;
    if stem.is_empty() {
        return None;
    }
    Some(lockfile.with_file_name(format!("{}{}", stem, MANIFEST_SUFFIX)))
}

/// `project.json` → `project.lock.json`, `x.project.json` → `x.project.lock.json`
pub fn lockfile_path_for(manifest: &Path) -> Option<PathBuf> {
    let name = manifest.file_name()?.to_str()?;
    let stem = name.strip_suffix(MANIFEST_SUFFIX)?;
    if stem.is_empty() {
        return None;
    }
    Some(manifest.with_file_name(format!("{}{}", stem, LOCKFILE_SUFFIX)))
}
