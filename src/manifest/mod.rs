//! Manifest file detection, parsing and rewriting
//!
//! This module provides functionality to:
//! - Detect `project.json` manifests under a set of paths
//! - Parse declared dependencies (top-level and per target framework)
//! - Rewrite declared versions in place while preserving formatting

mod detector;
mod writer;

pub use detector::{detect_manifests, is_manifest_file};
pub use writer::{
    clear_readonly, read_manifest, replace_all_text, replace_dependency_version, write_manifest,
};

use crate::domain::VersionConstraint;
use crate::error::ManifestError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// A declared dependency: package id and version-constraint string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub id: String,
    pub version: String,
}

impl PackageEntry {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

/// One `dependencies` object of a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySection {
    /// Target framework, None for the top-level section
    pub framework: Option<String>,
    /// Declared dependencies in file order
    pub packages: Vec<PackageEntry>,
}

impl DependencySection {
    /// Look up the declared version of a package
    pub fn get(&self, id: &str) -> Option<&str> {
        self.packages
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.version.as_str())
    }
}

/// In-memory representation of a `project.json` file
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    content: String,
    sections: Vec<DependencySection>,
    modified: bool,
}

impl Manifest {
    /// Read and parse a manifest from disk
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = read_manifest(path)?;
        Self::parse(path, content)
    }

    /// Parse manifest content
    pub fn parse(path: impl Into<PathBuf>, content: impl Into<String>) -> Result<Self, ManifestError> {
        let path = path.into();
        let content = content.into();

        let json: Value = serde_json::from_str(&content)
            .map_err(|e| ManifestError::json_parse_error(&path, e.to_string()))?;
        let root = json
            .as_object()
            .ok_or_else(|| ManifestError::json_parse_error(&path, "root is not an object"))?;

        let mut sections = Vec::new();

        if let Some(deps) = root.get("dependencies").and_then(Value::as_object) {
            sections.push(parse_section(&path, None, deps)?);
        }

        if let Some(frameworks) = root.get("frameworks").and_then(Value::as_object) {
            for (framework, body) in frameworks {
                if let Some(deps) = body.get("dependencies").and_then(Value::as_object) {
                    sections.push(parse_section(&path, Some(framework.clone()), deps)?);
                }
            }
        }

        tracing::debug!(
            path = %path.display(),
            sections = sections.len(),
            "parsed manifest"
        );

        Ok(Self {
            path,
            content,
            sections,
            modified: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file text, including unsaved rewrites
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sections(&self) -> &[DependencySection] {
        &self.sections
    }

    /// Iterate over every declared dependency in file order
    pub fn entries(&self) -> impl Iterator<Item = &PackageEntry> {
        self.sections.iter().flat_map(|s| s.packages.iter())
    }

    pub fn package_count(&self) -> usize {
        self.sections.iter().map(|s| s.packages.len()).sum()
    }

    /// Returns true when the manifest has unsaved rewrites
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Rewrite every declaration of `id` at `old_version` to `new_version`
    pub fn set_version(
        &mut self,
        id: &str,
        old_version: &str,
        new_version: &str,
    ) -> Result<(), ManifestError> {
        if VersionConstraint::parse(new_version).is_none() {
            return Err(ManifestError::invalid_version_spec(
                &self.path,
                new_version,
                "replacement does not parse as a version constraint",
            ));
        }

        let updated = replace_dependency_version(&self.content, id, old_version, new_version)
            .ok_or_else(|| ManifestError::entry_not_found(&self.path, id, old_version))?;

        for entry in self
            .sections
            .iter_mut()
            .flat_map(|s| s.packages.iter_mut())
            .filter(|p| p.id == id && p.version == old_version)
        {
            entry.version = new_version.to_string();
        }

        self.content = updated;
        self.modified = true;
        Ok(())
    }

    /// Persist pending rewrites; does nothing when unmodified
    pub fn save(&mut self) -> Result<bool, ManifestError> {
        if !self.modified {
            return Ok(false);
        }
        write_manifest(&self.path, &self.content)?;
        self.modified = false;
        Ok(true)
    }
}

fn parse_section(
    path: &Path,
    framework: Option<String>,
    deps: &Map<String, Value>,
) -> Result<DependencySection, ManifestError> {
    let mut packages = Vec::new();

    for (id, value) in deps {
        let version = match value {
            Value::String(s) => s.as_str(),
            Value::Object(obj) => match obj.get("version").and_then(Value::as_str) {
                Some(v) => v,
                // Project references carry no version
                None => continue,
            },
            _ => {
                return Err(ManifestError::invalid_version_spec(
                    path,
                    value.to_string(),
                    format!("unsupported declaration for '{}'", id),
                ))
            }
        };

        if VersionConstraint::parse(version).is_none() {
            return Err(ManifestError::invalid_version_spec(
                path,
                version,
                format!("cannot parse version of '{}'", id),
            ));
        }

        packages.push(PackageEntry::new(id.clone(), version));
    }

    Ok(DependencySection {
        framework,
        packages,
    })
}
