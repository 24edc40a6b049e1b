//! Manifest file detection
//!
//! Features:
//! - Accepts explicit manifest files and directories
//! - Walks directories recursively for `project.json` and `*.project.json`
//! - Skips build output, package and hidden directories

use std::path::{Path, PathBuf};

/// Manifest file name
pub const MANIFEST_FILENAME: &str = "project.json";

/// Directories never searched for manifests
const SKIPPED_DIRS: &[&str] = &["bin", "obj", "node_modules", "packages"];

/// Returns true if the file name denotes a manifest
pub fn is_manifest_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n == MANIFEST_FILENAME || n.ends_with(".project.json"))
        .unwrap_or(false)
}

/// Detect all manifest files under the given paths
///
/// Explicit files are returned as given, even if they do not exist, so that
/// the caller reports them as errors. Directory results are sorted.
pub fn detect_manifests(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut manifests = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            walk(path, &mut found);
            found.sort();
            for manifest in found {
                if !manifests.contains(&manifest) {
                    manifests.push(manifest);
                }
            }
        } else if !manifests.contains(path) {
            manifests.push(path.clone());
        }
    }

    manifests
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        tracing::debug!(dir = %dir.display(), "cannot read directory");
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()) {
                continue;
            }
            walk(&path, found);
        } else if is_manifest_file(&path) {
            found.push(path);
        }
    }
}
