//! Manifest file writing and textual rewrite operations
//!
//! This module provides:
//! - Targeted `"id": "version"` replacement that preserves formatting and key order
//! - Atomic writes (temp file in the same directory, then rename)
//! - Clearing the read-only attribute before rewriting a file

use crate::error::ManifestError;
use regex::{NoExpand, Regex};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace the version of a dependency declared as `"id": "old"` or
/// `"id": { "version": "old", ... }`, returning None when no occurrence exists
pub fn replace_dependency_version(
    content: &str,
    package: &str,
    old_version: &str,
    new_version: &str,
) -> Option<String> {
    let id = regex::escape(package);
    let old = regex::escape(old_version);
    let replacement = format!("\"{}\"", new_version);

    let string_form = Regex::new(&format!(r#"("{}"\s*:\s*)"{}""#, id, old)).ok()?;
    let object_form = Regex::new(&format!(
        r#"("{}"\s*:\s*\{{[^{{}}]*?"version"\s*:\s*)"{}""#,
        id, old
    ))
    .ok()?;

    let mut matched = false;
    let mut current = content.to_string();
    for re in [&string_form, &object_form] {
        if re.is_match(&current) {
            matched = true;
            current = re
                .replace_all(&current, |caps: &regex::Captures| {
                    format!("{}{}", &caps[1], replacement)
                })
                .into_owned();
        }
    }

    matched.then_some(current)
}

/// Replace every occurrence of `from` with `to`, anywhere in the text
pub fn replace_all_text(content: &str, from: &str, to: &str) -> (String, usize) {
    let count = content.matches(from).count();
    if count == 0 {
        return (content.to_string(), 0);
    }
    match Regex::new(&regex::escape(from)) {
        Ok(re) => (re.replace_all(content, NoExpand(to)).into_owned(), count),
        Err(_) => (content.replace(from, to), count),
    }
}

/// Read a manifest file content
pub fn read_manifest(path: &Path) -> Result<String, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::not_found(path));
    }
    fs::read_to_string(path).map_err(|e| ManifestError::read_error(path, e))
}

/// Write content to a manifest file atomically
pub fn write_manifest(path: &Path, content: &str) -> Result<(), ManifestError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ManifestError::write_error(path, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| ManifestError::write_error(path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| ManifestError::write_error(path, e))?;

    if let Ok(metadata) = fs::metadata(path) {
        let _ = fs::set_permissions(tmp.path(), metadata.permissions());
    }

    tmp.persist(path)
        .map_err(|e| ManifestError::write_error(path, e.error))?;
    Ok(())
}

/// Clear the read-only attribute of a file, if set
pub fn clear_readonly(path: &Path) -> Result<(), ManifestError> {
    let metadata = fs::metadata(path).map_err(|e| ManifestError::read_error(path, e))?;
    let mut permissions = metadata.permissions();
    if permissions.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        fs::set_permissions(path, permissions).map_err(|e| ManifestError::write_error(path, e))?;
    }
    Ok(())
}
