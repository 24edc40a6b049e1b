//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: Issues with project.json parsing and rewriting
//! - LockfileError: Issues with project.lock.json parsing
//! - ConfigError: Issues with the rule set and configuration file
//! - LookupError: Issues with the external version-query tool
//! - IoError: File system operation failures

use std::path::PathBuf;
use thiserror::Error;

/// Fatal startup errors
///
/// Failures while validating are reported as diagnostics instead.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors related to manifest file operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("manifest file not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write manifest file
    #[error("failed to write manifest file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },

    /// Invalid version constraint
    #[error("invalid version specification '{spec}' in {path}: {message}")]
    InvalidVersionSpec {
        path: PathBuf,
        spec: String,
        message: String,
    },

    /// The `"id": "version"` text to rewrite was not found
    #[error("dependency \"{package}\": \"{version}\" not found in {path}")]
    EntryNotFound {
        path: PathBuf,
        package: String,
        version: String,
    },
}

/// Errors related to lockfile parsing
#[derive(Error, Debug)]
pub enum LockfileError {
    /// Failed to read lockfile
    #[error("failed to read lockfile {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },

    /// A library key that is not `name/version`
    #[error("malformed library entry '{key}' in {path}")]
    MalformedLibrary { path: PathBuf, key: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read configuration file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("failed to parse TOML in {path}: {message}")]
    TomlParseError { path: PathBuf, message: String },

    /// Rule pattern is not a valid regular expression
    #[error("invalid rule pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Rule specifies neither an expected version nor an expected prerelease
    #[error("rule '{pattern}' must specify either an expected version or an expected prerelease")]
    MissingExpectation { pattern: String },

    /// Rule specifies both an expected version and an expected prerelease
    #[error("rule '{pattern}' cannot specify both an expected version ('{version}') and an expected prerelease ('{prerelease}')")]
    ConflictingExpectation {
        pattern: String,
        version: String,
        prerelease: String,
    },

    /// Expected version in a rule is not a valid version
    #[error("rule '{pattern}' has invalid expected version '{version}'")]
    InvalidExpectedVersion { pattern: String, version: String },
}

/// Errors related to the external version lookup
#[derive(Error, Debug)]
pub enum LookupError {
    /// The tool process could not be started
    #[error("failed to launch '{tool}' for package '{package}': {source}")]
    LaunchFailed {
        tool: String,
        package: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the tool output failed
    #[error("failed to read output of '{tool}' for package '{package}': {source}")]
    OutputError {
        tool: String,
        package: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool did not finish in time
    #[error("'{tool}' timed out after {seconds}s while listing package '{package}'")]
    Timeout {
        tool: String,
        package: String,
        seconds: u64,
    },

    /// No lookup tool configured
    #[error("no version lookup tool configured, cannot query versions of '{package}'")]
    NotConfigured { package: String },
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// Path not found
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    /// Permission denied
    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Generic IO error
    #[error("IO error at {path}: {source}")]
    Generic {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ManifestError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ManifestError::NotFound { path: path.into() }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new JsonParseError
    pub fn json_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::JsonParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidVersionSpec error
    pub fn invalid_version_spec(
        path: impl Into<PathBuf>,
        spec: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ManifestError::InvalidVersionSpec {
            path: path.into(),
            spec: spec.into(),
            message: message.into(),
        }
    }

    /// Creates a new EntryNotFound error
    pub fn entry_not_found(
        path: impl Into<PathBuf>,
        package: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        ManifestError::EntryNotFound {
            path: path.into(),
            package: package.into(),
            version: version.into(),
        }
    }
}

impl LockfileError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LockfileError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new JsonParseError
    pub fn json_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        LockfileError::JsonParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl LookupError {
    /// Creates a new LaunchFailed error
    pub fn launch_failed(
        tool: impl Into<String>,
        package: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LookupError::LaunchFailed {
            tool: tool.into(),
            package: package.into(),
            source,
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(tool: impl Into<String>, package: impl Into<String>, seconds: u64) -> Self {
        LookupError::Timeout {
            tool: tool.into(),
            package: package.into(),
            seconds,
        }
    }
}

impl IoError {
    /// Creates an IO error, classifying common error kinds
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => IoError::PermissionDenied { path },
            _ => IoError::Generic { path, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_error_not_found() {
        let err = ManifestError::not_found("/path/to/project.json");
        let msg = format!("{}", err);
        assert!(msg.contains("manifest file not found"));
        assert!(msg.contains("project.json"));
    }

    #[test]
    fn test_manifest_error_json_parse() {
        let err = ManifestError::json_parse_error("/path/to/project.json", "unexpected token");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to parse JSON"));
        assert!(msg.contains("unexpected token"));
    }

    #[test]
    fn test_manifest_error_entry_not_found() {
        let err = ManifestError::entry_not_found("/p/project.json", "Pkg.A", "1.0.0-beta");
        let msg = format!("{}", err);
        assert!(msg.contains("\"Pkg.A\": \"1.0.0-beta\""));
    }

    #[test]
    fn test_config_error_missing_expectation() {
        let err = ConfigError::MissingExpectation {
            pattern: "^Pkg\\.".to_string(),
        };
        assert!(err.to_string().contains("must specify either"));
    }

    #[test]
    fn test_config_error_conflicting_expectation() {
        let err = ConfigError::ConflictingExpectation {
            pattern: "^Pkg".to_string(),
            version: "1.0.0".to_string(),
            prerelease: "beta".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cannot specify both"));
        assert!(msg.contains("1.0.0"));
        assert!(msg.contains("beta"));
    }

    #[test]
    fn test_lookup_error_timeout() {
        let err = LookupError::timeout("nuget", "Pkg.A", 30);
        let msg = err.to_string();
        assert!(msg.contains("timed out after 30s"));
        assert!(msg.contains("Pkg.A"));
    }

    #[test]
    fn test_io_error_from_io_classifies_kind() {
        let err = IoError::from_io(
            "/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, IoError::NotFound { .. }));

        let err = IoError::from_io(
            "/locked",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, IoError::PermissionDenied { .. }));
    }

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::MissingExpectation {
            pattern: "^Pkg\\.".to_string(),
        }
        .into();
        assert!(app_err.to_string().contains("^Pkg\\."));
    }

    #[test]
    fn test_app_error_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let app_err: AppError = IoError::from_io("/missing", io).into();
        assert!(matches!(app_err, AppError::Io(IoError::NotFound { .. })));
    }
}
