//! Configuration file loading
//!
//! Settings come from an optional TOML file (`depvet.toml` by default) and
//! are then overlaid with command line flags. Flags can only switch a policy
//! on; sources given on the command line are appended to the file's list.

use crate::cli::CliArgs;
use crate::domain::RuleSpec;
use crate::error::ConfigError;
use crate::lookup::DEFAULT_LOOKUP_TIMEOUT;
use crate::validate::PolicyOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "depvet.toml";

/// Effective settings for a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub prohibit_floating_dependencies: bool,
    pub prohibit_case_mismatch: bool,
    /// Fix mode: rewrite manifests instead of reporting
    pub update_invalid_dependencies: bool,
    pub package_sources: Vec<String>,
    pub lookup_tool: Option<PathBuf>,
    pub lookup_timeout_secs: Option<u64>,
    /// Ordered validation rules
    pub rules: Vec<RuleSpec>,
}

impl Config {
    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, &content)
    }

    /// Parse configuration content
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load the explicit file, or the default file when it exists, or defaults
    pub fn discover(explicit: Option<&Path>, base_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = base_dir.join(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            tracing::debug!(path = %default_path.display(), "using default configuration file");
            return Self::load(&default_path);
        }
        Ok(Self::default())
    }

    /// Overlay command line flags
    pub fn apply_cli(&mut self, args: &CliArgs) {
        self.prohibit_floating_dependencies |= args.prohibit_floating;
        self.prohibit_case_mismatch |= args.prohibit_case_mismatch;
        self.update_invalid_dependencies |= args.fix;

        for source in &args.sources {
            if !self.package_sources.contains(source) {
                self.package_sources.push(source.clone());
            }
        }
        if let Some(tool) = &args.lookup_tool {
            self.lookup_tool = Some(tool.clone());
        }
        if let Some(timeout) = args.lookup_timeout {
            self.lookup_timeout_secs = Some(timeout.as_secs());
        }
    }

    pub fn fix_mode(&self) -> bool {
        self.update_invalid_dependencies
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_LOOKUP_TIMEOUT)
    }

    pub fn policy_options(&self) -> PolicyOptions {
        PolicyOptions {
            prohibit_floating: self.prohibit_floating_dependencies,
            prohibit_case_mismatch: self.prohibit_case_mismatch,
            fix: self.update_invalid_dependencies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
prohibit_floating_dependencies = true
update_invalid_dependencies = false
package_sources = ["https://api.nuget.org/v3/index.json"]
lookup_tool = "nuget"
lookup_timeout_secs = 30

[[rules]]
pattern = "^Microsoft\\."
expected_prerelease = "rc2-24027"

[[rules]]
pattern = "^Newtonsoft\\.Json$"
expected_version = "9.0.1"
"#;

    #[test]
    fn test_parse_config() {
        let config = Config::parse(Path::new("depvet.toml"), SAMPLE).unwrap();
        assert!(config.prohibit_floating_dependencies);
        assert!(!config.prohibit_case_mismatch);
        assert!(!config.fix_mode());
        assert_eq!(config.package_sources.len(), 1);
        assert_eq!(config.lookup_tool, Some(PathBuf::from("nuget")));
        assert_eq!(config.lookup_timeout(), Duration::from_secs(30));
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0], RuleSpec::prerelease("^Microsoft\\.", "rc2-24027"));
        assert_eq!(config.rules[1], RuleSpec::version("^Newtonsoft\\.Json$", "9.0.1"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse(Path::new("depvet.toml"), "").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.lookup_timeout(), DEFAULT_LOOKUP_TIMEOUT);
    }

    #[test]
    fn test_parse_unknown_key() {
        let result = Config::parse(Path::new("depvet.toml"), "prohibit_everything = true");
        assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/depvet.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_discover() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::discover(None, dir.path()).unwrap(), Config::default());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), SAMPLE).unwrap();
        let config = Config::discover(None, dir.path()).unwrap();
        assert_eq!(config.rules.len(), 2);

        let other = dir.path().join("ci.toml");
        std::fs::write(&other, "prohibit_case_mismatch = true").unwrap();
        let config = Config::discover(Some(&other), dir.path()).unwrap();
        assert!(config.prohibit_case_mismatch);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_apply_cli() {
        let mut config = Config::parse(Path::new("depvet.toml"), SAMPLE).unwrap();
        let args = CliArgs::parse_from([
            "depvet",
            "--fix",
            "--prohibit-case-mismatch",
            "--source",
            "https://api.nuget.org/v3/index.json",
            "--source",
            "https://internal/feed",
            "--lookup-timeout",
            "5",
        ]);
        config.apply_cli(&args);

        assert!(config.fix_mode());
        assert!(config.prohibit_case_mismatch);
        assert!(config.prohibit_floating_dependencies);
        assert_eq!(
            config.package_sources,
            vec!["https://api.nuget.org/v3/index.json", "https://internal/feed"]
        );
        assert_eq!(config.lookup_tool, Some(PathBuf::from("nuget")));
        assert_eq!(config.lookup_timeout(), Duration::from_secs(5));

        let options = config.policy_options();
        assert!(options.fix && options.prohibit_floating && options.prohibit_case_mismatch);
    }
}
