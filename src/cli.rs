//! CLI argument parsing module for depvet

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// Parse a timeout in seconds: `90`, `90s` or `2m`
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty timeout string".to_string());
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else {
        (s, 1)
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in timeout: {}", num_str))?;
    if num == 0 {
        return Err("timeout must be greater than zero".to_string());
    }

    Ok(Duration::from_secs(num * multiplier))
}

/// Dependency restore and version policy validator
#[derive(Parser, Debug, Clone)]
#[command(
    name = "depvet",
    version,
    about = "Dependency restore and version policy validator for project.json manifests"
)]
pub struct CliArgs {
    /// Manifest files or directories to scan (default: current directory)
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Configuration file (default: depvet.toml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    // Policy options
    /// Rewrite manifests instead of reporting fixable problems
    #[arg(long)]
    pub fix: bool,

    /// Report floating (`*`) dependency versions as errors
    #[arg(long)]
    pub prohibit_floating: bool,

    /// Report package ids whose casing differs between manifests
    #[arg(long)]
    pub prohibit_case_mismatch: bool,

    /// Skip validation against lockfiles
    #[arg(long)]
    pub skip_restore: bool,

    /// Skip rule, floating and casing checks
    #[arg(long)]
    pub skip_policy: bool,

    // Lookup options
    /// Package source passed to the lookup tool (can be specified multiple times)
    #[arg(long = "source", value_name = "URI", action = ArgAction::Append)]
    pub sources: Vec<String>,

    /// External tool used to list available package versions
    #[arg(long, value_name = "PATH")]
    pub lookup_tool: Option<PathBuf>,

    /// Bound on a single lookup (e.g., 90, 90s, 2m)
    #[arg(long, value_name = "SECS", value_parser = parse_timeout)]
    pub lookup_timeout: Option<Duration>,

    // Output options
    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - errors only
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Whether the progress display should be shown
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["depvet"]);
        assert_eq!(args.paths, vec![PathBuf::from(".")]);
        assert!(args.config.is_none());
        assert!(!args.fix);
        assert!(!args.prohibit_floating);
        assert!(!args.prohibit_case_mismatch);
        assert!(!args.skip_restore);
        assert!(!args.skip_policy);
        assert!(args.sources.is_empty());
        assert!(args.lookup_tool.is_none());
        assert!(args.lookup_timeout.is_none());
        assert!(!args.json);
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(args.show_progress());
    }

    #[test]
    fn test_multiple_paths() {
        let args = CliArgs::parse_from(["depvet", "src/a/project.json", "src/b"]);
        assert_eq!(
            args.paths,
            vec![PathBuf::from("src/a/project.json"), PathBuf::from("src/b")]
        );
    }

    #[test]
    fn test_config_flag() {
        let args = CliArgs::parse_from(["depvet", "-c", "ci.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("ci.toml")));

        let args = CliArgs::parse_from(["depvet", "--config", "ci.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("ci.toml")));
    }

    #[test]
    fn test_policy_flags() {
        let args = CliArgs::parse_from([
            "depvet",
            "--fix",
            "--prohibit-floating",
            "--prohibit-case-mismatch",
        ]);
        assert!(args.fix);
        assert!(args.prohibit_floating);
        assert!(args.prohibit_case_mismatch);
    }

    #[test]
    fn test_skip_flags() {
        let args = CliArgs::parse_from(["depvet", "--skip-restore"]);
        assert!(args.skip_restore);
        assert!(!args.skip_policy);

        let args = CliArgs::parse_from(["depvet", "--skip-policy"]);
        assert!(args.skip_policy);
    }

    #[test]
    fn test_sources_multiple() {
        let args = CliArgs::parse_from([
            "depvet",
            "--source",
            "https://a/index.json",
            "--source",
            "https://b/index.json",
        ]);
        assert_eq!(args.sources, vec!["https://a/index.json", "https://b/index.json"]);
    }

    #[test]
    fn test_lookup_options() {
        let args = CliArgs::parse_from([
            "depvet",
            "--lookup-tool",
            "/usr/bin/nuget",
            "--lookup-timeout",
            "2m",
        ]);
        assert_eq!(args.lookup_tool, Some(PathBuf::from("/usr/bin/nuget")));
        assert_eq!(args.lookup_timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_output_flags() {
        let args = CliArgs::parse_from(["depvet", "--json"]);
        assert!(args.json);
        assert!(!args.show_progress());

        let args = CliArgs::parse_from(["depvet", "-q"]);
        assert!(args.quiet);
        assert!(!args.show_progress());
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_timeout("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_timeout("3m").unwrap(), Duration::from_secs(180));
    }

    #[test]
    fn test_parse_timeout_invalid() {
        assert!(parse_timeout("").is_err());
        assert!(parse_timeout("abc").is_err());
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("10h").is_err());
    }
}
