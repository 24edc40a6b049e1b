//! External feed query tool adapter
//!
//! Runs `<tool> list <package> -Prerelease -AllVersions -NonInteractive [-Source <uri>]...`
//! and scans its output line by line (`<id> <version> ...`). The process is
//! killed as soon as a matching line is seen. One attempt per query, no retries.

use crate::domain::PackageVersion;
use crate::error::LookupError;
use crate::lookup::VersionLookup;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

/// Default bound on a single tool invocation
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(120);

/// Version lookup backed by an external process
#[derive(Debug, Clone)]
pub struct ToolVersionLookup {
    tool: PathBuf,
    sources: Vec<String>,
    timeout: Duration,
}

impl ToolVersionLookup {
    /// Create a lookup for the given tool and package sources
    pub fn new(tool: impl Into<PathBuf>, sources: Vec<String>) -> Self {
        Self {
            tool: tool.into(),
            sources,
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Set the bound on a single invocation
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments passed to the tool for a package
    pub fn build_args(&self, package: &str) -> Vec<String> {
        let mut args = vec![
            "list".to_string(),
            package.to_string(),
            "-Prerelease".to_string(),
            "-AllVersions".to_string(),
            "-NonInteractive".to_string(),
        ];
        for source in &self.sources {
            args.push("-Source".to_string());
            args.push(source.clone());
        }
        args
    }

    fn tool_name(&self) -> String {
        self.tool.display().to_string()
    }
}

#[async_trait]
impl VersionLookup for ToolVersionLookup {
    async fn find_version(
        &self,
        package: &str,
        prerelease: &str,
    ) -> Result<Option<PackageVersion>, LookupError> {
        let tool = self.tool_name();
        tracing::debug!(%tool, package, prerelease, "querying package sources");

        let mut child = Command::new(&self.tool)
            .args(self.build_args(package))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LookupError::launch_failed(&tool, package, e))?;

        let stdout = child.stdout.take().ok_or_else(|| LookupError::OutputError {
            tool: tool.clone(),
            package: package.to_string(),
            source: std::io::Error::other("stdout not captured"),
        })?;
        let mut lines = BufReader::new(stdout).lines();

        let scan = async {
            while let Some(line) = lines.next_line().await? {
                if let Some(version) = parse_listing_line(&line, package, prerelease) {
                    return Ok(Some(version));
                }
            }
            Ok::<_, std::io::Error>(None)
        };

        let outcome = match tokio::time::timeout(self.timeout, scan).await {
            Ok(outcome) => outcome,
            Err(_) => {
                stop_tool(&mut child, &tool, package).await;
                return Err(LookupError::timeout(tool, package, self.timeout.as_secs()));
            }
        };

        match outcome {
            Ok(Some(version)) => {
                tracing::debug!(%tool, package, %version, "match found, stopping tool");
                stop_tool(&mut child, &tool, package).await;
                Ok(Some(version))
            }
            Ok(None) => {
                if tokio::time::timeout(self.timeout, child.wait()).await.is_err() {
                    stop_tool(&mut child, &tool, package).await;
                    return Err(LookupError::timeout(tool, package, self.timeout.as_secs()));
                }
                Ok(None)
            }
            Err(e) => {
                stop_tool(&mut child, &tool, package).await;
                Err(LookupError::OutputError {
                    tool,
                    package: package.to_string(),
                    source: e,
                })
            }
        }
    }
}

/// Kill the tool process; a failure only means it already exited
async fn stop_tool(child: &mut Child, tool: &str, package: &str) {
    if let Err(e) = child.kill().await {
        tracing::debug!(%tool, package, error = %e, "failed to stop tool");
    }
}

/// Parse a `<id> <version> ...` listing line, keeping it only when the id is
/// exactly `package` and the prerelease label textually equals `prerelease`
pub fn parse_listing_line(line: &str, package: &str, prerelease: &str) -> Option<PackageVersion> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != package {
        return None;
    }
    let version = PackageVersion::parse(tokens.next()?)?;
    (version.release_label() == prerelease).then_some(version)
}
