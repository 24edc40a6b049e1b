//! Validation pattern rules
//!
//! A rule pairs a regular expression over package ids with exactly one
//! expectation: an exact version or a prerelease label.

use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a rule expects of the packages it matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleExpectation {
    /// The declared version string must equal this version
    Version(String),
    /// Declared prerelease versions must carry this label
    Prerelease(String),
}

/// Rule as written in configuration, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Regular expression matched against package ids
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_prerelease: Option<String>,
}

impl RuleSpec {
    /// Creates a rule expecting an exact version
    pub fn version(pattern: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            expected_version: Some(version.into()),
            expected_prerelease: None,
        }
    }

    /// Creates a rule expecting a prerelease label
    pub fn prerelease(pattern: impl Into<String>, prerelease: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            expected_version: None,
            expected_prerelease: Some(prerelease.into()),
        }
    }
}

/// A validated, compiled rule
#[derive(Debug, Clone)]
pub struct ValidationRule {
    pattern: Regex,
    expectation: RuleExpectation,
}

impl ValidationRule {
    /// Validate and compile a rule specification
    pub fn from_spec(spec: &RuleSpec) -> Result<Self, ConfigError> {
        fn non_empty(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.trim().is_empty())
        }

        let expectation = match (
            non_empty(&spec.expected_version),
            non_empty(&spec.expected_prerelease),
        ) {
            (Some(version), None) => RuleExpectation::Version(version.trim().to_string()),
            (None, Some(prerelease)) => RuleExpectation::Prerelease(prerelease.trim().to_string()),
            (None, None) => {
                return Err(ConfigError::MissingExpectation {
                    pattern: spec.pattern.clone(),
                })
            }
            (Some(version), Some(prerelease)) => {
                return Err(ConfigError::ConflictingExpectation {
                    pattern: spec.pattern.clone(),
                    version: version.to_string(),
                    prerelease: prerelease.to_string(),
                })
            }
        };

        if let RuleExpectation::Version(ref version) = expectation {
            if super::VersionConstraint::parse(version).is_none() {
                return Err(ConfigError::InvalidExpectedVersion {
                    pattern: spec.pattern.clone(),
                    version: version.clone(),
                });
            }
        }

        let pattern = Regex::new(&spec.pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: spec.pattern.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            pattern,
            expectation,
        })
    }

    /// Returns true if the package id matches this rule
    pub fn matches(&self, package_id: &str) -> bool {
        self.pattern.is_match(package_id)
    }

    /// The id pattern as written
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn expectation(&self) -> &RuleExpectation {
        &self.expectation
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expectation {
            RuleExpectation::Version(v) => write!(f, "{} => version {}", self.pattern(), v),
            RuleExpectation::Prerelease(p) => write!(f, "{} => prerelease {}", self.pattern(), p),
        }
    }
}

/// Compile every rule, keeping the valid ones and collecting configuration errors
pub fn compile_rules(specs: &[RuleSpec]) -> (Vec<ValidationRule>, Vec<ConfigError>) {
    let mut rules = Vec::new();
    let mut errors = Vec::new();
    for spec in specs {
        match ValidationRule::from_spec(spec) {
            Ok(rule) => rules.push(rule),
            Err(e) => errors.push(e),
        }
    }
    (rules, errors)
}
