//! depvet - Dependency restore and version policy validator library
//!
//! This library checks `project.json` manifests against:
//! - The versions their restore recorded in `project.lock.json`
//! - Ordered pattern rules for exact versions and prerelease labels
//! - Floating-version and package id casing policies
//!
//! Fixable problems can be rewritten in place instead of reported.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod lockfile;
pub mod lookup;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod validate;
