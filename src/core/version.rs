//! Version handling
//!
//! Semver parsing for package versions and requirements, and the apio
//! version parts used to select the remote config.

use semver::{Version, VersionReq};
use thiserror::Error;

/// Current apio version from Cargo.toml
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors related to version parsing
#[derive(Error, Debug, PartialEq)]
pub enum VersionError {
    /// Invalid version constraint format
    #[error("Invalid version constraint '{constraint}': {reason}")]
    InvalidConstraint { constraint: String, reason: String },

    /// Invalid version format
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },
}

/// Parse and validate a semver version string
pub fn parse_version(version: &str) -> Result<Version, VersionError> {
    Version::parse(version).map_err(|e| VersionError::InvalidVersion {
        version: version.to_string(),
        reason: e.to_string(),
    })
}

/// Parse and validate a semver version constraint
pub fn parse_constraint(constraint: &str) -> Result<VersionReq, VersionError> {
    VersionReq::parse(constraint).map_err(|e| VersionError::InvalidConstraint {
        constraint: constraint.to_string(),
        reason: e.to_string(),
    })
}

/// Whether `current` satisfies the requirement `spec`.
///
/// A `current` that is not a valid version never matches. A `spec` that
/// does not parse never matches either; resource validation rejects such
/// requirements before they get here.
pub fn version_matches(current: &str, spec: &str) -> bool {
    match (parse_version(current), parse_constraint(spec)) {
        (Ok(version), Ok(req)) => req.matches(&version),
        _ => false,
    }
}

/// Major and minor parts of the running apio version, as strings
pub fn current_major_minor() -> (String, String) {
    match parse_version(CURRENT_VERSION) {
        Ok(v) => (v.major.to_string(), v.minor.to_string()),
        Err(_) => ("0".to_string(), "0".to_string()),
    }
}
