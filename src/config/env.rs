//! Environment variables
//!
//! Apio only reads the variables listed in [`ApioEnvVar`]. Looking up any
//! other name through [`lookup`] is a programming error.

use std::env;

/// Environment variables apio reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApioEnvVar {
    /// Overrides the apio home directory (default `~/.apio`)
    Home,
    /// Overrides the packages directory (default `<home>/packages`)
    PackagesDir,
    /// Overrides the detected platform id
    Platform,
    /// Overrides the remote config url from `config.jsonc`
    RemoteConfigUrl,
}

impl ApioEnvVar {
    /// All variables, in documentation order
    pub const ALL: [Self; 4] = [
        Self::Home,
        Self::PackagesDir,
        Self::Platform,
        Self::RemoteConfigUrl,
    ];

    /// Variable name
    pub fn name(self) -> &'static str {
        match self {
            Self::Home => "APIO_HOME",
            Self::PackagesDir => "APIO_PACKAGES_DIR",
            Self::Platform => "APIO_PLATFORM",
            Self::RemoteConfigUrl => "APIO_REMOTE_CONFIG_URL",
        }
    }

    /// Find a variable by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|var| var.name() == name)
    }

    /// Current non-empty value
    pub fn get(self) -> Option<String> {
        env::var(self.name()).ok().filter(|v| !v.is_empty())
    }
}

/// Look up an apio environment variable by name.
///
/// # Panics
///
/// Panics if `name` is not one of [`ApioEnvVar::ALL`].
pub fn lookup(name: &str) -> Option<String> {
    let var = ApioEnvVar::from_name(name);
    assert!(var.is_some(), "[Internal] unknown apio env var '{name}'");
    var.and_then(ApioEnvVar::get)
}
