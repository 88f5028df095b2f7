//! Apio directory layout
//!
//! Provides the apio home directory, the packages directory and the
//! profile path.
//!
//! Environment variables can override default directories:
//! - `APIO_HOME` - Override the apio home directory (default `~/.apio`)
//! - `APIO_PACKAGES_DIR` - Override the packages directory

use std::path::{Path, PathBuf};

use crate::config::defaults::{HOME_DIR_NAME, PACKAGES_DIR_NAME, PROFILE_FILE};
use crate::config::env::lookup;

/// Directory provider for apio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApioDirs {
    home_dir: PathBuf,
    packages_dir: PathBuf,
}

impl ApioDirs {
    /// Create a new `ApioDirs` instance
    ///
    /// Checks environment variables first, then falls back to `~/.apio`.
    #[must_use]
    pub fn new() -> Self {
        let home_dir = lookup("APIO_HOME").map_or_else(Self::default_home_dir, PathBuf::from);
        let packages_dir = lookup("APIO_PACKAGES_DIR")
            .map_or_else(|| home_dir.join(PACKAGES_DIR_NAME), PathBuf::from);
        Self {
            home_dir,
            packages_dir,
        }
    }

    /// Use an explicit home directory, packages under `<home>/packages`
    #[must_use]
    pub fn with_home(home_dir: &Path) -> Self {
        Self {
            home_dir: home_dir.to_path_buf(),
            packages_dir: home_dir.join(PACKAGES_DIR_NAME),
        }
    }

    /// Get the apio home directory path
    #[must_use]
    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    /// Get the packages directory path
    ///
    /// Each installed package lives in a subdirectory named after its id.
    #[must_use]
    pub fn packages_dir(&self) -> &Path {
        &self.packages_dir
    }

    /// Get the profile file path
    #[must_use]
    pub fn profile_path(&self) -> PathBuf {
        self.home_dir.join(PROFILE_FILE)
    }

    /// Install directory of a package
    #[must_use]
    pub fn package_dir(&self, package_id: &str) -> PathBuf {
        self.packages_dir.join(package_id)
    }

    fn default_home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(HOME_DIR_NAME)
    }
}

impl Default for ApioDirs {
    fn default() -> Self {
        Self::new()
    }
}
