//! Profile store
//!
//! `profile.json` in the apio home records installed package versions and
//! user preferences. It is loaded once per invocation and rewritten after
//! every mutation. There is no file locking; concurrent apio processes
//! race and the last write wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ProfileError;
use crate::infra::filesystem;

/// Installed package entry of the profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstalledPackageRecord {
    pub version: String,
}

/// User preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<bool>,
}

/// On-disk profile layout
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ProfileData {
    #[serde(default)]
    pub installed_packages: BTreeMap<String, InstalledPackageRecord>,
    #[serde(default)]
    pub preferences: Preferences,
}

/// The profile file and its contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    path: PathBuf,
    data: ProfileData,
}

impl Profile {
    /// Load the profile. A missing file yields an empty profile.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let data = if path.is_file() {
            let text = filesystem::read_file(path).map_err(|e| ProfileError::Read {
                path: path.to_path_buf(),
                error: e.reason().to_string(),
            })?;
            serde_json::from_str(&text).map_err(|e| ProfileError::Parse {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?
        } else {
            debug!("No profile at {}, starting empty", path.display());
            ProfileData::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &ProfileData {
        &self.data
    }

    /// Recorded version of an installed package
    pub fn installed_version(&self, package_id: &str) -> Option<&str> {
        self.data
            .installed_packages
            .get(package_id)
            .map(|record| record.version.as_str())
    }

    /// Ids of every package with a record
    pub fn installed_ids(&self) -> impl Iterator<Item = &str> {
        self.data.installed_packages.keys().map(String::as_str)
    }

    /// Record a package installation and save.
    pub fn add_package(&mut self, package_id: &str, version: &str) -> Result<(), ProfileError> {
        self.data.installed_packages.insert(
            package_id.to_string(),
            InstalledPackageRecord {
                version: version.to_string(),
            },
        );
        self.save()
    }

    /// Drop a package record and save. Missing records are ignored.
    pub fn remove_package(&mut self, package_id: &str) -> Result<(), ProfileError> {
        if self.data.installed_packages.remove(package_id).is_some() {
            self.save()?;
        }
        Ok(())
    }

    /// Write the profile back to disk.
    pub fn save(&self) -> Result<(), ProfileError> {
        let write_err = |error: String| ProfileError::Write {
            path: self.path.clone(),
            error,
        };
        let text =
            serde_json::to_string_pretty(&self.data).map_err(|e| write_err(e.to_string()))?;
        filesystem::write_file(&self.path, &(text + "\n"))
            .map_err(|e| write_err(e.reason().to_string()))?;
        debug!("Saved profile {}", self.path.display());
        Ok(())
    }
}
