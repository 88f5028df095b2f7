//! Package state
//!
//! Classifies the platform packages against the profile and the packages
//! directory, and gates build commands on their required packages.
//!
//! A package is installed when it has both a profile record and a
//! directory, uninstalled when it has neither, and broken when it has only
//! one of them. Records of packages that do not apply to this platform are
//! orphan packages; other entries of the packages directory are orphan
//! directories and files.

use std::path::Path;
use tracing::debug;

use super::profile::Profile;
use super::resources::{ApioResources, PackageDescriptor, ResourceTable};
use super::version::version_matches;
use crate::error::{FilesystemError, PackageError};
use crate::infra::filesystem::{list_dir, EntryKind};

/// Result of scanning the installed packages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageScanResult {
    pub installed_ids: Vec<String>,
    pub uninstalled_ids: Vec<String>,
    pub broken_ids: Vec<String>,
    pub orphan_package_ids: Vec<String>,
    pub orphan_dir_names: Vec<String>,
    pub orphan_file_names: Vec<String>,
}

impl PackageScanResult {
    /// Problems `apio packages --fix` would repair
    pub fn num_errors(&self) -> usize {
        self.broken_ids.len()
            + self.orphan_package_ids.len()
            + self.orphan_dir_names.len()
            + self.orphan_file_names.len()
    }

    pub fn is_installed(&self, package_id: &str) -> bool {
        self.installed_ids.iter().any(|id| id == package_id)
    }
}

/// Scan the packages directory and profile.
pub fn scan_packages(
    packages_dir: &Path,
    platform_packages: &ResourceTable<PackageDescriptor>,
    profile: &Profile,
) -> Result<PackageScanResult, FilesystemError> {
    let mut result = PackageScanResult::default();

    for id in platform_packages.keys() {
        let has_record = profile.installed_version(id).is_some();
        let has_dir = packages_dir.join(id).is_dir();
        match (has_record, has_dir) {
            (true, true) => result.installed_ids.push(id.clone()),
            (false, false) => result.uninstalled_ids.push(id.clone()),
            _ => {
                debug!("Package '{id}' is broken (record: {has_record}, dir: {has_dir})");
                result.broken_ids.push(id.clone());
            }
        }
    }

    for id in profile.installed_ids() {
        if !platform_packages.contains_key(id) {
            result.orphan_package_ids.push(id.to_string());
        }
    }

    for (name, kind) in list_dir(packages_dir)? {
        if kind == EntryKind::Dir && platform_packages.contains_key(&name) {
            continue;
        }
        match kind {
            EntryKind::Dir => {
                if !result.orphan_package_ids.contains(&name) {
                    result.orphan_dir_names.push(name);
                }
            }
            EntryKind::File => result.orphan_file_names.push(name),
        }
    }

    Ok(result)
}

/// Make sure each named package is installed and usable.
///
/// Packages that do not apply to this platform are skipped.
pub fn check_required_packages(
    names: &[&str],
    resources: &ApioResources,
    profile: &Profile,
    packages_dir: &Path,
) -> Result<(), PackageError> {
    for name in names {
        let Some(package) = resources.platform_packages.get(*name) else {
            if resources.all_packages.contains_key(*name) {
                debug!("Package '{name}' does not apply to this platform, skipping");
                continue;
            }
            return Err(PackageError::UnknownPackage {
                name: name.to_string(),
            });
        };

        let version = profile
            .installed_version(name)
            .ok_or_else(|| PackageError::NotInstalled {
                name: name.to_string(),
            })?;

        if !version_matches(version, &package.release.requirement) {
            return Err(PackageError::VersionMismatch {
                name: name.to_string(),
                version: version.to_string(),
                requirement: package.release.requirement.clone(),
            });
        }

        let dir = packages_dir.join(name);
        if !dir.is_dir() {
            return Err(PackageError::MissingDirectory {
                name: name.to_string(),
                path: dir,
            });
        }
    }
    Ok(())
}
