//! Package installation
//!
//! Installs, uninstalls and repairs toolchain packages under the packages
//! directory, keeping the profile in step. Package versions come from the
//! remote config unless the user names one explicitly (`name@version`).

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::context::ApioContext;
use super::jsonc;
use super::packages::PackageScanResult;
use super::resources::{ApioConfig, PackageDescriptor};
use super::template::substitute_vars;
use super::version::{current_major_minor, version_matches};
use crate::config::defaults::REMOTE_CONFIG_TIMEOUT_SECS;
use crate::config::env::lookup;
use crate::error::{ApioError, DownloadError, PackageError};
use crate::infra::download::{DownloadManager, ProgressCallback};
use crate::infra::filesystem;
use crate::infra::remote::fetch_text;
use crate::infra::unpack::unpack_archive;

/// Package versions published for this apio release
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RemoteConfig {
    #[serde(default)]
    pub packages: BTreeMap<String, RemotePackage>,
}

/// Remote config entry of a package
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RemotePackage {
    pub version: String,
}

/// `name` or `name@version` from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub version: Option<String>,
}

impl PackageSpec {
    pub fn parse(spec: &str) -> Self {
        match spec.split_once('@') {
            Some((name, version)) if !version.is_empty() => Self {
                name: name.to_string(),
                version: Some(version.to_string()),
            },
            Some((name, _)) => Self {
                name: name.to_string(),
                version: None,
            },
            None => Self {
                name: spec.to_string(),
                version: None,
            },
        }
    }
}

/// What `install` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Already installed, nothing done
    AlreadyInstalled { name: String, version: String },
    Installed { name: String, version: String },
}

/// What `uninstall` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    /// No package directory, nothing to delete
    NotInstalled { name: String },
    Uninstalled { name: String },
}

/// Result of `fix`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixReport {
    pub before: PackageScanResult,
    pub after: PackageScanResult,
    /// Human readable actions taken, in order
    pub actions: Vec<String>,
}

/// Creates a progress callback for a named download
pub type ProgressFactory = Box<dyn Fn(&str) -> Option<ProgressCallback> + Send + Sync>;

/// Remote config url, honoring `APIO_REMOTE_CONFIG_URL`
pub fn remote_config_url(config: &ApioConfig) -> String {
    lookup("APIO_REMOTE_CONFIG_URL").unwrap_or_else(|| {
        let (major, minor) = current_major_minor();
        substitute_vars(
            &config.remote_config_url,
            &[("MAJOR", &major), ("MINOR", &minor)],
        )
    })
}

/// Fetch and parse the remote config.
pub async fn fetch_remote_config(url: &str) -> Result<RemoteConfig, DownloadError> {
    let text = fetch_text(url, REMOTE_CONFIG_TIMEOUT_SECS).await?;
    let invalid = |error: String| DownloadError::InvalidResponse {
        url: url.to_string(),
        error,
    };
    let value = jsonc::parse(url, &text).map_err(|e| invalid(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}

/// Archive file name of a package release
pub fn archive_file_name(package: &PackageDescriptor, platform_id: &str, version: &str) -> String {
    substitute_vars(
        &package.release.file_name,
        &[("PLATFORM", platform_id), ("VERSION", version)],
    )
}

/// Download url of a package release
pub fn download_url(
    config: &ApioConfig,
    package: &PackageDescriptor,
    version: &str,
    file_name: &str,
) -> String {
    substitute_vars(
        &config.package_download_url,
        &[
            ("ORGANIZATION", &package.repository.organization),
            ("REPOSITORY", &package.repository.name),
            ("VERSION", version),
            ("FILE_NAME", file_name),
        ],
    )
}

/// Installs and removes packages for one command
pub struct Installer {
    downloader: DownloadManager,
    progress: Option<ProgressFactory>,
    remote: Option<RemoteConfig>,
}

impl Installer {
    pub fn new(downloader: DownloadManager) -> Self {
        Self {
            downloader,
            progress: None,
            remote: None,
        }
    }

    /// Report download progress through `factory`
    #[must_use]
    pub fn with_progress(mut self, factory: ProgressFactory) -> Self {
        self.progress = Some(factory);
        self
    }

    async fn remote_version(
        &mut self,
        ctx: &ApioContext,
        name: &str,
    ) -> Result<String, ApioError> {
        if self.remote.is_none() {
            let url = remote_config_url(&ctx.resources.config);
            info!("Fetching remote config {url}");
            self.remote = Some(fetch_remote_config(&url).await?);
        }
        self.remote
            .as_ref()
            .and_then(|remote| remote.packages.get(name))
            .map(|package| package.version.clone())
            .ok_or_else(|| {
                PackageError::NoRemoteVersion {
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// Install a package, `spec` being `name` or `name@version`.
    pub async fn install(
        &mut self,
        ctx: &mut ApioContext,
        spec: &str,
        force: bool,
    ) -> Result<InstallOutcome, ApioError> {
        let PackageSpec { name, version } = PackageSpec::parse(spec);
        let package = applicable_package(ctx, &name)?.clone();

        if !force {
            if let Some(installed) = ctx.profile.installed_version(&name) {
                let usable = ctx.dirs.package_dir(&name).is_dir()
                    && version_matches(installed, &package.release.requirement)
                    && version.as_deref().map_or(true, |v| v == installed);
                if usable {
                    info!("Package '{name}' {installed} already installed");
                    return Ok(InstallOutcome::AlreadyInstalled {
                        version: installed.to_string(),
                        name,
                    });
                }
            }
        }

        let target = match version {
            Some(explicit) => explicit,
            None => self.remote_version(ctx, &name).await?,
        };
        if !version_matches(&target, &package.release.requirement) {
            return Err(PackageError::RequirementUnsatisfied {
                name,
                version: target,
                requirement: package.release.requirement.clone(),
            }
            .into());
        }

        remove_package_files(ctx, &name)?;

        let packages_dir = ctx.dirs.packages_dir().to_path_buf();
        let package_dir = ctx.dirs.package_dir(&name);
        let file_name = archive_file_name(&package, &ctx.resources.platform_id, &target);
        let url = download_url(&ctx.resources.config, &package, &target, &file_name);

        info!("Downloading {url}");
        let progress = self.progress.as_ref().and_then(|factory| factory(&name));
        let result = self
            .downloader
            .download(&url, &packages_dir.join(&file_name), progress)
            .await?;
        info!(
            "Package '{name}' archive {} bytes, sha256 {}",
            result.size, result.checksum
        );
        let archive = result.path;

        let unpacked: Result<(), ApioError> = match &package.release.uncompressed_name {
            Some(template) => unpack_archive(&archive, &packages_dir)
                .map_err(ApioError::from)
                .and_then(|()| {
                    let dir_name = substitute_vars(
                        template,
                        &[
                            ("PLATFORM", ctx.resources.platform_id.as_str()),
                            ("VERSION", target.as_str()),
                        ],
                    );
                    filesystem::rename(&packages_dir.join(dir_name), &package_dir)
                        .map_err(ApioError::from)
                }),
            None => unpack_archive(&archive, &package_dir).map_err(ApioError::from),
        };
        filesystem::remove_file(&archive)?;
        unpacked?;

        ctx.profile.add_package(&name, &target)?;
        info!("Package '{name}' {target} installed");
        Ok(InstallOutcome::Installed {
            name,
            version: target,
        })
    }

    /// Uninstall a package. A package without a directory is a no-op.
    pub fn uninstall(
        &self,
        ctx: &mut ApioContext,
        name: &str,
    ) -> Result<UninstallOutcome, ApioError> {
        if !ctx.resources.all_packages.contains_key(name) {
            return Err(PackageError::UnknownPackage {
                name: name.to_string(),
            }
            .into());
        }
        let had_dir = ctx.dirs.package_dir(name).is_dir();
        remove_package_files(ctx, name)?;
        if had_dir {
            info!("Package '{name}' uninstalled");
            Ok(UninstallOutcome::Uninstalled {
                name: name.to_string(),
            })
        } else {
            info!("Package '{name}' was not installed");
            Ok(UninstallOutcome::NotInstalled {
                name: name.to_string(),
            })
        }
    }

    /// Repair broken packages and remove orphans.
    pub async fn fix(&mut self, ctx: &mut ApioContext) -> Result<FixReport, ApioError> {
        let before = ctx.scan_packages()?;
        let mut actions = Vec::new();
        if before.num_errors() == 0 {
            return Ok(FixReport {
                after: before.clone(),
                before,
                actions,
            });
        }

        for name in &before.orphan_package_ids {
            remove_package_files(ctx, name)?;
            actions.push(format!("Removed orphan package '{name}'"));
        }
        let packages_dir = ctx.dirs.packages_dir().to_path_buf();
        for name in &before.orphan_dir_names {
            filesystem::remove_dir_all(&packages_dir.join(name))?;
            actions.push(format!("Deleted orphan directory '{name}'"));
        }
        for name in &before.orphan_file_names {
            filesystem::remove_file(&packages_dir.join(name))?;
            actions.push(format!("Deleted orphan file '{name}'"));
        }

        for name in &before.broken_ids {
            warn!("Reinstalling broken package '{name}'");
            remove_package_files(ctx, name)?;
            self.install(ctx, name, true).await?;
            actions.push(format!("Reinstalled broken package '{name}'"));
        }

        let after = ctx.scan_packages()?;
        Ok(FixReport {
            before,
            after,
            actions,
        })
    }
}

/// The platform package `name`, or why it cannot be installed
fn applicable_package<'a>(
    ctx: &'a ApioContext,
    name: &str,
) -> Result<&'a PackageDescriptor, PackageError> {
    if let Some(package) = ctx.resources.platform_packages.get(name) {
        return Ok(package);
    }
    if ctx.resources.all_packages.contains_key(name) {
        return Err(PackageError::NotApplicable {
            name: name.to_string(),
            platform: ctx.resources.platform_id.clone(),
        });
    }
    Err(PackageError::UnknownPackage {
        name: name.to_string(),
    })
}

/// Delete a package directory and its profile record.
fn remove_package_files(ctx: &mut ApioContext, name: &str) -> Result<(), ApioError> {
    let dir = ctx.dirs.package_dir(name);
    if dir.is_dir() {
        debug!("Deleting {}", dir.display());
        filesystem::remove_dir_all(&dir)?;
    } else if dir.exists() {
        debug!("Deleting stray file {}", dir.display());
        filesystem::remove_file(&dir)?;
    }
    ctx.profile.remove_package(name)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_spec_parse() {
        assert_eq!(
            PackageSpec::parse("oss-cad-suite@0.2.3"),
            PackageSpec {
                name: "oss-cad-suite".to_string(),
                version: Some("0.2.3".to_string())
            }
        );
        assert_eq!(PackageSpec::parse("verible").version, None);
        assert_eq!(PackageSpec::parse("verible@").name, "verible");
    }

    #[test]
    fn test_urls_from_templates() {
        let config = ApioConfig {
            remote_config_url: "https://x/apio-${MAJOR}.${MINOR}.x.jsonc".to_string(),
            package_download_url:
                "https://github.com/${ORGANIZATION}/${REPOSITORY}/releases/download/${VERSION}/${FILE_NAME}"
                    .to_string(),
        };
        let package: PackageDescriptor = serde_json::from_value(serde_json::json!({
            "description": "d",
            "repository": {"organization": "FPGAwars", "name": "tools-oss-cad-suite"},
            "release": {
                "requirement": "*",
                "file-name": "apio-oss-cad-suite-${PLATFORM}-${VERSION}.tgz"
            }
        }))
        .unwrap();

        let file_name = archive_file_name(&package, "linux-x86-64", "0.2.3");
        assert_eq!(file_name, "apio-oss-cad-suite-linux-x86-64-0.2.3.tgz");
        assert_eq!(
            download_url(&config, &package, "0.2.3", &file_name),
            "https://github.com/FPGAwars/tools-oss-cad-suite/releases/download/0.2.3/apio-oss-cad-suite-linux-x86-64-0.2.3.tgz"
        );
    }

    #[test]
    fn test_remote_config_shape() {
        let remote: RemoteConfig = serde_json::from_value(serde_json::json!({
            "packages": {"oss-cad-suite": {"version": "0.2.3"}}
        }))
        .unwrap();
        assert_eq!(remote.packages["oss-cad-suite"].version, "0.2.3");
    }
}
