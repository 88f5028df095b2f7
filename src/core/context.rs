//! Per-invocation state
//!
//! A command builds one [`ApioContext`]: directories, resource tables with
//! the platform id, and the profile. The project file is loaded separately
//! by the commands that work on a project.

use std::path::{Path, PathBuf};

use super::env_plan::EnvironmentMutationPlan;
use super::packages::{check_required_packages, scan_packages, PackageScanResult};
use super::platform::PlatformProbe;
use super::profile::Profile;
use super::project::Project;
use super::resources::{ApioResources, ProjectOverrideLoader, ResourceLoader, StockLoader};
use crate::config::env::lookup;
use crate::error::{ApioError, FilesystemError, PackageError, ProjectError};
use crate::infra::dirs::ApioDirs;

/// Whether the project directory takes part in resource loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    /// Stock resources only
    Ignore,
    /// Project files may override boards, fpgas and programmers
    Use,
}

/// State shared by one apio command
#[derive(Debug)]
pub struct ApioContext {
    pub dirs: ApioDirs,
    pub resources: ApioResources,
    pub profile: Profile,
    pub project_dir: PathBuf,
    pub scope: ProjectScope,
}

impl ApioContext {
    /// Context for the running host and environment
    pub fn load(project_dir: &Path, scope: ProjectScope) -> Result<Self, ApioError> {
        Self::load_with(
            ApioDirs::new(),
            StockLoader::bundled(),
            &PlatformProbe::host(lookup("APIO_PLATFORM")),
            project_dir,
            scope,
        )
    }

    /// Context with explicit directories, stock resources and platform
    pub fn load_with(
        dirs: ApioDirs,
        stock: StockLoader,
        probe: &PlatformProbe,
        project_dir: &Path,
        scope: ProjectScope,
    ) -> Result<Self, ApioError> {
        let resources = match scope {
            ProjectScope::Use => {
                let loader = ProjectOverrideLoader::new(stock, project_dir);
                load_resources(&loader, probe, &dirs)?
            }
            ProjectScope::Ignore => load_resources(&stock, probe, &dirs)?,
        };
        let profile = Profile::load(&dirs.profile_path())?;
        Ok(Self {
            dirs,
            resources,
            profile,
            project_dir: project_dir.to_path_buf(),
            scope,
        })
    }

    /// Load apio.ini from the project directory, if any
    pub fn load_project(&self) -> Result<Option<Project>, ProjectError> {
        Project::load(&self.project_dir)
    }

    /// Scan the packages directory against the profile
    pub fn scan_packages(&self) -> Result<PackageScanResult, FilesystemError> {
        scan_packages(
            self.dirs.packages_dir(),
            &self.resources.platform_packages,
            &self.profile,
        )
    }

    /// Fail unless every named package is installed and usable
    pub fn check_required_packages(&self, names: &[&str]) -> Result<(), PackageError> {
        check_required_packages(
            names,
            &self.resources,
            &self.profile,
            self.dirs.packages_dir(),
        )
    }

    /// Environment the installed packages contribute to tool runs
    pub fn env_plan(&self) -> Result<EnvironmentMutationPlan, FilesystemError> {
        let scan = self.scan_packages()?;
        Ok(EnvironmentMutationPlan::for_installed(
            &self.resources.platform_packages,
            &scan,
        ))
    }
}

fn load_resources(
    loader: &dyn ResourceLoader,
    probe: &PlatformProbe,
    dirs: &ApioDirs,
) -> Result<ApioResources, ApioError> {
    ApioResources::load(loader, probe, dirs.packages_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn probe() -> PlatformProbe {
        PlatformProbe {
            override_id: Some("linux-x86-64".to_string()),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
        }
    }

    #[test]
    fn test_context_loads_with_empty_home() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let ctx = ApioContext::load_with(
            ApioDirs::with_home(home.path()),
            StockLoader::bundled(),
            &probe(),
            project.path(),
            ProjectScope::Use,
        )
        .unwrap();
        assert_eq!(ctx.resources.platform_id, "linux-x86-64");
        assert!(ctx.load_project().unwrap().is_none());
        assert_eq!(ctx.scan_packages().unwrap().num_errors(), 0);
        assert!(ctx.env_plan().unwrap().is_empty());
    }

    #[test]
    fn test_ignore_scope_skips_project_overrides() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        std::fs::write(project.path().join("boards.jsonc"), "{}").unwrap();
        let ctx = ApioContext::load_with(
            ApioDirs::with_home(home.path()),
            StockLoader::bundled(),
            &probe(),
            project.path(),
            ProjectScope::Ignore,
        )
        .unwrap();
        assert!(!ctx.resources.boards.is_empty());
        assert!(ctx.resources.notices.is_empty());
    }

    #[test]
    fn test_missing_required_package() {
        let home = TempDir::new().unwrap();
        let ctx = ApioContext::load_with(
            ApioDirs::with_home(home.path()),
            StockLoader::bundled(),
            &probe(),
            home.path(),
            ProjectScope::Ignore,
        )
        .unwrap();
        let err = ctx.check_required_packages(&["oss-cad-suite"]).unwrap_err();
        assert_eq!(
            err,
            PackageError::NotInstalled {
                name: "oss-cad-suite".to_string()
            }
        );
        // Not applicable on linux, skipped.
        assert!(ctx.check_required_packages(&["drivers"]).is_ok());
    }
}
