//! Tool environment
//!
//! The PATH entries and variables the installed packages contribute to tool
//! invocations. The plan is applied to a child [`Command`]; the apio process
//! environment itself is never modified.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

use super::packages::PackageScanResult;
use super::resources::{PackageDescriptor, ResourceTable};

/// Ordered PATH prepends and variable assignments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentMutationPlan {
    pub path_prepends: Vec<PathBuf>,
    pub vars: Vec<(String, String)>,
}

impl EnvironmentMutationPlan {
    /// Plan for the installed packages, in package id order.
    pub fn for_installed(
        platform_packages: &ResourceTable<PackageDescriptor>,
        scan: &PackageScanResult,
    ) -> Self {
        let mut plan = Self::default();
        for (id, package) in platform_packages {
            if !scan.is_installed(id) {
                continue;
            }
            plan.path_prepends
                .extend(package.env.path.iter().map(PathBuf::from));
            plan.vars.extend(
                package
                    .env
                    .vars
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            );
        }
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.path_prepends.is_empty() && self.vars.is_empty()
    }

    /// PATH with the plan's directories in front of `current`
    pub fn search_path(&self, current: Option<OsString>) -> Option<OsString> {
        let existing = current
            .as_ref()
            .map(|p| std::env::split_paths(p).collect::<Vec<_>>())
            .unwrap_or_default();
        std::env::join_paths(self.path_prepends.iter().cloned().chain(existing)).ok()
    }

    /// Apply the plan to a child process.
    pub fn apply(&self, command: &mut Command) {
        if let Some(path) = self.search_path(std::env::var_os("PATH")) {
            command.env("PATH", path);
        }
        for (name, value) in &self.vars {
            debug!("Setting {name}={value}");
            command.env(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn packages() -> ResourceTable<PackageDescriptor> {
        let mut table = ResourceTable::new();
        for (id, path, var) in [("a", "/pk/a/bin", "A_HOME"), ("b", "/pk/b/bin", "B_HOME")] {
            let package = serde_json::from_value(json!({
                "description": id,
                "repository": {"organization": "o", "name": id},
                "release": {"requirement": "*", "file-name": "f.tgz"},
                "env": {"path": [path], "vars": {var: format!("/pk/{id}")}}
            }))
            .unwrap();
            table.insert(id.to_string(), package);
        }
        table
    }

    #[test]
    fn test_only_installed_packages_contribute() {
        let scan = PackageScanResult {
            installed_ids: vec!["b".to_string()],
            uninstalled_ids: vec!["a".to_string()],
            ..PackageScanResult::default()
        };
        let plan = EnvironmentMutationPlan::for_installed(&packages(), &scan);
        assert_eq!(plan.path_prepends, vec![PathBuf::from("/pk/b/bin")]);
        assert_eq!(plan.vars, vec![("B_HOME".to_string(), "/pk/b".to_string())]);
    }

    #[test]
    fn test_search_path_prepends_in_order() {
        let plan = EnvironmentMutationPlan {
            path_prepends: vec![PathBuf::from("/first"), PathBuf::from("/second")],
            vars: Vec::new(),
        };
        let current = std::env::join_paths([PathBuf::from("/usr/bin")]).unwrap();
        let path = plan.search_path(Some(current)).unwrap();
        let parts: Vec<PathBuf> = std::env::split_paths(&path).collect();
        assert_eq!(
            parts,
            vec![
                PathBuf::from("/first"),
                PathBuf::from("/second"),
                PathBuf::from("/usr/bin")
            ]
        );
    }

    #[test]
    fn test_empty_plan() {
        let plan = EnvironmentMutationPlan::for_installed(&packages(), &PackageScanResult::default());
        assert!(plan.is_empty());
    }
}
