//! SCons invocation
//!
//! Build type commands hand their resolved arguments to SCons. The tool is
//! looked up on the PATH that the installed packages contribute, so a
//! packaged `scons` wins over a system one.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::core::env_plan::EnvironmentMutationPlan;
use crate::error::BuildError;

/// Build tool executable name
pub const SCONS: &str = "scons";

/// A located SCons executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SconsRunner {
    scons_path: PathBuf,
}

impl SconsRunner {
    /// Wrap an explicit executable
    pub fn new(scons_path: PathBuf) -> Self {
        Self { scons_path }
    }

    /// Find `scons` on the plan's search path.
    pub fn locate(plan: &EnvironmentMutationPlan, cwd: &Path) -> Result<Self, BuildError> {
        let search_path = plan.search_path(std::env::var_os("PATH"));
        let scons_path =
            which::which_in(SCONS, search_path, cwd).map_err(|_| BuildError::ToolNotFound {
                tool: SCONS.to_string(),
            })?;
        debug!("Using {}", scons_path.display());
        Ok(Self { scons_path })
    }

    pub fn scons_path(&self) -> &Path {
        &self.scons_path
    }

    /// The command line that `run` would execute
    pub fn command(
        &self,
        target: &str,
        flags: &[String],
        plan: &EnvironmentMutationPlan,
        project_dir: &Path,
    ) -> Command {
        let mut command = Command::new(&self.scons_path);
        command
            .arg("-Q")
            .arg(target)
            .args(flags)
            .current_dir(project_dir);
        plan.apply(&mut command);
        command
    }

    /// Run SCons for `target` and return its exit code.
    pub fn run(
        &self,
        target: &str,
        flags: &[String],
        plan: &EnvironmentMutationPlan,
        project_dir: &Path,
    ) -> Result<i32, BuildError> {
        info!("Running {SCONS} {target}");
        let status = self
            .command(target, flags, plan, project_dir)
            .status()
            .map_err(|e| BuildError::Spawn {
                tool: SCONS.to_string(),
                error: e.to_string(),
            })?;
        Ok(status.code().unwrap_or(1))
    }
}
