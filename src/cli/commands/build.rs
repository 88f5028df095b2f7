//! Build type commands
//!
//! Implements `apio build`, `lint`, `sim`, `test`, `graph` and `upload`.
//! Each resolves the build configuration, checks the packages it needs and
//! hands the resulting arguments to SCons.

use anyhow::{bail, Result};
use clap::Args;
use std::fmt;
use std::path::Path;

use crate::cli::output::{is_quiet, print_notices};
use crate::config::defaults::{BUILD_PACKAGES, GRAPH_PACKAGES, UPLOAD_PACKAGES};
use crate::core::context::{ApioContext, ProjectScope};
use crate::core::resolve::{resolve, SeedArgs};
use crate::core::resources::{ApioResources, FpgaArch};
use crate::core::template::substitute_vars;
use crate::infra::scons::SconsRunner;

/// Options shared by the build type commands
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Board id (overrides the board in apio.ini)
    #[arg(short, long)]
    pub board: Option<String>,

    /// FPGA id
    #[arg(long)]
    pub fpga: Option<String>,

    /// FPGA architecture (ice40, ecp5, gowin)
    #[arg(long)]
    pub arch: Option<FpgaArch>,

    /// FPGA type
    #[arg(long = "type", value_name = "TYPE")]
    pub fpga_type: Option<String>,

    /// FPGA size
    #[arg(long)]
    pub size: Option<String>,

    /// FPGA package
    #[arg(long)]
    pub pack: Option<String>,

    /// FPGA idcode
    #[arg(long)]
    pub idcode: Option<String>,

    /// Top level module
    #[arg(short, long)]
    pub top_module: Option<String>,

    /// Testbench file
    #[arg(long)]
    pub testbench: Option<String>,

    /// Graph output spec
    #[arg(long)]
    pub graph_spec: Option<String>,

    /// Serial port for programmers that need one
    #[arg(long)]
    pub serial_port: Option<String>,

    /// Show all tool output
    #[arg(long)]
    pub verbose_all: bool,

    /// Show synthesis output
    #[arg(long)]
    pub verbose_synth: bool,

    /// Show place and route output
    #[arg(long)]
    pub verbose_pnr: bool,

    /// Print the build arguments instead of running SCons
    #[arg(long)]
    pub dry_run: bool,
}

impl BuildArgs {
    fn seed(&self) -> SeedArgs {
        SeedArgs {
            board: self.board.clone(),
            fpga: self.fpga.clone(),
            arch: self.arch,
            fpga_type: self.fpga_type.clone(),
            size: self.size.clone(),
            pack: self.pack.clone(),
            idcode: self.idcode.clone(),
            top_module: self.top_module.clone(),
            testbench: self.testbench.clone(),
            graph_spec: self.graph_spec.clone(),
            verbose_all: self.verbose_all,
            verbose_synth: self.verbose_synth,
            verbose_pnr: self.verbose_pnr,
        }
    }
}

/// SCons target of a build type command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTarget {
    Build,
    Lint,
    Sim,
    Test,
    Graph,
    Upload,
}

impl BuildTarget {
    pub fn scons_target(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Lint => "lint",
            Self::Sim => "sim",
            Self::Test => "test",
            Self::Graph => "graph",
            Self::Upload => "upload",
        }
    }

    /// Packages that must be installed before running
    pub fn required_packages(self) -> Vec<&'static str> {
        let mut packages = BUILD_PACKAGES.to_vec();
        match self {
            Self::Graph => packages.extend_from_slice(GRAPH_PACKAGES),
            Self::Upload => packages.extend_from_slice(UPLOAD_PACKAGES),
            _ => {}
        }
        packages
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scons_target())
    }
}

/// `prog=<command line>` for the board's programmer
fn programmer_flag(
    resources: &ApioResources,
    board_id: &str,
    serial_port: Option<&str>,
) -> Result<String> {
    let bundle = resources.project_bundle(board_id)?;
    let (vid, pid) = bundle
        .board
        .usb
        .as_ref()
        .map_or(("", ""), |usb| (usb.vid.as_str(), usb.pid.as_str()));
    let vars = [
        ("VID", vid),
        ("PID", pid),
        ("SERIAL_PORT", serial_port.unwrap_or("")),
    ];
    let command = substitute_vars(&bundle.programmer.command, &vars);
    let args = substitute_vars(&bundle.programmer.args, &vars);
    Ok(format!("prog={}", format!("{command} {args}").trim()))
}

/// Execute a build type command
pub fn execute(project_dir: &Path, target: BuildTarget, args: &BuildArgs) -> Result<()> {
    let ctx = ApioContext::load(project_dir, ProjectScope::Use)?;
    print_notices(&ctx.resources.notices);

    let project = ctx.load_project()?;
    let resolved = resolve(&args.seed(), project.as_ref(), &ctx.resources)?;
    print_notices(&resolved.notices);
    tracing::info!(
        "Resolved {} for {} ({})",
        target,
        resolved.board_id.as_deref().unwrap_or("no board"),
        resolved.arch
    );

    let mut flags = resolved.flags;
    if target == BuildTarget::Upload {
        let Some(board_id) = resolved.board_id.as_deref() else {
            bail!("Upload needs a board. Set 'board' in apio.ini or pass --board.");
        };
        flags.push(programmer_flag(
            &ctx.resources,
            board_id,
            args.serial_port.as_deref(),
        )?);
    }

    ctx.check_required_packages(&target.required_packages())?;

    if args.dry_run {
        for flag in &flags {
            println!("{flag}");
        }
        return Ok(());
    }

    let plan = ctx.env_plan()?;
    let runner = SconsRunner::locate(&plan, project_dir)?;
    let code = runner.run(target.scons_target(), &flags, &plan, project_dir)?;
    if code != 0 {
        bail!("'apio {target}' failed (exit code {code})");
    }
    if !is_quiet() {
        println!("✓ apio {target} done");
    }
    Ok(())
}
