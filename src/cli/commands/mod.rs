//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod boards;
pub mod build;
pub mod fpgas;
pub mod packages;
pub mod system;

use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

use build::{BuildArgs, BuildTarget};
use packages::PackagesArgs;
use system::SystemArgs;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize the bitstream
    Build(BuildArgs),

    /// Lint the verilog sources
    Lint(BuildArgs),

    /// Simulate a testbench and show the waves
    Sim(BuildArgs),

    /// Run the testbenches
    Test(BuildArgs),

    /// Render the design as a graph
    Graph(BuildArgs),

    /// Program the board with the bitstream
    Upload(BuildArgs),

    /// Manage toolchain packages
    Packages(PackagesArgs),

    /// List the supported boards
    Boards,

    /// List the supported fpgas
    Fpgas,

    /// Show system information
    System(SystemArgs),
}

impl Commands {
    /// Execute the command
    pub async fn run(self, project_dir: &Path) -> Result<()> {
        match self {
            Self::Build(args) => build::execute(project_dir, BuildTarget::Build, &args),
            Self::Lint(args) => build::execute(project_dir, BuildTarget::Lint, &args),
            Self::Sim(args) => build::execute(project_dir, BuildTarget::Sim, &args),
            Self::Test(args) => build::execute(project_dir, BuildTarget::Test, &args),
            Self::Graph(args) => build::execute(project_dir, BuildTarget::Graph, &args),
            Self::Upload(args) => build::execute(project_dir, BuildTarget::Upload, &args),
            Self::Packages(args) => packages::execute(project_dir, &args).await,
            Self::Boards => boards::execute(project_dir),
            Self::Fpgas => fpgas::execute(project_dir),
            Self::System(args) => system::execute(project_dir, &args),
        }
    }
}
