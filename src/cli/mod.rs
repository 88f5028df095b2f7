//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use commands::Commands;

/// Apio - Open source FPGA toolchain orchestrator
///
/// Builds, simulates and uploads FPGA designs using the open source tools.
#[derive(Parser, Debug)]
#[command(name = "apio")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Project directory (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let project_dir = match self.project_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        if let Some(cmd) = self.command {
            cmd.run(&project_dir).await
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::try_parse_from([
            "apio", "-v", "build", "--board", "icezum", "--type", "hx", "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Some(Commands::Build(args)) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.board.as_deref(), Some("icezum"));
        assert_eq!(args.fpga_type.as_deref(), Some("hx"));
        assert!(args.dry_run);
    }

    #[test]
    fn test_packages_actions_conflict() {
        assert!(Cli::try_parse_from(["apio", "packages", "--list", "--fix"]).is_err());
        let cli = Cli::try_parse_from(["apio", "packages", "--install"]).unwrap();
        let Some(Commands::Packages(args)) = cli.command else {
            panic!("expected packages");
        };
        assert_eq!(args.install, Some(vec![]));
    }
}
