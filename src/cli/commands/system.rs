//! System command
//!
//! Shows the platform, directories and build information of this apio.

use anyhow::Result;
use clap::Args;
use std::path::Path;

use crate::config::env::ApioEnvVar;
use crate::core::context::{ApioContext, ProjectScope};
use crate::core::installer::remote_config_url;
use crate::core::resources::ApioResources;
use crate::core::version::CURRENT_VERSION;

#[derive(Args, Debug, Clone, Default)]
pub struct SystemArgs {
    /// List the supported platforms
    #[arg(long, conflicts_with = "info")]
    pub platforms: bool,

    /// Show system information (default)
    #[arg(long)]
    pub info: bool,
}

/// Execute the system command
pub fn execute(project_dir: &Path, args: &SystemArgs) -> Result<()> {
    let ctx = ApioContext::load(project_dir, ProjectScope::Ignore)?;
    if args.platforms {
        print!("{}", render_platforms(&ctx.resources));
    } else {
        print!("{}", render_info(&ctx));
    }
    Ok(())
}

/// Platforms table, the current one marked with `*`
fn render_platforms(resources: &ApioResources) -> String {
    let mut out = String::new();
    for (id, platform) in &resources.platforms {
        let mark = if *id == resources.platform_id { '*' } else { ' ' };
        out.push_str(&format!("{mark} {id:<16} {}\n", platform.description));
    }
    out
}

fn render_info(ctx: &ApioContext) -> String {
    let mut rows = vec![
        ("Apio version", CURRENT_VERSION.to_string()),
        ("Platform id", ctx.resources.platform_id.clone()),
        ("Apio home", ctx.dirs.home_dir().display().to_string()),
        ("Packages dir", ctx.dirs.packages_dir().display().to_string()),
        ("Profile", ctx.dirs.profile_path().display().to_string()),
        ("Remote config", remote_config_url(&ctx.resources.config)),
        ("Target", env!("VERGEN_CARGO_TARGET_TRIPLE").to_string()),
        ("Built", env!("VERGEN_BUILD_TIMESTAMP").to_string()),
    ];
    if let Some(sha) = option_env!("VERGEN_GIT_SHA") {
        rows.push(("Commit", sha.to_string()));
    }
    for var in ApioEnvVar::ALL {
        if let Some(value) = var.get() {
            rows.push((var.name(), value));
        }
    }

    rows.iter()
        .map(|(label, value)| format!("{label:<24} {value}\n"))
        .collect()
}
