//! Packages command
//!
//! Implements `apio packages --list`, `--install`, `--uninstall` and `--fix`.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};
use std::path::Path;

use crate::cli::output::{download_progress, is_quiet, status};
use crate::core::context::{ApioContext, ProjectScope};
use crate::core::installer::{InstallOutcome, Installer, UninstallOutcome};
use crate::core::packages::PackageScanResult;
use crate::infra::download::DownloadManager;

#[derive(Args, Debug, Clone, Default)]
#[command(group(ArgGroup::new("action").args(["list", "install", "uninstall", "fix"])))]
pub struct PackagesArgs {
    /// List the packages and their state (default)
    #[arg(short, long)]
    pub list: bool,

    /// Install packages (`name` or `name@version`, all when none given)
    #[arg(short, long, num_args = 0.., value_name = "PACKAGE")]
    pub install: Option<Vec<String>>,

    /// Uninstall packages (all when none given)
    #[arg(short, long, num_args = 0.., value_name = "PACKAGE")]
    pub uninstall: Option<Vec<String>>,

    /// Repair broken packages and delete orphans
    #[arg(long)]
    pub fix: bool,

    /// Reinstall even if already installed
    #[arg(short, long, requires = "install")]
    pub force: bool,
}

/// Execute the packages command
pub async fn execute(project_dir: &Path, args: &PackagesArgs) -> Result<()> {
    let mut ctx = ApioContext::load(project_dir, ProjectScope::Ignore)?;

    if let Some(names) = &args.install {
        return install(&mut ctx, names, args.force).await;
    }
    if let Some(names) = &args.uninstall {
        return uninstall(&mut ctx, names);
    }
    if args.fix {
        return fix(&mut ctx).await;
    }
    list(&ctx)
}

/// Names from the command line, or every platform package
fn targets(ctx: &ApioContext, names: &[String]) -> Vec<String> {
    if names.is_empty() {
        ctx.resources.platform_packages.keys().cloned().collect()
    } else {
        names.to_vec()
    }
}

fn installer() -> Installer {
    let installer = Installer::new(DownloadManager::new());
    if is_quiet() {
        installer
    } else {
        installer.with_progress(Box::new(|name| Some(download_progress(name))))
    }
}

async fn install(ctx: &mut ApioContext, names: &[String], force: bool) -> Result<()> {
    let mut installer = installer();
    for spec in targets(ctx, names) {
        let outcome = installer
            .install(ctx, &spec, force)
            .await
            .with_context(|| format!("Failed to install '{spec}'"))?;
        if is_quiet() {
            continue;
        }
        match outcome {
            InstallOutcome::AlreadyInstalled { name, version } => {
                println!("{} Package '{name}' {version} already installed", status::INFO);
            }
            InstallOutcome::Installed { name, version } => {
                println!("{} Package '{name}' {version} installed", status::SUCCESS);
            }
        }
    }
    Ok(())
}

fn uninstall(ctx: &mut ApioContext, names: &[String]) -> Result<()> {
    let installer = installer();
    for name in targets(ctx, names) {
        let outcome = installer
            .uninstall(ctx, &name)
            .with_context(|| format!("Failed to uninstall '{name}'"))?;
        if is_quiet() {
            continue;
        }
        match outcome {
            UninstallOutcome::NotInstalled { name } => {
                println!("{} Package '{name}' was not installed", status::INFO);
            }
            UninstallOutcome::Uninstalled { name } => {
                println!("{} Package '{name}' uninstalled", status::SUCCESS);
            }
        }
    }
    Ok(())
}

async fn fix(ctx: &mut ApioContext) -> Result<()> {
    let report = installer().fix(ctx).await?;
    if report.actions.is_empty() {
        println!("{} No errors to fix", status::SUCCESS);
    }
    for action in &report.actions {
        println!("{} {action}", status::SUCCESS);
    }
    println!();
    print!("{}", render_scan(ctx, &report.after));
    if report.after.num_errors() > 0 {
        anyhow::bail!("{} package errors remain", report.after.num_errors());
    }
    Ok(())
}

fn list(ctx: &ApioContext) -> Result<()> {
    let scan = ctx.scan_packages()?;
    print!("{}", render_scan(ctx, &scan));
    if scan.num_errors() > 0 {
        println!();
        println!(
            "{} Found {} package errors, run 'apio packages --fix' to repair them.",
            status::WARNING,
            scan.num_errors()
        );
    }
    Ok(())
}

/// Text listing of a scan result
fn render_scan(ctx: &ApioContext, scan: &PackageScanResult) -> String {
    let mut out = String::new();
    let mut section = |title: &str, lines: Vec<String>| {
        if lines.is_empty() {
            return;
        }
        out.push_str(title);
        out.push('\n');
        for line in lines {
            out.push_str("  ");
            out.push_str(&line);
            out.push('\n');
        }
    };

    let describe = |id: &String| {
        let description = ctx
            .resources
            .all_packages
            .get(id)
            .map_or("", |p| p.description.as_str());
        match ctx.profile.installed_version(id) {
            Some(version) => format!("{id:<16} {version:<10} {description}"),
            None => format!("{id:<16} {:<10} {description}", ""),
        }
    };

    section("Installed packages:", scan.installed_ids.iter().map(describe).collect());
    section("Uninstalled packages:", scan.uninstalled_ids.iter().map(describe).collect());
    section("Broken packages:", scan.broken_ids.iter().map(describe).collect());
    section("Orphan packages:", scan.orphan_package_ids.to_vec());
    section("Orphan directories:", scan.orphan_dir_names.to_vec());
    section("Orphan files:", scan.orphan_file_names.to_vec());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::PlatformProbe;
    use crate::core::resources::StockLoader;
    use crate::infra::dirs::ApioDirs;
    use tempfile::TempDir;

    fn context(home: &Path) -> ApioContext {
        let probe = PlatformProbe {
            override_id: Some("linux-x86-64".to_string()),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
        };
        ApioContext::load_with(
            ApioDirs::with_home(home),
            StockLoader::bundled(),
            &probe,
            home,
            ProjectScope::Ignore,
        )
        .unwrap()
    }

    #[test]
    fn test_targets_default_to_platform_packages() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path());
        let all = targets(&ctx, &[]);
        assert!(all.contains(&"oss-cad-suite".to_string()));
        assert!(!all.contains(&"drivers".to_string()));

        let named = targets(&ctx, &["verible".to_string()]);
        assert_eq!(named, vec!["verible".to_string()]);
    }

    #[test]
    fn test_render_scan_sections() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path());
        let scan = PackageScanResult {
            uninstalled_ids: vec!["verible".to_string()],
            orphan_dir_names: vec!["junk".to_string()],
            ..Default::default()
        };
        let text = render_scan(&ctx, &scan);
        assert!(text.contains("Uninstalled packages:"));
        assert!(text.contains("verible"));
        assert!(text.contains("Orphan directories:\n  junk\n"));
        assert!(!text.contains("Installed packages:"));
    }
}
