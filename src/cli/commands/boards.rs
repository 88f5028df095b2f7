//! Boards command
//!
//! Lists the boards known to apio, including project overrides.

use anyhow::Result;
use std::path::Path;

use crate::cli::output::print_notices;
use crate::core::context::{ApioContext, ProjectScope};
use crate::core::resources::ApioResources;

/// Execute the boards command
pub fn execute(project_dir: &Path) -> Result<()> {
    let ctx = ApioContext::load(project_dir, ProjectScope::Use)?;
    print_notices(&ctx.resources.notices);
    print!("{}", render(&ctx.resources));
    println!("{} boards", ctx.resources.boards.len());
    Ok(())
}

fn render(resources: &ApioResources) -> String {
    let mut out = format!("{:<24} {:<22} {:<8} {}\n", "BOARD", "FPGA", "ARCH", "DESCRIPTION");
    for (id, board) in &resources.boards {
        let arch = resources
            .fpgas
            .get(&board.fpga_id)
            .map_or("?", |fpga| fpga.arch.as_str());
        out.push_str(&format!(
            "{id:<24} {:<22} {arch:<8} {}\n",
            board.fpga_id, board.description
        ));
    }
    out
}
