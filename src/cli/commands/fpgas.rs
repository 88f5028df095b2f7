//! Fpgas command

use anyhow::Result;
use std::path::Path;

use crate::cli::output::print_notices;
use crate::core::context::{ApioContext, ProjectScope};
use crate::core::resources::{FpgaDescriptor, ResourceTable};

/// Execute the fpgas command
pub fn execute(project_dir: &Path) -> Result<()> {
    let ctx = ApioContext::load(project_dir, ProjectScope::Use)?;
    print_notices(&ctx.resources.notices);
    print!("{}", render(&ctx.resources.fpgas));
    println!("{} fpgas", ctx.resources.fpgas.len());
    Ok(())
}

fn render(fpgas: &ResourceTable<FpgaDescriptor>) -> String {
    let mut out = format!(
        "{:<22} {:<8} {:<12} {:<6} {:<8} {}\n",
        "FPGA", "ARCH", "PART", "SIZE", "TYPE", "PACK"
    );
    for (id, fpga) in fpgas {
        out.push_str(&format!(
            "{id:<22} {:<8} {:<12} {:<6} {:<8} {}\n",
            fpga.arch.as_str(),
            fpga.part_num,
            fpga.size,
            fpga.fpga_type,
            fpga.pack.as_deref().unwrap_or("")
        ));
    }
    out
}
