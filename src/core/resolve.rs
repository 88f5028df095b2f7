//! Build configuration resolution
//!
//! Merges command line arguments, the board and fpga definitions and the
//! project file into one [`BuildConfiguration`], then serializes it into the
//! ordered `key=value` arguments handed to the build tool.
//!
//! Every field is set-once: setting a field that already holds a different
//! value is a contradiction, setting the same value again does nothing.
//! Values derived from the board and fpga are merged first, command line
//! values second, so a contradiction reports the command line value as the
//! new one.

use tracing::{info, warn};

use super::project::Project;
use super::resources::{ApioResources, FpgaArch};
use crate::config::defaults::DEFAULT_TOP_MODULE;
use crate::error::ResolveError;

/// Command line inputs to the resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedArgs {
    pub board: Option<String>,
    pub fpga: Option<String>,
    pub arch: Option<FpgaArch>,
    pub fpga_type: Option<String>,
    pub size: Option<String>,
    pub pack: Option<String>,
    pub idcode: Option<String>,
    pub top_module: Option<String>,
    pub testbench: Option<String>,
    pub graph_spec: Option<String>,
    pub verbose_all: bool,
    pub verbose_synth: bool,
    pub verbose_pnr: bool,
}

/// A value that can be merged into a configuration field
pub trait FlagValue: PartialEq {
    /// Falsy values are never stored and never serialized.
    fn is_truthy(&self) -> bool;

    /// Rendering used in build arguments and messages
    fn render(&self) -> String;
}

impl FlagValue for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl FlagValue for bool {
    fn is_truthy(&self) -> bool {
        *self
    }

    fn render(&self) -> String {
        let text = if *self { "True" } else { "False" };
        text.to_string()
    }
}

impl FlagValue for FpgaArch {
    fn is_truthy(&self) -> bool {
        true
    }

    fn render(&self) -> String {
        self.as_str().to_string()
    }
}

/// Set `slot` to `value` unless it already holds a different value.
fn merge_once<T: FlagValue>(
    field: &str,
    slot: &mut Option<T>,
    value: Option<T>,
) -> Result<(), ResolveError> {
    let Some(value) = value.filter(FlagValue::is_truthy) else {
        return Ok(());
    };
    match slot {
        None => {
            *slot = Some(value);
            Ok(())
        }
        Some(old) if *old == value => Ok(()),
        Some(old) => Err(ResolveError::Contradiction {
            field: field.to_string(),
            new: value.render(),
            old: old.render(),
        }),
    }
}

/// Generates the set-once setter of each field.
macro_rules! set_once_fields {
    ($($setter:ident => $field:ident: $ty:ty, $name:literal;)*) => {
        impl BuildConfiguration {
            $(
                #[doc = concat!("Merge `", $name, "`. Errors on a different existing value.")]
                pub fn $setter(&mut self, value: Option<$ty>) -> Result<(), ResolveError> {
                    merge_once($name, &mut self.$field, value)
                }
            )*
        }
    };
}

/// Resolved build configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfiguration {
    board: Option<String>,
    fpga_id: Option<String>,
    arch: Option<FpgaArch>,
    fpga_type: Option<String>,
    size: Option<String>,
    pack: Option<String>,
    idcode: Option<String>,
    part_num: Option<String>,
    speed: Option<String>,
    top_module: Option<String>,
    testbench: Option<String>,
    graph_spec: Option<String>,
    platform_id: Option<String>,
    verbose_all: Option<bool>,
    verbose_synth: Option<bool>,
    verbose_pnr: Option<bool>,
    yosys_synth_extra_options: Option<String>,
}

set_once_fields! {
    set_board => board: String, "board";
    set_fpga_id => fpga_id: String, "fpga";
    set_arch => arch: FpgaArch, "arch";
    set_fpga_type => fpga_type: String, "type";
    set_size => size: String, "size";
    set_pack => pack: String, "pack";
    set_idcode => idcode: String, "idcode";
    set_part_num => part_num: String, "part-num";
    set_speed => speed: String, "speed";
    set_top_module => top_module: String, "top-module";
    set_testbench => testbench: String, "testbench";
    set_graph_spec => graph_spec: String, "graph-spec";
    set_platform_id => platform_id: String, "platform-id";
    set_verbose_all => verbose_all: bool, "verbose-all";
    set_verbose_synth => verbose_synth: bool, "verbose-synth";
    set_verbose_pnr => verbose_pnr: bool, "verbose-pnr";
    set_yosys_synth_extra_options => yosys_synth_extra_options: String, "yosys-synth-extra-options";
}

fn push_flag<T: FlagValue>(flags: &mut Vec<String>, key: &str, value: &Option<T>) {
    if let Some(value) = value.as_ref().filter(|v| v.is_truthy()) {
        flags.push(format!("{key}={}", value.render()));
    }
}

impl BuildConfiguration {
    pub fn board(&self) -> Option<&str> {
        self.board.as_deref()
    }

    pub fn fpga_id(&self) -> Option<&str> {
        self.fpga_id.as_deref()
    }

    pub fn arch(&self) -> Option<FpgaArch> {
        self.arch
    }

    pub fn size(&self) -> Option<&str> {
        self.size.as_deref()
    }

    pub fn top_module(&self) -> Option<&str> {
        self.top_module.as_deref()
    }

    /// Build tool arguments in a fixed key order, falsy values omitted
    pub fn to_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        push_flag(&mut flags, "board", &self.board);
        push_flag(&mut flags, "fpga_id", &self.fpga_id);
        push_flag(&mut flags, "fpga_arch", &self.arch);
        push_flag(&mut flags, "fpga_type", &self.fpga_type);
        push_flag(&mut flags, "fpga_size", &self.size);
        push_flag(&mut flags, "fpga_pack", &self.pack);
        push_flag(&mut flags, "fpga_idcode", &self.idcode);
        push_flag(&mut flags, "fpga_part_num", &self.part_num);
        push_flag(&mut flags, "fpga_speed", &self.speed);
        push_flag(&mut flags, "top_module", &self.top_module);
        push_flag(&mut flags, "testbench", &self.testbench);
        push_flag(&mut flags, "graph_spec", &self.graph_spec);
        push_flag(&mut flags, "platform_id", &self.platform_id);
        push_flag(&mut flags, "verbose_all", &self.verbose_all);
        push_flag(&mut flags, "verbose_synth", &self.verbose_synth);
        push_flag(&mut flags, "verbose_pnr", &self.verbose_pnr);
        push_flag(
            &mut flags,
            "yosys_synth_extra_options",
            &self.yosys_synth_extra_options,
        );
        flags
    }
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub config: BuildConfiguration,
    /// Ordered `key=value` build arguments
    pub flags: Vec<String>,
    /// Resolved board id, if a board was given
    pub board_id: Option<String>,
    pub arch: FpgaArch,
    /// Informational messages for the user
    pub notices: Vec<String>,
}

/// Resolve the build configuration.
pub fn resolve(
    seed: &SeedArgs,
    project: Option<&Project>,
    resources: &ApioResources,
) -> Result<Resolved, ResolveError> {
    let mut notices = Vec::new();
    let mut config = BuildConfiguration::default();

    let project_board = project.and_then(Project::board);
    let board_name = match (seed.board.as_deref(), project_board) {
        (Some(cli), Some(proj)) if cli != proj => {
            let notice = format!("Command line board '{cli}' overrides board '{proj}' in apio.ini.");
            info!("{notice}");
            notices.push(notice);
            Some(cli)
        }
        (Some(cli), _) => Some(cli),
        (None, proj) => proj,
    };

    let board_id = match board_name {
        Some(name) => {
            let (id, legacy) =
                resources
                    .canonical_board_id(name)
                    .ok_or_else(|| ResolveError::UnknownBoard {
                        board: name.to_string(),
                    })?;
            if legacy {
                let notice = format!("'{name}' is a legacy board name, use '{id}' instead.");
                warn!("{notice}");
                notices.push(notice);
            }
            Some(id.to_string())
        }
        None => None,
    };

    if let Some(id) = &board_id {
        let board = resources
            .boards
            .get(id)
            .ok_or_else(|| ResolveError::UnknownBoard { board: id.clone() })?;
        config.set_board(Some(id.clone()))?;
        config.set_fpga_id(Some(board.fpga_id.clone()))?;
    }
    config.set_fpga_id(seed.fpga.clone())?;

    let fpga_id = config
        .fpga_id()
        .map(str::to_string)
        .ok_or(ResolveError::MissingBoard)?;
    let fpga = resources
        .fpgas
        .get(&fpga_id)
        .ok_or_else(|| ResolveError::UnknownFpga {
            fpga: fpga_id.clone(),
        })?;

    config.set_arch(Some(fpga.arch))?;
    config.set_fpga_type(Some(fpga.fpga_type.clone()))?;
    config.set_size(Some(fpga.size.clone()))?;
    config.set_pack(fpga.pack.clone())?;
    config.set_idcode(fpga.idcode.clone())?;
    config.set_part_num(Some(fpga.part_num.clone()))?;
    config.set_speed(fpga.speed.clone())?;

    config.set_arch(seed.arch)?;
    config.set_fpga_type(seed.fpga_type.clone())?;
    config.set_size(seed.size.clone())?;
    config.set_pack(seed.pack.clone())?;
    config.set_idcode(seed.idcode.clone())?;

    let arch = config.arch.unwrap_or(fpga.arch);
    let mut required = vec![("type", &config.fpga_type), ("size", &config.size)];
    if arch.requires_pack() {
        required.push(("pack", &config.pack));
    }
    for (field, value) in required {
        if value.is_none() {
            return Err(ResolveError::MissingField {
                field: field.to_string(),
            });
        }
    }

    let top_module = seed
        .top_module
        .clone()
        .or_else(|| project.and_then(Project::top_module).map(str::to_string));
    match top_module {
        Some(top) => config.set_top_module(Some(top))?,
        None => {
            let notice = format!(
                "Using the default top module '{DEFAULT_TOP_MODULE}'. \
                 Set 'top-module' in apio.ini to use another one."
            );
            info!("{notice}");
            notices.push(notice);
            config.set_top_module(Some(DEFAULT_TOP_MODULE.to_string()))?;
        }
    }

    config.set_testbench(
        seed.testbench
            .clone()
            .or_else(|| project.and_then(Project::default_testbench).map(str::to_string)),
    )?;
    config.set_graph_spec(seed.graph_spec.clone())?;
    config.set_yosys_synth_extra_options(
        project
            .and_then(Project::yosys_synth_extra_options)
            .map(str::to_string),
    )?;
    config.set_platform_id(Some(resources.platform_id.clone()))?;
    config.set_verbose_all(Some(seed.verbose_all))?;
    config.set_verbose_synth(Some(seed.verbose_synth))?;
    config.set_verbose_pnr(Some(seed.verbose_pnr))?;

    Ok(Resolved {
        flags: config.to_flags(),
        config,
        board_id,
        arch,
        notices,
    })
}
