//! Resource store
//!
//! Loads the platforms, packages, boards, fpgas and programmers tables plus
//! the apio config from JSONC resource files. Stock files are bundled into
//! the binary. A project directory may replace `boards.jsonc`, `fpgas.jsonc`
//! or `programmers.jsonc` with a file of the same name; such a file replaces
//! the stock table as a whole.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use super::jsonc;
use super::platform::{determine_platform_id, PlatformProbe};
use super::schema::{self, Violation};
use super::template::expand_package_template;
use crate::error::{ApioError, ResolveError, ResourceError, TemplateError};
use crate::infra::filesystem;

/// Ordered id -> definition mapping
pub type ResourceTable<V> = BTreeMap<String, V>;

pub const PLATFORMS_FILE: &str = "platforms.jsonc";
pub const PACKAGES_FILE: &str = "packages.jsonc";
pub const BOARDS_FILE: &str = "boards.jsonc";
pub const FPGAS_FILE: &str = "fpgas.jsonc";
pub const PROGRAMMERS_FILE: &str = "programmers.jsonc";
pub const CONFIG_FILE: &str = "config.jsonc";

const BUNDLED: [(&str, &str); 6] = [
    (PLATFORMS_FILE, include_str!("../../resources/platforms.jsonc")),
    (PACKAGES_FILE, include_str!("../../resources/packages.jsonc")),
    (BOARDS_FILE, include_str!("../../resources/boards.jsonc")),
    (FPGAS_FILE, include_str!("../../resources/fpgas.jsonc")),
    (PROGRAMMERS_FILE, include_str!("../../resources/programmers.jsonc")),
    (CONFIG_FILE, include_str!("../../resources/config.jsonc")),
];

/// A platforms table entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformDescriptor {
    pub description: String,
}

/// A packages table entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PackageDescriptor {
    pub description: String,

    /// Platforms the package applies to, all when absent
    #[serde(default)]
    pub restricted_to_platforms: Option<Vec<String>>,

    pub repository: PackageRepository,

    pub release: PackageRelease,

    #[serde(default)]
    pub env: PackageEnv,
}

impl PackageDescriptor {
    /// Whether the package applies to `platform_id`
    pub fn applies_to(&self, platform_id: &str) -> bool {
        self.restricted_to_platforms
            .as_ref()
            .map_or(true, |platforms| platforms.iter().any(|p| p == platform_id))
    }
}

/// Where a package is published
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageRepository {
    pub organization: String,
    pub name: String,
}

/// Package release layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PackageRelease {
    /// Semver range the installed version must satisfy
    pub requirement: String,

    /// Archive name template (`${PLATFORM}`, `${VERSION}`)
    pub file_name: String,

    /// Name of the directory the archive unpacks into, when it is not the
    /// package directory itself
    #[serde(default)]
    pub uncompressed_name: Option<String>,
}

/// Environment a package contributes to tool invocations
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PackageEnv {
    /// Directories prepended to PATH, in order
    #[serde(default)]
    pub path: Vec<String>,

    /// Variables set for tool invocations
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

/// A boards table entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct BoardDescriptor {
    pub description: String,

    /// Name used by older apio.ini files
    #[serde(default)]
    pub legacy_name: Option<String>,

    pub fpga_id: String,

    pub programmer: BoardProgrammer,

    #[serde(default)]
    pub usb: Option<UsbIds>,
}

/// Programmer reference of a board
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardProgrammer {
    pub id: String,
}

/// USB identification of a board
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct UsbIds {
    pub vid: String,
    pub pid: String,
    #[serde(default)]
    pub product_regex: Option<String>,
}

/// FPGA architecture
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FpgaArch {
    Ice40,
    Ecp5,
    Gowin,
}

impl FpgaArch {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ice40 => "ice40",
            Self::Ecp5 => "ecp5",
            Self::Gowin => "gowin",
        }
    }

    /// Whether fpgas of this architecture must define `pack`
    pub fn requires_pack(self) -> bool {
        matches!(self, Self::Ice40 | Self::Ecp5)
    }
}

impl fmt::Display for FpgaArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FpgaArch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ice40" => Ok(Self::Ice40),
            "ecp5" => Ok(Self::Ecp5),
            "gowin" => Ok(Self::Gowin),
            other => Err(format!(
                "unknown architecture '{other}' (expected ice40, ecp5 or gowin)"
            )),
        }
    }
}

/// An fpgas table entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct FpgaDescriptor {
    #[serde(default)]
    pub description: Option<String>,
    pub part_num: String,
    pub arch: FpgaArch,
    pub size: String,
    #[serde(rename = "type")]
    pub fpga_type: String,
    #[serde(default)]
    pub pack: Option<String>,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub idcode: Option<String>,
}

/// A programmers table entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgrammerDescriptor {
    #[serde(default)]
    pub description: Option<String>,
    pub command: String,
    pub args: String,
}

/// Apio wide settings from `config.jsonc`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ApioConfig {
    /// Remote config url template (`${MAJOR}`, `${MINOR}`)
    pub remote_config_url: String,
    /// Package archive url template
    pub package_download_url: String,
}

/// Where a resource file came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOrigin {
    /// Bundled with apio
    Stock,
    /// Project directory override
    Project(PathBuf),
}

/// A parsed resource file
#[derive(Debug, Clone)]
pub struct LoadedResource {
    pub value: Value,
    pub origin: ResourceOrigin,
}

/// Source of resource files
pub trait ResourceLoader {
    /// Load and parse resource `name`.
    ///
    /// `allow_custom` permits a project override of the file.
    fn load(&self, name: &str, allow_custom: bool) -> Result<LoadedResource, ResourceError>;
}

#[derive(Debug, Clone)]
enum StockSource {
    Bundled,
    Dir(PathBuf),
}

/// Loads the stock resource files
#[derive(Debug, Clone)]
pub struct StockLoader {
    source: StockSource,
}

impl StockLoader {
    /// Resource files bundled into the binary
    pub fn bundled() -> Self {
        Self {
            source: StockSource::Bundled,
        }
    }

    /// Resource files from a directory
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            source: StockSource::Dir(dir.to_path_buf()),
        }
    }
}

impl ResourceLoader for StockLoader {
    fn load(&self, name: &str, _allow_custom: bool) -> Result<LoadedResource, ResourceError> {
        let value = match &self.source {
            StockSource::Bundled => {
                let (_, text) = BUNDLED
                    .iter()
                    .find(|(file, _)| *file == name)
                    .ok_or_else(|| ResourceError::NotFound {
                        name: name.to_string(),
                    })?;
                jsonc::parse(name, text)?
            }
            StockSource::Dir(dir) => {
                let path = dir.join(name);
                if !path.is_file() {
                    return Err(ResourceError::NotFound {
                        name: path.display().to_string(),
                    });
                }
                jsonc::parse(name, &read_resource(&path)?)?
            }
        };
        Ok(LoadedResource {
            value,
            origin: ResourceOrigin::Stock,
        })
    }
}

/// Prefers a same-named file in the project directory over the wrapped
/// loader, for resources that allow custom overrides.
#[derive(Debug, Clone)]
pub struct ProjectOverrideLoader<L> {
    inner: L,
    project_dir: PathBuf,
}

impl<L: ResourceLoader> ProjectOverrideLoader<L> {
    pub fn new(inner: L, project_dir: &Path) -> Self {
        Self {
            inner,
            project_dir: project_dir.to_path_buf(),
        }
    }
}

impl<L: ResourceLoader> ResourceLoader for ProjectOverrideLoader<L> {
    fn load(&self, name: &str, allow_custom: bool) -> Result<LoadedResource, ResourceError> {
        let path = self.project_dir.join(name);
        if allow_custom && path.is_file() {
            info!("Loading custom '{}'", path.display());
            let value = jsonc::parse(&path.display().to_string(), &read_resource(&path)?)?;
            return Ok(LoadedResource {
                value,
                origin: ResourceOrigin::Project(path),
            });
        }
        self.inner.load(name, allow_custom)
    }
}

fn read_resource(path: &Path) -> Result<String, ResourceError> {
    filesystem::read_file(path).map_err(|e| ResourceError::Read {
        path: path.to_path_buf(),
        error: e.reason().to_string(),
    })
}

/// Validate and deserialize every entry of a loaded table.
fn parse_table<V: DeserializeOwned>(
    name: &str,
    value: Value,
    validate: fn(&Value) -> Vec<Violation>,
) -> Result<ResourceTable<V>, ResourceError> {
    let Value::Object(entries) = value else {
        return Err(ResourceError::NotAnObject {
            name: name.to_string(),
        });
    };
    let mut table = ResourceTable::new();
    for (id, entry) in entries {
        let violations = validate(&entry);
        if !violations.is_empty() {
            return Err(ResourceError::Schema {
                name: name.to_string(),
                id,
                violations,
            });
        }
        let parsed = serde_json::from_value(entry).map_err(|e| ResourceError::Schema {
            name: name.to_string(),
            id: id.clone(),
            violations: vec![Violation::new("", e.to_string())],
        })?;
        table.insert(id, parsed);
    }
    Ok(table)
}

/// Expand the `%p` templates of every package in place.
pub fn resolve_package_envs(
    packages: &mut ResourceTable<PackageDescriptor>,
    packages_dir: &Path,
) -> Result<(), TemplateError> {
    for (id, package) in packages.iter_mut() {
        let package_path = packages_dir.join(id);
        for entry in &mut package.env.path {
            *entry = expand_package_template(id, entry, &package_path)?;
        }
        for value in package.env.vars.values_mut() {
            *value = expand_package_template(id, value, &package_path)?;
        }
    }
    Ok(())
}

/// Packages that apply to `platform_id`.
///
/// Every platform named in a restriction must be a known platform.
pub fn select_packages_for_platform(
    all_packages: &ResourceTable<PackageDescriptor>,
    platform_id: &str,
    platforms: &ResourceTable<PlatformDescriptor>,
) -> Result<ResourceTable<PackageDescriptor>, ResourceError> {
    let mut selected = ResourceTable::new();
    for (id, package) in all_packages {
        for platform in package.restricted_to_platforms.iter().flatten() {
            if !platforms.contains_key(platform) {
                return Err(ResourceError::UnknownRestrictionPlatform {
                    package: id.clone(),
                    platform: platform.clone(),
                });
            }
        }
        if package.applies_to(platform_id) {
            selected.insert(id.clone(), package.clone());
        } else {
            debug!("Package '{id}' does not apply to '{platform_id}'");
        }
    }
    Ok(selected)
}

/// Board, fpga and programmer of a project, following the board's links
#[derive(Debug, Clone, Copy)]
pub struct ProjectResourceBundle<'a> {
    pub board_id: &'a str,
    pub board: &'a BoardDescriptor,
    pub fpga_id: &'a str,
    pub fpga: &'a FpgaDescriptor,
    pub programmer_id: &'a str,
    pub programmer: &'a ProgrammerDescriptor,
}

/// All resource tables for one apio invocation
#[derive(Debug, Clone)]
pub struct ApioResources {
    /// Platform id of this machine
    pub platform_id: String,
    pub platforms: ResourceTable<PlatformDescriptor>,
    /// Every package, before platform filtering
    pub all_packages: ResourceTable<PackageDescriptor>,
    /// Packages that apply to `platform_id`
    pub platform_packages: ResourceTable<PackageDescriptor>,
    pub boards: ResourceTable<BoardDescriptor>,
    pub fpgas: ResourceTable<FpgaDescriptor>,
    pub programmers: ResourceTable<ProgrammerDescriptor>,
    pub config: ApioConfig,
    /// Informational messages produced while loading
    pub notices: Vec<String>,
}

impl ApioResources {
    /// Load every table through `loader`.
    ///
    /// Package env templates are expanded against `packages_dir`.
    pub fn load(
        loader: &dyn ResourceLoader,
        probe: &PlatformProbe,
        packages_dir: &Path,
    ) -> Result<Self, ApioError> {
        let mut notices = Vec::new();
        let mut load = |name: &str, allow_custom: bool| -> Result<Value, ResourceError> {
            let loaded = loader.load(name, allow_custom)?;
            if let ResourceOrigin::Project(path) = &loaded.origin {
                notices.push(format!("Loading custom '{}'.", path.display()));
            }
            Ok(loaded.value)
        };

        let platforms: ResourceTable<PlatformDescriptor> =
            parse_table(PLATFORMS_FILE, load(PLATFORMS_FILE, false)?, schema::validate_platform)?;
        let platform_id = determine_platform_id(probe, platforms.keys().map(String::as_str))?;
        debug!("Platform id: {platform_id}");

        let mut all_packages: ResourceTable<PackageDescriptor> =
            parse_table(PACKAGES_FILE, load(PACKAGES_FILE, false)?, schema::validate_package)?;
        resolve_package_envs(&mut all_packages, packages_dir).map_err(ResourceError::from)?;
        let platform_packages =
            select_packages_for_platform(&all_packages, &platform_id, &platforms)?;

        let boards = parse_table(BOARDS_FILE, load(BOARDS_FILE, true)?, schema::validate_board)?;
        let fpgas = parse_table(FPGAS_FILE, load(FPGAS_FILE, true)?, schema::validate_fpga)?;
        let programmers = parse_table(
            PROGRAMMERS_FILE,
            load(PROGRAMMERS_FILE, true)?,
            schema::validate_programmer,
        )?;

        let config: ApioConfig =
            serde_json::from_value(load(CONFIG_FILE, false)?).map_err(|e| {
                ResourceError::Schema {
                    name: CONFIG_FILE.to_string(),
                    id: "config".to_string(),
                    violations: vec![Violation::new("", e.to_string())],
                }
            })?;

        Ok(Self {
            platform_id,
            platforms,
            all_packages,
            platform_packages,
            boards,
            fpgas,
            programmers,
            config,
            notices,
        })
    }

    /// Resolve a board name to its id, accepting legacy names.
    ///
    /// Returns the id and whether `name` was a legacy name.
    pub fn canonical_board_id(&self, name: &str) -> Option<(&str, bool)> {
        if let Some((id, _)) = self.boards.get_key_value(name) {
            return Some((id.as_str(), false));
        }
        self.boards
            .iter()
            .find(|(_, board)| board.legacy_name.as_deref() == Some(name))
            .map(|(id, _)| (id.as_str(), true))
    }

    /// Follow board -> fpga -> programmer for `board_id`.
    pub fn project_bundle(&self, board_id: &str) -> Result<ProjectResourceBundle<'_>, ResolveError> {
        let (board_id, board) =
            self.boards
                .get_key_value(board_id)
                .ok_or_else(|| ResolveError::UnknownBoard {
                    board: board_id.to_string(),
                })?;
        let (fpga_id, fpga) =
            self.fpgas
                .get_key_value(&board.fpga_id)
                .ok_or_else(|| ResolveError::UnknownFpga {
                    fpga: board.fpga_id.clone(),
                })?;
        let (programmer_id, programmer) = self
            .programmers
            .get_key_value(&board.programmer.id)
            .ok_or_else(|| ResolveError::UnknownProgrammer {
                board: board_id.clone(),
                programmer: board.programmer.id.clone(),
            })?;
        Ok(ProjectResourceBundle {
            board_id,
            board,
            fpga_id,
            fpga,
            programmer_id,
            programmer,
        })
    }
}
