//! Project file (`apio.ini`)
//!
//! An INI file with a single `[env]` section:
//!
//! ```ini
//! ; Alhambra II blinky
//! [env]
//! board = alhambra-ii
//! top-module = blinky
//! ```
//!
//! Lines are `[section]`, `key = value` (or `key: value`), blank, or
//! comments starting with `;` or `#`. Keys are case-insensitive.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::defaults::PROJECT_FILE;
use crate::error::ProjectError;

/// The only section apio.ini may contain
pub const ENV_SECTION: &str = "env";

/// Options accepted in the `[env]` section
pub const KNOWN_OPTIONS: [&str; 4] = [
    "board",
    "top-module",
    "default-testbench",
    "yosys-synth-extra-options",
];

/// One classified line of an INI file
#[derive(Debug, PartialEq, Eq)]
enum IniLine<'a> {
    Blank,
    Section(&'a str),
    Option(&'a str, &'a str),
}

fn classify_line(line: &str) -> Result<IniLine<'_>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
        return Ok(IniLine::Blank);
    }
    if let Some(rest) = line.strip_prefix('[') {
        let name = rest
            .strip_suffix(']')
            .ok_or_else(|| "missing closing ']'".to_string())?
            .trim();
        if name.is_empty() {
            return Err("empty section name".to_string());
        }
        return Ok(IniLine::Section(name));
    }
    let split = line
        .find(['=', ':'])
        .ok_or_else(|| format!("expected 'key = value', found '{line}'"))?;
    let key = line[..split].trim();
    if key.is_empty() {
        return Err("missing option name".to_string());
    }
    Ok(IniLine::Option(key, line[split + 1..].trim()))
}

/// A loaded apio.ini
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    path: PathBuf,
    options: BTreeMap<String, String>,
}

impl Project {
    /// Load `<dir>/apio.ini`. A missing file means there is no project.
    pub fn load(dir: &Path) -> Result<Option<Self>, ProjectError> {
        let path = dir.join(PROJECT_FILE);
        if !path.is_file() {
            debug!("No project file at {}", path.display());
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|e| ProjectError::Read {
            path: path.clone(),
            error: e.to_string(),
        })?;
        Self::parse(&path, &text).map(Some)
    }

    /// Parse apio.ini text. `path` is used for error messages.
    pub fn parse(path: &Path, text: &str) -> Result<Self, ProjectError> {
        let mut options = BTreeMap::new();
        let mut section: Option<String> = None;
        let mut seen_env = false;

        for (index, line) in text.lines().enumerate() {
            let parsed = classify_line(line).map_err(|message| ProjectError::Syntax {
                path: path.to_path_buf(),
                line: index + 1,
                message,
            })?;
            match parsed {
                IniLine::Blank => {}
                IniLine::Section(name) => {
                    if name != ENV_SECTION {
                        return Err(ProjectError::UnknownSection {
                            path: path.to_path_buf(),
                            section: name.to_string(),
                        });
                    }
                    seen_env = true;
                    section = Some(name.to_string());
                }
                IniLine::Option(key, value) => {
                    let key = key.to_lowercase();
                    if section.is_none() {
                        return Err(ProjectError::Syntax {
                            path: path.to_path_buf(),
                            line: index + 1,
                            message: format!("option '{key}' outside of a section"),
                        });
                    }
                    if !KNOWN_OPTIONS.contains(&key.as_str()) {
                        return Err(ProjectError::UnknownOption {
                            path: path.to_path_buf(),
                            option: key,
                        });
                    }
                    if options.contains_key(&key) {
                        return Err(ProjectError::DuplicateOption {
                            path: path.to_path_buf(),
                            option: key,
                        });
                    }
                    options.insert(key, value.to_string());
                }
            }
        }

        if !seen_env {
            return Err(ProjectError::MissingEnvSection {
                path: path.to_path_buf(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            options,
        })
    }

    /// Path of the apio.ini file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value of an `[env]` option, if set and non-empty
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn board(&self) -> Option<&str> {
        self.option("board")
    }

    pub fn top_module(&self) -> Option<&str> {
        self.option("top-module")
    }

    pub fn default_testbench(&self) -> Option<&str> {
        self.option("default-testbench")
    }

    pub fn yosys_synth_extra_options(&self) -> Option<&str> {
        self.option("yosys-synth-extra-options")
    }
}
