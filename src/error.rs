//! Error types for apio
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::schema::Violation;

/// Remediation hint attached to every package lifecycle error.
fn reinstall_hint(name: &str) -> String {
    format!("Run 'apio packages --install --force {name}' to fix it.")
}

/// Bundled or project resource file errors
#[derive(Error, Debug)]
pub enum ResourceError {
    /// Resource file does not exist
    #[error("Resource file '{name}' not found")]
    NotFound { name: String },

    /// Resource file could not be read
    #[error("Failed to read resource file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Resource file is not valid JSON after comment stripping
    #[error("Invalid JSON in '{name}' at line {line}, column {column}: {error}")]
    Parse {
        name: String,
        line: usize,
        column: usize,
        error: String,
    },

    /// Resource file top level is not an object
    #[error("Resource file '{name}' must contain a JSON object")]
    NotAnObject { name: String },

    /// A resource entry failed schema validation
    #[error("Invalid entry '{id}' in '{name}': {}", join_violations(.violations))]
    Schema {
        name: String,
        id: String,
        violations: Vec<Violation>,
    },

    /// A package is restricted to a platform that is not defined
    #[error("Package '{package}' is restricted to unknown platform '{platform}'")]
    UnknownRestrictionPlatform { package: String, platform: String },

    /// Package env template error
    #[error(transparent)]
    Template(#[from] TemplateError),
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Package env template errors
#[derive(Error, Debug, PartialEq)]
pub enum TemplateError {
    /// `%p` used anywhere other than as the leading path segment
    #[error("Invalid env template '{template}' in package '{package}': '%p' is only allowed as '%p' or '%p/...'")]
    InvalidEnvTemplate { package: String, template: String },
}

/// Platform identification errors
#[derive(Error, Debug, PartialEq)]
pub enum PlatformError {
    /// Platform id not in the platforms table
    #[error("Unknown platform id '{platform_id}'. Run 'apio system --platforms' to list the supported platforms.")]
    UnknownPlatform { platform_id: String },
}

/// Project file (apio.ini) errors
#[derive(Error, Debug, PartialEq)]
pub enum ProjectError {
    /// Project file could not be read
    #[error("Failed to read '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Malformed line
    #[error("Syntax error in '{path}' line {line}: {message}")]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Section other than [env]
    #[error("Unknown section '[{section}]' in '{path}', only [env] is supported")]
    UnknownSection { path: PathBuf, section: String },

    /// Option that apio does not know
    #[error("Unknown option '{option}' in '{path}'")]
    UnknownOption { path: PathBuf, option: String },

    /// Option given more than once
    #[error("Option '{option}' appears more than once in '{path}'")]
    DuplicateOption { path: PathBuf, option: String },

    /// File has no [env] section
    #[error("Missing [env] section in '{path}'")]
    MissingEnvSection { path: PathBuf },
}

/// Build configuration resolution errors
#[derive(Error, Debug, PartialEq)]
pub enum ResolveError {
    /// Board id not in the boards table
    #[error("Unknown board '{board}'. Run 'apio boards' to list the supported boards.")]
    UnknownBoard { board: String },

    /// FPGA id not in the fpgas table
    #[error("Unknown fpga '{fpga}'. Run 'apio fpgas' to list the supported fpgas.")]
    UnknownFpga { fpga: String },

    /// Board references a programmer that is not defined
    #[error("Board '{board}' references unknown programmer '{programmer}'")]
    UnknownProgrammer { board: String, programmer: String },

    /// Neither a board nor an fpga could be resolved
    #[error(
        "Insufficient arguments: missing board. Specify a board in one of these ways:\n\
         \x20 1. change to a directory that contains an apio.ini file\n\
         \x20 2. use --project-dir to point to a directory with an apio.ini file\n\
         \x20 3. create an apio.ini file with a 'board' option in its [env] section\n\
         \x20 4. pass --board <board> (or --fpga <fpga>) on the command line"
    )]
    MissingBoard,

    /// A required fpga field is still unset after merging
    #[error("Insufficient arguments: missing '{field}'")]
    MissingField { field: String },

    /// A field was set twice with different values
    #[error("contradictory argument values: '{field}' = ({new} vs {old})")]
    Contradiction {
        field: String,
        new: String,
        old: String,
    },
}

/// Profile store errors
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Profile could not be read
    #[error("Failed to read profile '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Profile is not valid JSON
    #[error("Failed to parse profile '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Profile could not be written
    #[error("Failed to write profile '{path}': {error}")]
    Write { path: PathBuf, error: String },
}

/// Package lifecycle errors
#[derive(Error, Debug, PartialEq)]
pub enum PackageError {
    /// Package id not in the packages table
    #[error("Unknown package '{name}'. Run 'apio packages --list' to see the available packages.")]
    UnknownPackage { name: String },

    /// Package exists but not for this platform
    #[error("Package '{name}' is not available for platform '{platform}'")]
    NotApplicable { name: String, platform: String },

    /// Required package has no profile record
    #[error("Package '{name}' is not installed. {}", reinstall_hint(.name))]
    NotInstalled { name: String },

    /// Installed version does not satisfy the requirement
    #[error("Package '{name}' version {version} does not match the requirement '{requirement}'. {}", reinstall_hint(.name))]
    VersionMismatch {
        name: String,
        version: String,
        requirement: String,
    },

    /// Profile record exists but the directory is gone
    #[error("Package '{name}' is installed but its directory '{path}' is missing. {}", reinstall_hint(.name))]
    MissingDirectory { name: String, path: PathBuf },

    /// Target version for an install does not satisfy the requirement
    #[error("Version {version} of package '{name}' does not satisfy the requirement '{requirement}'")]
    RequirementUnsatisfied {
        name: String,
        version: String,
        requirement: String,
    },

    /// Remote config does not list the package
    #[error("Remote config has no version for package '{name}'")]
    NoRemoteVersion { name: String },

    /// Archive could not be unpacked
    #[error("Failed to unpack '{archive}': {error}")]
    Unpack { archive: PathBuf, error: String },

    /// Archive format not recognized
    #[error("Unsupported archive format '{archive}'")]
    UnsupportedArchive { archive: PathBuf },
}

/// Download and remote fetch errors
#[derive(Error, Debug, PartialEq)]
pub enum DownloadError {
    /// Connection level failure
    #[error("Network error downloading '{url}': {error}")]
    NetworkError { url: String, error: String },

    /// Server answered with a non success status
    #[error("Server returned HTTP {status} for '{url}'")]
    HttpStatus { url: String, status: u16 },

    /// Request timed out
    #[error("Timeout after {seconds}s fetching '{url}'")]
    Timeout { url: String, seconds: u64 },

    /// Response body could not be decoded
    #[error("Invalid response from '{url}': {error}")]
    InvalidResponse { url: String, error: String },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },

    /// Max retries exceeded
    #[error("Download failed after {retries} retries: {url}")]
    MaxRetriesExceeded { url: String, retries: u32 },

    /// User pressed Ctrl-C
    #[error("Download of '{url}' aborted by user")]
    Interrupted { url: String },
}

/// Filesystem errors
#[derive(Error, Debug, PartialEq)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to remove file
    #[error("Failed to remove file '{path}': {error}")]
    RemoveFile { path: PathBuf, error: String },

    /// Failed to rename
    #[error("Failed to rename '{from}' to '{to}': {error}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Failed to list directory
    #[error("Failed to list directory '{path}': {error}")]
    ReadDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

impl FilesystemError {
    /// Underlying OS error text, without the path
    pub fn reason(&self) -> &str {
        match self {
            Self::CreateDir { error, .. }
            | Self::RemoveDir { error, .. }
            | Self::RemoveFile { error, .. }
            | Self::Rename { error, .. }
            | Self::ReadDir { error, .. }
            | Self::WriteFile { error, .. }
            | Self::ReadFile { error, .. } => error,
        }
    }
}

/// External build tool errors
#[derive(Error, Debug, PartialEq)]
pub enum BuildError {
    /// Tool not found in the package paths or PATH
    #[error("Tool '{tool}' not found. Run 'apio packages --install oss-cad-suite'.")]
    ToolNotFound { tool: String },

    /// Tool could not be started
    #[error("Failed to run '{tool}': {error}")]
    Spawn { tool: String, error: String },
}

/// Broad class of an error, used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad board/fpga, contradictory flags, bad apio.ini
    User,
    /// Packaging or programming defect
    Internal,
    /// Missing or inconsistent toolchain package
    Package,
    /// Download or remote config failure
    Network,
}

/// Top-level apio error type
#[derive(Error, Debug)]
pub enum ApioError {
    /// Resource error
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Platform error
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Project file error
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// Resolution error
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Profile error
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Package error
    #[error(transparent)]
    Package(#[from] PackageError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// Build tool error
    #[error(transparent)]
    Build(#[from] BuildError),
}

impl ApioError {
    /// Classify the error for reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Resource(_) => ErrorKind::Internal,
            Self::Platform(_) | Self::Project(_) | Self::Resolve(_) => ErrorKind::User,
            Self::Package(_) | Self::Build(_) => ErrorKind::Package,
            Self::Download(_) => ErrorKind::Network,
            Self::Profile(_) | Self::Filesystem(_) => ErrorKind::User,
        }
    }
}

/// Classify an error that may be one of the domain errors, directly or
/// wrapped in [`ApioError`].
pub fn kind_of(error: &(dyn std::error::Error + 'static)) -> Option<ErrorKind> {
    if let Some(e) = error.downcast_ref::<ApioError>() {
        return Some(e.kind());
    }
    if error.is::<ResourceError>() || error.is::<TemplateError>() {
        return Some(ErrorKind::Internal);
    }
    if error.is::<PackageError>() || error.is::<BuildError>() {
        return Some(ErrorKind::Package);
    }
    if error.is::<DownloadError>() {
        return Some(ErrorKind::Network);
    }
    if error.is::<PlatformError>()
        || error.is::<ProjectError>()
        || error.is::<ResolveError>()
        || error.is::<ProfileError>()
        || error.is::<FilesystemError>()
    {
        return Some(ErrorKind::User);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contradiction_message_format() {
        let err = ResolveError::Contradiction {
            field: "size".to_string(),
            new: "1k".to_string(),
            old: "8k".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "contradictory argument values: 'size' = (1k vs 8k)"
        );
    }

    #[test]
    fn test_missing_board_lists_remedies() {
        let msg = ResolveError::MissingBoard.to_string();
        assert!(msg.contains("missing board"));
        assert!(msg.contains("--project-dir"));
        assert!(msg.contains("apio.ini"));
        assert!(msg.contains("--board"));
        assert!(msg.contains("--fpga"));
    }

    #[test]
    fn test_package_errors_carry_remediation() {
        let err = PackageError::NotInstalled {
            name: "oss-cad-suite".to_string(),
        };
        assert!(err
            .to_string()
            .contains("apio packages --install --force oss-cad-suite"));
    }

    #[test]
    fn test_error_kinds() {
        let internal: ApioError = ResourceError::NotFound {
            name: "boards.jsonc".to_string(),
        }
        .into();
        assert_eq!(internal.kind(), ErrorKind::Internal);

        let user: ApioError = ResolveError::MissingBoard.into();
        assert_eq!(user.kind(), ErrorKind::User);

        let network: ApioError = DownloadError::Timeout {
            url: "http://x".to_string(),
            seconds: 5,
        }
        .into();
        assert_eq!(network.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_kind_of_bare_and_wrapped() {
        let bare = PackageError::NotInstalled {
            name: "verible".to_string(),
        };
        assert_eq!(kind_of(&bare), Some(ErrorKind::Package));

        let wrapped = ApioError::from(ResourceError::Template(TemplateError::InvalidEnvTemplate {
            package: "p".to_string(),
            template: "bin/%p".to_string(),
        }));
        assert_eq!(kind_of(&wrapped), Some(ErrorKind::Internal));

        let other = std::io::Error::new(std::io::ErrorKind::Other, "x");
        assert_eq!(kind_of(&other), None);
    }

    #[test]
    fn test_filesystem_reason_drops_path() {
        let err = FilesystemError::ReadFile {
            path: PathBuf::from("/tmp/profile.json"),
            error: "permission denied".to_string(),
        };
        assert_eq!(err.reason(), "permission denied");
        assert!(err.to_string().contains("/tmp/profile.json"));
    }
}
