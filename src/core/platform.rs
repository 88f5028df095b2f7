//! Platform identification
//!
//! The platform id (e.g. `linux-x86-64`, `darwin-arm64`, `windows-amd64`)
//! selects which toolchain packages apply to this machine.

use tracing::debug;

use crate::error::PlatformError;

/// Inputs the platform id is computed from.
///
/// Kept separate from the detection so the computation can be tested with
/// arbitrary host values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProbe {
    /// Value of `APIO_PLATFORM`, if set
    pub override_id: Option<String>,
    /// Operating system name
    pub os: String,
    /// Machine architecture
    pub arch: String,
}

impl PlatformProbe {
    /// Probe the running host
    pub fn host(override_id: Option<String>) -> Self {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        // Rust reports aarch64 on Apple Silicon where the platform table
        // uses arm64.
        let arch = match (os, std::env::consts::ARCH) {
            ("darwin", "aarch64") => "arm64",
            (_, other) => other,
        };
        Self {
            override_id,
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }
}

/// Normalize a platform id to the hyphenated form used in resource files.
pub fn normalize_platform_id(id: &str) -> String {
    id.replace('_', "-")
}

/// Compute the platform id and check it against the known platforms.
pub fn determine_platform_id<'a, I>(probe: &PlatformProbe, known: I) -> Result<String, PlatformError>
where
    I: IntoIterator<Item = &'a str>,
{
    let platform_id = if let Some(id) = &probe.override_id {
        debug!("Platform id overridden by environment: {id}");
        normalize_platform_id(id)
    } else {
        let os = probe.os.to_lowercase();
        let raw = if os == "windows" {
            "windows_amd64".to_string()
        } else {
            format!("{os}_{}", probe.arch.to_lowercase())
        };
        normalize_platform_id(&raw)
    };

    if known.into_iter().any(|k| k == platform_id) {
        Ok(platform_id)
    } else {
        Err(PlatformError::UnknownPlatform { platform_id })
    }
}
