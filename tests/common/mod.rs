//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

use apio::core::context::{ApioContext, ProjectScope};
use apio::core::platform::PlatformProbe;
use apio::core::resources::StockLoader;
use apio::infra::dirs::ApioDirs;

/// Platform every test runs as
pub const TEST_PLATFORM: &str = "linux-x86-64";

/// Test project context
///
/// A temporary project directory plus a separate temporary apio home.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
    /// Temporary apio home directory
    pub home: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
            home: TempDir::new().expect("Failed to create temp home"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Get the packages directory under the test home
    pub fn packages_dir(&self) -> PathBuf {
        self.home.path().join("packages")
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Write `apio.ini`
    pub fn write_ini(&self, content: &str) {
        self.create_file("apio.ini", content);
    }

    /// Mark a package as installed: profile record plus directory.
    pub fn install_fake_package(&self, name: &str, version: &str) {
        std::fs::create_dir_all(self.packages_dir().join(name).join("bin"))
            .expect("Failed to create package directory");
        let mut profile = self.read_profile();
        profile["installed-packages"][name] = serde_json::json!({ "version": version });
        std::fs::write(
            self.home.path().join("profile.json"),
            serde_json::to_string_pretty(&profile).expect("Failed to serialize profile"),
        )
        .expect("Failed to write profile");
    }

    /// The profile as JSON, empty when missing
    pub fn read_profile(&self) -> serde_json::Value {
        let path = self.home.path().join("profile.json");
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).expect("Failed to parse profile"),
            Err(_) => serde_json::json!({ "installed-packages": {} }),
        }
    }

    /// Context for this project with the bundled resources
    pub fn context(&self, scope: ProjectScope) -> ApioContext {
        self.context_with(StockLoader::bundled(), scope)
    }

    /// Context for this project with explicit stock resources
    pub fn context_with(&self, stock: StockLoader, scope: ProjectScope) -> ApioContext {
        ApioContext::load_with(
            ApioDirs::with_home(self.home.path()),
            stock,
            &test_probe(),
            self.dir.path(),
            scope,
        )
        .expect("Failed to load context")
    }

    /// Run the apio binary in the project directory
    pub fn apio(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_apio"))
            .current_dir(self.dir.path())
            .env("APIO_HOME", self.home.path())
            .env("APIO_PLATFORM", TEST_PLATFORM)
            .env_remove("APIO_PACKAGES_DIR")
            .env_remove("APIO_REMOTE_CONFIG_URL")
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .expect("Failed to execute apio")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Platform probe pinned to [`TEST_PLATFORM`]
pub fn test_probe() -> PlatformProbe {
    PlatformProbe {
        override_id: Some(TEST_PLATFORM.to_string()),
        os: "linux".to_string(),
        arch: "x86_64".to_string(),
    }
}

/// Copy the bundled resource files into `dir`, pointing the config at `base_url`.
pub fn write_resources(dir: &Path, base_url: &str) {
    let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("resources");
    for entry in std::fs::read_dir(&source).expect("Failed to read resources") {
        let entry = entry.expect("Failed to read resource entry");
        std::fs::copy(entry.path(), dir.join(entry.file_name()))
            .expect("Failed to copy resource");
    }
    let config = format!(
        "{{\n  \"remote-config-url\": \"{base_url}/remote-config.jsonc\",\n  \
         \"package-download-url\": \"{base_url}/${{REPOSITORY}}/${{VERSION}}/${{FILE_NAME}}\"\n}}\n"
    );
    std::fs::write(dir.join("config.jsonc"), config).expect("Failed to write config");
}

/// Gzipped tar holding `files` (relative path, content)
pub fn make_tgz(files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content.as_bytes())
            .expect("Failed to append tar entry");
    }
    builder
        .into_inner()
        .expect("Failed to finish tar")
        .finish()
        .expect("Failed to finish gzip")
}

/// Sample apio.ini for an icezum project
pub const SAMPLE_INI: &str = "\
; Apio project file
[env]
board = icezum
top-module = blinky
";
