//! Core business logic module
//!
//! Resource tables, build configuration resolution and the package
//! lifecycle. Network and process I/O live in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`resources`] - Resource tables and their loaders
//! - [`jsonc`] - JSON with `//` comments
//! - [`schema`] - Resource entry validation
//! - [`platform`] - Platform id detection
//! - [`project`] - apio.ini parsing
//! - [`resolve`] - Build configuration resolution
//! - [`profile`] - Installed packages record
//! - [`packages`] - Package scan and requirement checks
//! - [`installer`] - Package install, uninstall and fix
//! - [`env_plan`] - Tool environment from installed packages
//! - [`context`] - Per-invocation state

pub mod context;
pub mod env_plan;
pub mod installer;
pub mod jsonc;
pub mod packages;
pub mod platform;
pub mod profile;
pub mod project;
pub mod resolve;
pub mod resources;
pub mod schema;
pub mod template;
pub mod version;
