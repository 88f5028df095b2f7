//! Apio - Open source FPGA toolchain orchestrator
//!
//! This library resolves FPGA build configurations from boards, fpgas and
//! project settings, manages the toolchain packages they need, and drives
//! SCons to build, simulate and upload designs.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic: resources, projects, resolution, packages
//! - [`infra`] - Infrastructure layer (network, filesystem, processes)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
