//! Infrastructure layer
//!
//! Handles I/O operations: network, filesystem, archives and external
//! processes.

pub mod dirs;
pub mod download;
pub mod filesystem;
pub mod remote;
pub mod scons;
pub mod unpack;
