//! Configuration and constants
//!
//! - [`defaults`] - Default values and file names
//! - [`env`] - Environment variables apio reads
//! - [`urls`] - Remote locations

pub mod defaults;
pub mod env;
pub mod urls;
