//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars, status
//! lines and errors to the user.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;

use crate::config::urls::ISSUES_URL;
use crate::error::{kind_of, ErrorKind};
use crate::infra::download::ProgressCallback;

static QUIET: AtomicBool = AtomicBool::new(false);

/// Console settings from the global flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub quiet: bool,
    pub verbose: u8,
}

impl OutputConfig {
    pub fn new(quiet: bool, verbose: u8) -> Self {
        Self { quiet, verbose }
    }

    /// Log level for the tracing subscriber
    pub fn log_level(&self) -> Level {
        match (self.quiet, self.verbose) {
            (true, _) => Level::ERROR,
            (false, 0) => Level::WARN,
            (false, 1) => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    /// Make the settings visible to the output helpers
    pub fn apply_global(&self) {
        QUIET.store(self.quiet, Ordering::Relaxed);
    }
}

/// Whether `--quiet` was given
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print informational notices unless quiet
pub fn print_notices(notices: &[String]) {
    if is_quiet() {
        return;
    }
    for notice in notices {
        println!("{} {notice}", status::INFO);
    }
}

/// Print an error, framed by its kind.
pub fn display_error(error: &anyhow::Error) {
    let kind = error.chain().find_map(kind_of).unwrap_or(ErrorKind::User);
    match kind {
        ErrorKind::Internal => {
            eprintln!("{} [Internal] {error}", status::ERROR);
            eprintln!("  This is an apio bug, please report it at {ISSUES_URL}");
        }
        _ => eprintln!("{} Error: {error}", status::ERROR),
    }
    for cause in error.chain().skip(1) {
        eprintln!("  Caused by: {cause}");
    }
}

/// Create a progress bar for downloads
pub fn create_download_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░"),
    );
    pb
}

/// Download progress callback drawing a bar for `name`
pub fn download_progress(name: &str) -> ProgressCallback {
    let pb = create_download_bar(0);
    pb.set_message(name.to_string());
    Box::new(move |downloaded, total| {
        if total > 0 {
            pb.set_length(total);
        }
        pb.set_position(downloaded);
        if total > 0 && downloaded >= total {
            pb.finish_and_clear();
        }
    })
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}
