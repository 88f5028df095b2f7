//! Remote locations

/// Apio project page, shown in internal error reports
pub const ISSUES_URL: &str = "https://github.com/FPGAwars/apio/issues";
