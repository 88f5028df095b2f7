//! Default configuration values

/// Top module used when neither the command line nor apio.ini name one
pub const DEFAULT_TOP_MODULE: &str = "main";

/// Project file name
pub const PROJECT_FILE: &str = "apio.ini";

/// Profile file name, under the apio home directory
pub const PROFILE_FILE: &str = "profile.json";

/// Apio home directory name, under the user's home
pub const HOME_DIR_NAME: &str = ".apio";

/// Packages directory name, under the apio home directory
pub const PACKAGES_DIR_NAME: &str = "packages";

/// Timeout for remote config fetches (in seconds)
pub const REMOTE_CONFIG_TIMEOUT_SECS: u64 = 5;

/// Timeout for package downloads (in seconds)
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Connect timeout for package downloads (in seconds)
pub const DOWNLOAD_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of download retry attempts
pub const MAX_DOWNLOAD_RETRIES: u32 = 3;

/// Packages every build type command needs
pub const BUILD_PACKAGES: &[&str] = &["oss-cad-suite"];

/// Extra packages the graph command needs
pub const GRAPH_PACKAGES: &[&str] = &["graphviz"];

/// Extra packages the upload command needs
pub const UPLOAD_PACKAGES: &[&str] = &["drivers"];
