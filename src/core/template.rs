//! Package env templates
//!
//! Package `env.path` entries and `env.vars` values may start with `%p`,
//! which stands for the package's install directory.

use std::path::Path;

use crate::error::TemplateError;

/// Placeholder for the package install directory
pub const PACKAGE_PATH_MARKER: &str = "%p";

/// Expand a single package env template.
///
/// `%p` alone becomes the package path, `%p/<rest>` becomes
/// `<package path>/<rest>`. Templates without `%p` are returned unchanged.
/// Any other use of `%p` is an error.
pub fn expand_package_template(
    package: &str,
    template: &str,
    package_path: &Path,
) -> Result<String, TemplateError> {
    if template == PACKAGE_PATH_MARKER {
        return Ok(package_path.display().to_string());
    }

    if let Some(rest) = template.strip_prefix("%p/") {
        if !rest.contains(PACKAGE_PATH_MARKER) {
            return Ok(package_path.join(rest).display().to_string());
        }
    } else if !template.contains(PACKAGE_PATH_MARKER) {
        return Ok(template.to_string());
    }

    Err(TemplateError::InvalidEnvTemplate {
        package: package.to_string(),
        template: template.to_string(),
    })
}

/// Replace `${NAME}` placeholders from a list of (name, value) pairs.
///
/// Unknown placeholders are left in place.
pub fn substitute_vars(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("${{{name}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn pkg_path() -> PathBuf {
        PathBuf::from("/home/user/.apio/packages/oss-cad-suite")
    }

    #[test]
    fn test_bare_marker() {
        assert_eq!(
            expand_package_template("oss-cad-suite", "%p", &pkg_path()).unwrap(),
            pkg_path().display().to_string()
        );
    }

    #[test]
    fn test_marker_prefix() {
        assert_eq!(
            expand_package_template("oss-cad-suite", "%p/bin", &pkg_path()).unwrap(),
            pkg_path().join("bin").display().to_string()
        );
    }

    #[test]
    fn test_no_marker_unchanged() {
        assert_eq!(
            expand_package_template("oss-cad-suite", "1", &pkg_path()).unwrap(),
            "1"
        );
    }

    #[test]
    fn test_marker_not_prefix_rejected() {
        let err = expand_package_template("oss-cad-suite", "bin/%p", &pkg_path()).unwrap_err();
        assert_eq!(
            err,
            TemplateError::InvalidEnvTemplate {
                package: "oss-cad-suite".to_string(),
                template: "bin/%p".to_string(),
            }
        );
    }

    #[test]
    fn test_marker_glued_to_text_rejected() {
        assert!(expand_package_template("p", "%pbin", &pkg_path()).is_err());
        assert!(expand_package_template("p", "%p/bin/%p", &pkg_path()).is_err());
    }

    #[test]
    fn test_substitute_vars() {
        let out = substitute_vars(
            "apio-${NAME}-${PLATFORM}-${VERSION}.tgz",
            &[("PLATFORM", "linux-x86-64"), ("VERSION", "0.2.3")],
        );
        assert_eq!(out, "apio-${NAME}-linux-x86-64-0.2.3.tgz");
    }
}
