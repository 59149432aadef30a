mod hash;

pub use hash::compute_hash;

use std::path::Path;

/// Name of the optional per-project configuration file
pub const CONFIG_FILE: &str = "vendor-cleanup.json";

/// Current tool version
pub const CLEANUP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convert every backslash to a forward slash
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Last segment of a path, treating `/` and `\` alike
pub fn basename(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
}

/// Render a path as a string with forward slashes
pub fn path_to_string(path: &Path) -> String {
    normalize_separators(&path.to_string_lossy())
}

/// Strip `base` from the front of `path`, falling back to the path itself.
pub fn to_relative_path(path: &str, base: &str) -> String {
    let path = normalize_separators(path);
    let base = normalize_separators(base);
    let base = base.trim_end_matches('/');

    if base.is_empty() {
        return path;
    }

    match path.strip_prefix(base).and_then(|rest| rest.strip_prefix('/')) {
        Some(rest) => rest.to_string(),
        None => path,
    }
}

/// Get current timestamp in ISO 8601 format
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_separators_converts_backslashes() {
        assert_eq!(
            normalize_separators("C:\\Users\\test\\file.php"),
            "C:/Users/test/file.php"
        );
    }

    #[test]
    fn test_normalize_separators_handles_mixed() {
        assert_eq!(
            normalize_separators("C:\\Users/test\\file.php"),
            "C:/Users/test/file.php"
        );
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("/var/app/config/app.php"), "app.php");
        assert_eq!(basename("C:\\app\\config\\app.php"), "app.php");
        assert_eq!(basename("app.php"), "app.php");
    }

    #[test]
    fn test_to_relative_path_strips_base() {
        assert_eq!(
            to_relative_path("/srv/app/config/app.php", "/srv/app"),
            "config/app.php"
        );
        assert_eq!(
            to_relative_path("/srv/app/config/app.php", "/srv/app/"),
            "config/app.php"
        );
    }

    #[test]
    fn test_to_relative_path_windows() {
        assert_eq!(
            to_relative_path("C:\\srv\\app\\config\\app.php", "C:\\srv\\app"),
            "config/app.php"
        );
    }

    #[test]
    fn test_to_relative_path_outside_base() {
        assert_eq!(
            to_relative_path("/other/config/app.php", "/srv/app"),
            "/other/config/app.php"
        );
        // A sibling directory sharing a prefix is not inside the base
        assert_eq!(
            to_relative_path("/srv/application/x.php", "/srv/app"),
            "/srv/application/x.php"
        );
    }

    #[test]
    fn test_now_iso_is_rfc3339() {
        assert!(chrono::DateTime::parse_from_rfc3339(&now_iso()).is_ok());
    }
}
