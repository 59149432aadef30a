use crate::utils::{basename, normalize_separators};

/// Where the files of one side of a category live.
///
/// Vendor layouts have a `package_dir`: files sit under
/// `<root>/<vendor>/<package>/<package_dir>/`. Local layouts have none: files
/// sit directly under `<root>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLayout {
    /// Absolute directory, forward slashes, no trailing slash
    pub root: String,
    /// Directory inside each package, for vendor layouts
    pub package_dir: Option<String>,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Accepted filename endings, e.g. `.php`
    pub suffixes: Vec<String>,
    /// Path fragments (relative to `root`) that exclude a file
    pub excluded_fragments: Vec<String>,
    /// Filename fragments that exclude a file
    pub excluded_names: Vec<String>,
}

impl FileLayout {
    pub fn local(root: &str, recursive: bool, suffixes: &[&str]) -> Self {
        Self {
            root: clean_dir(root),
            package_dir: None,
            recursive,
            suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
            excluded_fragments: Vec::new(),
            excluded_names: Vec::new(),
        }
    }

    pub fn vendor(root: &str, package_dir: &str, recursive: bool, suffixes: &[&str]) -> Self {
        Self {
            package_dir: Some(package_dir.trim_matches(|c: char| c == '/' || c == '\\').replace('\\', "/")),
            ..Self::local(root, recursive, suffixes)
        }
    }

    pub fn with_exclusions(mut self, fragments: &[String], names: &[String]) -> Self {
        self.excluded_fragments = fragments.to_vec();
        self.excluded_names = names.to_vec();
        self
    }

    /// Does `path` (absolute) belong to this layout?
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize_separators(path);
        let Some(rest) = path.strip_prefix(&format!("{}/", self.root)) else {
            return false;
        };

        let segments: Vec<&str> = rest.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return false;
        }

        let file_segments = match &self.package_dir {
            Some(package_dir) => {
                let dir_segments: Vec<&str> = package_dir.split('/').collect();
                // <vendor>/<package>/<package_dir...>/<file...>
                if segments.len() < 2 + dir_segments.len() + 1 {
                    return false;
                }
                if segments[2..2 + dir_segments.len()] != dir_segments[..] {
                    return false;
                }
                segments.len() - 2 - dir_segments.len()
            }
            None => segments.len(),
        };

        if !self.recursive && file_segments != 1 {
            return false;
        }

        self.accepts(&path)
    }

    /// Suffix and exclusion checks, independent of directory structure
    pub fn accepts(&self, path: &str) -> bool {
        let path = normalize_separators(path);
        let name = basename(&path);

        if !self.suffixes.iter().any(|s| name.ends_with(s.as_str())) {
            return false;
        }

        let relative = match path.strip_prefix(&self.root) {
            Some(rest) => rest.to_string(),
            None => format!("/{}", path.trim_start_matches('/')),
        };
        if self
            .excluded_fragments
            .iter()
            .any(|fragment| relative.contains(fragment.as_str()))
        {
            return false;
        }

        !self
            .excluded_names
            .iter()
            .any(|fragment| name.contains(fragment.as_str()))
    }
}

fn clean_dir(dir: &str) -> String {
    let dir = normalize_separators(dir);
    let trimmed = dir.trim_end_matches('/');
    if trimmed.is_empty() && dir.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrations() -> FileLayout {
        FileLayout::vendor("/app/vendor", "database/migrations", false, &[".php", ".php.stub"])
            .with_exclusions(
                &["/tests/".to_string(), "/stubs/".to_string()],
                &["testbench".to_string()],
            )
    }

    #[test]
    fn test_vendor_layout_matches_package_dir() {
        let layout = FileLayout::vendor("/app/vendor", "config", false, &[".php"]);
        assert!(layout.matches("/app/vendor/laravel/horizon/config/horizon.php"));
        assert!(!layout.matches("/app/vendor/laravel/horizon/config/sub/horizon.php"));
        assert!(!layout.matches("/app/vendor/laravel/config/horizon.php"));
        assert!(!layout.matches("/app/vendor/laravel/horizon/src/config/horizon.php"));
        assert!(!layout.matches("/app/vendor/laravel/horizon/config/horizon.json"));
    }

    #[test]
    fn test_recursive_vendor_layout() {
        let layout = FileLayout::vendor("/app/vendor", "resources/views", true, &[".php"]);
        assert!(layout.matches("/app/vendor/laravel/horizon/resources/views/layout.blade.php"));
        assert!(layout.matches("/app/vendor/laravel/horizon/resources/views/a/b/c.blade.php"));
        assert!(!layout.matches("/app/vendor/laravel/horizon/resources/views"));
    }

    #[test]
    fn test_local_layout() {
        let layout = FileLayout::local("/app/config/", false, &[".php"]);
        assert_eq!(layout.root, "/app/config");
        assert!(layout.matches("/app/config/app.php"));
        assert!(!layout.matches("/app/config/nested/app.php"));
        assert!(!layout.matches("/app/configuration/app.php"));
    }

    #[test]
    fn test_exclusions_use_path_below_root() {
        let layout = migrations();
        assert!(layout.matches("/app/vendor/acme/jobs/database/migrations/2024_01_01_000000_create_jobs.php"));
        assert!(layout.matches("/app/vendor/acme/jobs/database/migrations/create_jobs.php.stub"));
        assert!(!layout.matches("/app/vendor/acme/jobs/database/migrations/testbench_users.php"));
        assert!(layout.accepts("/app/vendor/acme/jobs/database/migrations/x.php"));
        assert!(!layout.accepts("/app/vendor/acme/jobs/tests/database/migrations/x.php"));
        assert!(!layout.accepts("/app/vendor/acme/jobs/stubs/database/migrations/x.php"));
    }

    #[test]
    fn test_exclusions_ignore_project_location() {
        // A project living under a `tests` directory keeps its migrations
        let layout = FileLayout::vendor("/home/me/tests/app/vendor", "database/migrations", false, &[".php"])
            .with_exclusions(&["/tests/".to_string()], &[]);
        assert!(layout.matches("/home/me/tests/app/vendor/acme/jobs/database/migrations/x.php"));
    }
}
