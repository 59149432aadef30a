//! Logical keys pairing vendor files with their published copies.
//!
//! A vendor file and a local file are "the same file" when their resolver
//! produces the same [`LogicalKey`]. Every strategy works on the path string
//! alone, treats `/` and `\` alike, and never fails: a path that does not fit
//! the expected layout falls back to its basename.

use crate::utils::{basename, normalize_separators};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Package name used when a vendor path has no `vendor/<vendor>/<package>/` part
pub const UNKNOWN_PACKAGE: &str = "unknown";

/// `YYYY_MM_DD_HHMMSS_` migration prefix
static TIMESTAMP_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}_\d{2}_\d{2}_\d{6}_(.+)$").expect("valid timestamp regex"));

/// `vendor/<vendor>/<package>/`
static PACKAGE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|/)vendor/[^/]+/([^/]+)/").expect("valid package regex"));

/// Canonical identity of a file across the vendor and local sets
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LogicalKey(String);

impl LogicalKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogicalKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Strategy deriving logical keys for one file category.
pub trait IdentityResolver: Send + Sync + fmt::Debug {
    /// Key of a file from the vendor set
    fn vendor_key(&self, path: &str) -> LogicalKey;

    /// Key of a file from the local set
    fn local_key(&self, path: &str) -> LogicalKey;
}

/// Flat namespace: both sides are keyed by basename.
#[derive(Debug, Clone, Default)]
pub struct BasenameResolver;

impl IdentityResolver for BasenameResolver {
    fn vendor_key(&self, path: &str) -> LogicalKey {
        LogicalKey::new(basename(path))
    }

    fn local_key(&self, path: &str) -> LogicalKey {
        LogicalKey::new(basename(path))
    }
}

/// Timestamped migrations: basename with the date-time prefix removed.
#[derive(Debug, Clone, Default)]
pub struct TimestampResolver;

impl IdentityResolver for TimestampResolver {
    fn vendor_key(&self, path: &str) -> LogicalKey {
        LogicalKey::new(strip_timestamp(basename(path)))
    }

    fn local_key(&self, path: &str) -> LogicalKey {
        LogicalKey::new(strip_timestamp(basename(path)))
    }
}

/// Namespaced resources (translations): vendor files are keyed by the path
/// after the package's root segment, local files by the path below the local
/// root directory.
#[derive(Debug, Clone)]
pub struct RootRelativeResolver {
    vendor_root: String,
    local_root: String,
}

impl RootRelativeResolver {
    /// `vendor_root` is a segment name such as `lang`; `local_root` is the
    /// directory the local files live under.
    pub fn new(vendor_root: impl Into<String>, local_root: impl Into<String>) -> Self {
        Self {
            vendor_root: vendor_root.into(),
            local_root: normalize_separators(&local_root.into()),
        }
    }
}

impl IdentityResolver for RootRelativeResolver {
    fn vendor_key(&self, path: &str) -> LogicalKey {
        let key = relative_to_root(path, &self.vendor_root)
            .unwrap_or_else(|| basename(path).to_string());
        LogicalKey::new(key)
    }

    fn local_key(&self, path: &str) -> LogicalKey {
        LogicalKey::new(relative_to_dir(path, &self.local_root))
    }
}

/// Namespaced resources published per package (views): vendor files are
/// keyed by `<package>/<path after root>`, local files by the path below the
/// local root directory (which already starts with the package name).
#[derive(Debug, Clone)]
pub struct PackageScopedResolver {
    vendor_root: String,
    local_root: String,
}

impl PackageScopedResolver {
    pub fn new(vendor_root: impl Into<String>, local_root: impl Into<String>) -> Self {
        Self {
            vendor_root: vendor_root.into(),
            local_root: normalize_separators(&local_root.into()),
        }
    }
}

impl IdentityResolver for PackageScopedResolver {
    fn vendor_key(&self, path: &str) -> LogicalKey {
        let package = extract_package_name(path);
        let relative = relative_to_root(path, &self.vendor_root)
            .unwrap_or_else(|| basename(path).to_string());
        LogicalKey::new(format!("{}/{}", package, relative))
    }

    fn local_key(&self, path: &str) -> LogicalKey {
        LogicalKey::new(relative_to_dir(path, &self.local_root))
    }
}

/// Strip the `YYYY_MM_DD_HHMMSS_` prefix from a migration filename.
///
/// A `.php.stub` extension is collapsed into `.php` first. Names without the
/// prefix are returned unchanged.
pub fn strip_timestamp(filename: &str) -> String {
    let filename = filename.replace(".php.stub", ".php");

    match TIMESTAMP_PREFIX.captures(&filename) {
        Some(caps) => caps[1].to_string(),
        None => filename,
    }
}

/// Package name from a `.../vendor/<vendor>/<package>/...` path
pub fn extract_package_name(path: &str) -> String {
    let path = normalize_separators(path);

    PACKAGE_SEGMENT
        .captures(&path)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| UNKNOWN_PACKAGE.to_string())
}

/// Path after the root segment (e.g. `lang` or `resources/views`).
///
/// Only the part below the owning package (`vendor/<vendor>/<package>/`) is
/// searched when there is one, and the first occurrence of the root wins, so
/// the key agrees with the path below the local root directory (including a
/// `vendor/<namespace>/` prefix). `None` when the root does not occur.
pub fn relative_to_root(path: &str, root: &str) -> Option<String> {
    let path = format!("/{}", normalize_separators(path).trim_start_matches('/'));
    let root = root.trim_matches('/');

    let scope = match PACKAGE_SEGMENT.find(&path) {
        Some(m) => &path[m.end() - 1..],
        None => path.as_str(),
    };

    let marker = format!("/{}/", root);
    let idx = scope.find(&marker)?;
    let rest = &scope[idx + marker.len()..];
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Path below `dir`, or the basename when the path is not inside it.
pub fn relative_to_dir(path: &str, dir: &str) -> String {
    let path = normalize_separators(path);
    let dir = normalize_separators(dir);
    let prefix = format!("{}/", dir.trim_end_matches('/'));

    match path.strip_prefix(&prefix) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => basename(&path).to_string(),
    }
}
