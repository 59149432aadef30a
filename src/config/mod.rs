use crate::utils::{path_to_string, CONFIG_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Base path does not exist: {0}")]
    BasePathNotFound(String),
}

fn default_vendor_dir() -> String {
    "vendor".to_string()
}

fn default_config_dir() -> String {
    "config".to_string()
}

fn default_migrations_dir() -> String {
    "database/migrations".to_string()
}

fn default_lang_dir() -> String {
    "lang".to_string()
}

fn default_views_dir() -> String {
    "resources/views".to_string()
}

/// Path fragments that mark package-internal migrations (test fixtures,
/// stubs, examples)
fn default_migration_excludes() -> Vec<String> {
    ["/tests/", "/test/", "/stubs/", "/examples/"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_migration_excluded_names() -> Vec<String> {
    vec!["testbench".to_string()]
}

/// Where the vendor and local files of every category live.
///
/// Directories are relative to `base_path`. Nothing here is looked up from
/// the environment; the engine only sees the resolved layouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupConfig {
    /// Project root. Never read from the config file itself.
    #[serde(skip)]
    pub base_path: PathBuf,
    #[serde(default = "default_vendor_dir")]
    pub vendor_dir: String,
    #[serde(default = "default_config_dir")]
    pub config_dir: String,
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,
    #[serde(default = "default_lang_dir")]
    pub lang_dir: String,
    #[serde(default = "default_views_dir")]
    pub views_dir: String,
    #[serde(default = "default_migration_excludes")]
    pub migration_excludes: Vec<String>,
    #[serde(default = "default_migration_excluded_names")]
    pub migration_excluded_names: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            vendor_dir: default_vendor_dir(),
            config_dir: default_config_dir(),
            migrations_dir: default_migrations_dir(),
            lang_dir: default_lang_dir(),
            views_dir: default_views_dir(),
            migration_excludes: default_migration_excludes(),
            migration_excluded_names: default_migration_excluded_names(),
        }
    }
}

impl CleanupConfig {
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Absolute form of a directory relative to the base path
    pub fn resolve(&self, dir: &str) -> String {
        path_to_string(&self.base_path.join(dir))
    }

    pub fn base_path_str(&self) -> String {
        path_to_string(&self.base_path)
    }

    pub fn vendor_root(&self) -> String {
        self.resolve(&self.vendor_dir)
    }
}

/// Get the path to the optional configuration file
pub fn get_config_path(base_path: &Path) -> PathBuf {
    base_path.join(CONFIG_FILE)
}

/// Read the configuration file, if the project has one
pub async fn read_config(base_path: &Path) -> Result<Option<CleanupConfig>, ConfigError> {
    let config_path = get_config_path(base_path);

    if !config_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&config_path).await?;
    let config: CleanupConfig = serde_json::from_str(&content)?;
    Ok(Some(config))
}

/// Resolve the base path and load its configuration, falling back to defaults
pub async fn load_config(base_path: &Path) -> Result<CleanupConfig, ConfigError> {
    if !base_path.is_dir() {
        return Err(ConfigError::BasePathNotFound(path_to_string(base_path)));
    }
    let base_path = fs::canonicalize(base_path).await?;

    let mut config = read_config(&base_path).await?.unwrap_or_default();
    config.base_path = base_path;
    Ok(config)
}
