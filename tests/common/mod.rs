#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vendor_cleanup::{CleanupConfig, MemoryStore};

/// Create a temporary project directory
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Should create temp dir")
}

/// Write a file below `root`, creating parent directories
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Should create parent dirs");
    }
    fs::write(&path, content).expect("Should write file");
}

/// Configuration rooted at a canonicalized temp directory
pub fn config_for(root: &Path) -> CleanupConfig {
    let base = root.canonicalize().expect("Should canonicalize temp dir");
    CleanupConfig::with_base_path(base)
}

/// In-memory project rooted at `/app`
pub fn memory_project(files: &[(&str, &str)]) -> MemoryStore {
    let store = MemoryStore::new();
    for (path, content) in files {
        store.insert(format!("/app/{}", path), *content);
    }
    store
}

pub fn memory_config() -> CleanupConfig {
    CleanupConfig::with_base_path("/app")
}

pub fn app(path: &str) -> String {
    format!("/app/{}", path)
}
