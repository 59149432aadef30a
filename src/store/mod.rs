//! File storage collaborators.
//!
//! The reconciliation engine never touches the filesystem itself. It asks a
//! [`FileSetProvider`] which files exist on each side of a category and a
//! [`ContentStore`] for their bytes; deletions go through the store as well.
//! [`FsStore`] is the real implementation, [`MemoryStore`] serves tests and
//! dry runs.

mod layout;

pub use layout::FileLayout;

use crate::reconciliation::Category;
use crate::utils::path_to_string;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::fs;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Read and delete access to file contents.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn exists(&self, path: &str) -> bool;

    async fn read(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    /// Delete a file. `Ok(false)` when there was nothing to delete.
    async fn delete(&self, path: &str) -> Result<bool, StoreError>;
}

/// Discovery of the vendor and local file sets of a category.
///
/// Implementations return paths sorted and without duplicates so runs are
/// reproducible.
#[async_trait]
pub trait FileSetProvider: Send + Sync {
    async fn list_files(&self, layout: &FileLayout) -> Result<Vec<String>, StoreError>;

    async fn list_vendor_files(&self, category: &Category) -> Result<Vec<String>, StoreError> {
        self.list_files(&category.vendor).await
    }

    async fn list_local_files(&self, category: &Category) -> Result<Vec<String>, StoreError> {
        self.list_files(&category.local).await
    }
}

/// Filesystem-backed store
#[derive(Debug, Clone, Default)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentStore for FsStore {
    async fn exists(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        Ok(fs::read(path).await?)
    }

    async fn delete(&self, path: &str) -> Result<bool, StoreError> {
        if !Path::new(path).exists() {
            return Ok(false);
        }
        fs::remove_file(path).await?;
        Ok(true)
    }
}

#[async_trait]
impl FileSetProvider for FsStore {
    async fn list_files(&self, layout: &FileLayout) -> Result<Vec<String>, StoreError> {
        let root = PathBuf::from(&layout.root);
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let search_dirs = match &layout.package_dir {
            Some(package_dir) => package_dirs(&root)
                .await?
                .into_iter()
                .map(|package| package.join(package_dir))
                .filter(|dir| dir.is_dir())
                .collect(),
            None => vec![root],
        };

        let max_depth = if layout.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for dir in search_dirs {
            for entry in WalkDir::new(&dir)
                .min_depth(1)
                .max_depth(max_depth)
                .follow_links(true)
            {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(dir = %dir.display(), error = %e, "Failed to walk directory entry, skipping");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = path_to_string(entry.path());
                if layout.accepts(&path) {
                    files.push(path);
                }
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }
}

/// `<root>/<vendor>/<package>` directories, following symlinked packages
async fn package_dirs(root: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut packages = Vec::new();
    let mut vendors = fs::read_dir(root).await?;

    while let Some(vendor) = vendors.next_entry().await? {
        if !is_dir(&vendor.path()).await {
            continue;
        }

        let mut entries = match fs::read_dir(vendor.path()).await {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        while let Some(package) = entries.next_entry().await? {
            if is_dir(&package.path()).await {
                packages.push(package.path());
            }
        }
    }

    packages.sort();
    Ok(packages)
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

/// In-memory store keyed by absolute path.
///
/// Individual paths can be marked unreadable or undeletable to exercise the
/// engine's failure handling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    unreadable: Mutex<HashSet<String>>,
    undeletable: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        lock(&self.files).insert(path.into(), content.into());
    }

    /// Builder form of [`MemoryStore::insert`]
    pub fn with_file(self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn mark_unreadable(&self, path: impl Into<String>) {
        lock(&self.unreadable).insert(path.into());
    }

    pub fn mark_undeletable(&self, path: impl Into<String>) {
        lock(&self.undeletable).insert(path.into());
    }

    pub fn contains(&self, path: &str) -> bool {
        lock(&self.files).contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        lock(&self.files).keys().cloned().collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn exists(&self, path: &str) -> bool {
        self.contains(path)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        if lock(&self.unreadable).contains(path) {
            return Err(StoreError::PermissionDenied(path.to_string()));
        }
        lock(&self.files)
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<bool, StoreError> {
        if lock(&self.undeletable).contains(path) {
            return Err(StoreError::PermissionDenied(path.to_string()));
        }
        Ok(lock(&self.files).remove(path).is_some())
    }
}

#[async_trait]
impl FileSetProvider for MemoryStore {
    async fn list_files(&self, layout: &FileLayout) -> Result<Vec<String>, StoreError> {
        Ok(lock(&self.files)
            .keys()
            .filter(|path| layout.matches(path))
            .cloned()
            .collect())
    }
}
