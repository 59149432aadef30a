use super::categories::Category;
use super::compare::{compare_prepared, fold_best, BestMatch, PreparedContent};
use crate::identity::LogicalKey;
use crate::normalize::NormalizationPolicy;
use crate::similarity::SeverityTier;
use crate::store::{ContentStore, FileSetProvider, StoreError};
use crate::structure::StructureFormat;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Failed to list {category} files: {source}")]
    ListingFailed {
        category: String,
        #[source]
        source: StoreError,
    },
}

/// A local file paired with a vendor file whose content differs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedFile {
    pub path: String,
    /// Vendor variant with the lowest difference
    pub vendor_path: String,
    pub diff: f64,
}

impl ModifiedFile {
    pub fn tier(&self) -> SeverityTier {
        SeverityTier::from_percentage(self.diff)
    }
}

/// A file whose content could not be read during the run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnreadableFile {
    pub path: String,
    pub error: String,
}

/// Classification of one category.
///
/// Every local file is in exactly one of `unchanged`, `modified` and
/// `orphaned`. Vendor files only appear, in `missing`, when no local file
/// shares their key. `unreadable` lists read failures for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub category: String,
    pub vendor_files: usize,
    pub unchanged: Vec<String>,
    pub modified: Vec<ModifiedFile>,
    pub missing: Vec<String>,
    pub orphaned: Vec<String>,
    pub unreadable: Vec<UnreadableFile>,
}

impl ReconciliationResult {
    pub fn empty(category: &str) -> Self {
        Self {
            category: category.to_string(),
            ..Self::default()
        }
    }

    /// True when the category had nothing to compare against
    pub fn no_vendor_files(&self) -> bool {
        self.vendor_files == 0
    }

    pub fn local_files(&self) -> usize {
        self.unchanged.len() + self.modified.len() + self.orphaned.len()
    }
}

/// Per-run content cache. Each path is read at most once; failures are
/// remembered as `None`.
struct ContentCache<'a> {
    store: &'a dyn ContentStore,
    policy: NormalizationPolicy,
    entries: HashMap<String, Option<PreparedContent>>,
    unreadable: Vec<UnreadableFile>,
}

impl<'a> ContentCache<'a> {
    fn new(store: &'a dyn ContentStore, policy: NormalizationPolicy) -> Self {
        Self {
            store,
            policy,
            entries: HashMap::new(),
            unreadable: Vec::new(),
        }
    }

    /// Load `path` into the cache; `false` when it cannot be read
    async fn ensure(&mut self, path: &str) -> bool {
        if let Some(entry) = self.entries.get(path) {
            return entry.is_some();
        }

        let entry = match self.store.read(path).await {
            Ok(bytes) => Some(PreparedContent::new(&bytes, self.policy)),
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to read file, excluding it from comparison");
                self.unreadable.push(UnreadableFile {
                    path: path.to_string(),
                    error: e.to_string(),
                });
                None
            }
        };
        let readable = entry.is_some();
        self.entries.insert(path.to_string(), entry);
        readable
    }

    fn get(&self, path: &str) -> Option<&PreparedContent> {
        self.entries.get(path).and_then(|entry| entry.as_ref())
    }
}

/// Classify `local_files` against `vendor_files`.
///
/// Read failures never abort the run: an unreadable local file is orphaned,
/// an unreadable vendor file drops out of its key's variants, and a local
/// file left without any readable variant is orphaned as well.
pub async fn reconcile(
    store: &dyn ContentStore,
    category: &Category,
    vendor_files: &[String],
    local_files: &[String],
    policy: NormalizationPolicy,
) -> ReconciliationResult {
    let resolver = category.resolver.as_ref();

    let mut vendor_index: BTreeMap<LogicalKey, Vec<&str>> = BTreeMap::new();
    for path in vendor_files {
        vendor_index
            .entry(resolver.vendor_key(path))
            .or_default()
            .push(path.as_str());
    }

    let mut result = ReconciliationResult {
        vendor_files: vendor_files.len(),
        ..ReconciliationResult::empty(category.name())
    };
    let mut local_keys: BTreeSet<LogicalKey> = BTreeSet::new();
    let mut cache = ContentCache::new(store, policy);

    for local in local_files {
        let key = resolver.local_key(local);
        local_keys.insert(key.clone());

        let Some(variants) = vendor_index.get(&key) else {
            debug!(path = %local, key = %key, "No vendor counterpart");
            result.orphaned.push(local.clone());
            continue;
        };

        if !cache.ensure(local).await {
            result.orphaned.push(local.clone());
            continue;
        }

        let format = if category.structural {
            StructureFormat::for_path(local)
        } else {
            None
        };

        let mut candidates = Vec::with_capacity(variants.len());
        for vendor in variants {
            if !cache.ensure(vendor).await {
                continue;
            }
            let (Some(vendor_content), Some(local_content)) = (cache.get(vendor), cache.get(local))
            else {
                continue;
            };
            let candidate =
                BestMatch::from_comparison(vendor, compare_prepared(vendor_content, local_content, format));
            let done = candidate.is_unchanged();
            candidates.push(candidate);
            if done {
                break;
            }
        }

        match fold_best(candidates) {
            Some(BestMatch::Unchanged { vendor_path }) => {
                debug!(path = %local, vendor = %vendor_path, "Unchanged");
                result.unchanged.push(local.clone());
            }
            Some(BestMatch::Modified { vendor_path, diff }) => {
                debug!(path = %local, vendor = %vendor_path, diff, "Modified");
                result.modified.push(ModifiedFile {
                    path: local.clone(),
                    vendor_path,
                    diff,
                });
            }
            None => {
                warn!(path = %local, key = %key, "No readable vendor variant, treating as orphaned");
                result.orphaned.push(local.clone());
            }
        }
    }

    for (key, vendors) in &vendor_index {
        if !local_keys.contains(key) {
            result.missing.extend(vendors.iter().map(|v| v.to_string()));
        }
    }
    result.missing.sort();
    result.unreadable = cache.unreadable;

    info!(
        category = %category.name(),
        unchanged = result.unchanged.len(),
        modified = result.modified.len(),
        missing = result.missing.len(),
        orphaned = result.orphaned.len(),
        "Reconciliation complete"
    );

    result
}

/// List both sides of `category` and reconcile them.
///
/// A category without vendor files short-circuits to an empty result.
pub async fn run_category(
    provider: &dyn FileSetProvider,
    store: &dyn ContentStore,
    category: &Category,
    policy: NormalizationPolicy,
) -> Result<ReconciliationResult, ReconcileError> {
    let listing_failed = |source: StoreError| ReconcileError::ListingFailed {
        category: category.name().to_string(),
        source,
    };

    let vendor_files = provider
        .list_vendor_files(category)
        .await
        .map_err(listing_failed)?;

    if vendor_files.is_empty() {
        info!(category = %category.name(), "No vendor files found");
        return Ok(ReconciliationResult::empty(category.name()));
    }

    let local_files = provider
        .list_local_files(category)
        .await
        .map_err(listing_failed)?;

    info!(
        category = %category.name(),
        vendor = vendor_files.len(),
        local = local_files.len(),
        "Reconciling"
    );

    Ok(reconcile(store, category, &vendor_files, &local_files, policy).await)
}
