use crate::store::ContentStore;
use serde::Serialize;
use tracing::{info, warn};

/// A file that could not be deleted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletionFailure {
    pub path: String,
    pub error: String,
}

/// Result of applying deletions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeletionOutcome {
    pub deleted: Vec<String>,
    /// Paths that were already gone
    pub skipped: Vec<String>,
    pub failed: Vec<DeletionFailure>,
}

impl DeletionOutcome {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

/// Delete the unchanged files.
///
/// Nothing happens unless `confirmed` is set. Every file is attempted; a
/// failure is recorded and the next file is tried.
pub async fn apply_deletions(
    store: &dyn ContentStore,
    unchanged: &[String],
    confirmed: bool,
) -> DeletionOutcome {
    let mut outcome = DeletionOutcome::default();

    if !confirmed {
        info!(count = unchanged.len(), "Deletion not confirmed, keeping files");
        return outcome;
    }

    for path in unchanged {
        if !store.exists(path).await {
            outcome.skipped.push(path.clone());
            continue;
        }

        match store.delete(path).await {
            Ok(true) => {
                info!(path = %path, "Deleted");
                outcome.deleted.push(path.clone());
            }
            Ok(false) => outcome.skipped.push(path.clone()),
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to delete file");
                outcome.failed.push(DeletionFailure {
                    path: path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn files() -> Vec<String> {
        vec!["/app/config/a.php".to_string(), "/app/config/b.php".to_string()]
    }

    #[tokio::test]
    async fn test_unconfirmed_is_a_no_op() {
        let store = MemoryStore::new()
            .with_file("/app/config/a.php", "a")
            .with_file("/app/config/b.php", "b");

        let outcome = apply_deletions(&store, &files(), false).await;
        assert_eq!(outcome, DeletionOutcome::default());
        assert_eq!(store.paths().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_remaining() {
        let store = MemoryStore::new()
            .with_file("/app/config/a.php", "a")
            .with_file("/app/config/b.php", "b");
        store.mark_undeletable("/app/config/a.php");

        let outcome = apply_deletions(&store, &files(), true).await;
        assert_eq!(outcome.deleted, vec!["/app/config/b.php"]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].path, "/app/config/a.php");
        assert!(store.contains("/app/config/a.php"));
    }

    #[tokio::test]
    async fn test_already_deleted_is_skipped() {
        let store = MemoryStore::new().with_file("/app/config/b.php", "b");

        let outcome = apply_deletions(&store, &files(), true).await;
        assert_eq!(outcome.skipped, vec!["/app/config/a.php"]);
        assert_eq!(outcome.deleted_count(), 1);
    }
}
