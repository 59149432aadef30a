mod categories;
mod compare;
mod engine;
mod execute;

pub use categories::{Category, CategoryKind};
pub use compare::{compare_contents, compare_prepared, fold_best, BestMatch, Comparison, PreparedContent};
pub use engine::{
    reconcile, run_category, ModifiedFile, ReconcileError, ReconciliationResult, UnreadableFile,
};
pub use execute::{apply_deletions, DeletionFailure, DeletionOutcome};
