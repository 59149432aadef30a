pub mod config;
pub mod identity;
pub mod normalize;
pub mod reconciliation;
pub mod report;
pub mod similarity;
pub mod store;
pub mod structure;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, read_config, CleanupConfig, ConfigError};
pub use identity::{
    BasenameResolver, IdentityResolver, LogicalKey, PackageScopedResolver, RootRelativeResolver,
    TimestampResolver,
};
pub use normalize::{normalize, NormalizationPolicy};
pub use reconciliation::{
    apply_deletions, reconcile, run_category, Category, CategoryKind, Comparison, DeletionOutcome,
    ModifiedFile, ReconcileError, ReconciliationResult,
};
pub use report::{render_deletions, render_json, render_text};
pub use similarity::{diff_percentage, SeverityTier};
pub use store::{ContentStore, FileLayout, FileSetProvider, FsStore, MemoryStore, StoreError};
pub use structure::{structurally_equal, ParseError, StructureFormat};
