use crate::config::CleanupConfig;
use crate::identity::{
    BasenameResolver, IdentityResolver, PackageScopedResolver, RootRelativeResolver,
    TimestampResolver,
};
use crate::store::FileLayout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The kinds of files a package can publish into a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Config,
    Migration,
    Lang,
    View,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 4] = [
        CategoryKind::Config,
        CategoryKind::Migration,
        CategoryKind::Lang,
        CategoryKind::View,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CategoryKind::Config => "config",
            CategoryKind::Migration => "migration",
            CategoryKind::Lang => "lang",
            CategoryKind::View => "view",
        }
    }

    /// Plural noun used in messages ("No vendor migrations found.")
    pub fn noun(&self) -> &'static str {
        match self {
            CategoryKind::Config => "config files",
            CategoryKind::Migration => "migrations",
            CategoryKind::Lang => "translations",
            CategoryKind::View => "views",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "config" | "configs" => Ok(CategoryKind::Config),
            "migration" | "migrations" => Ok(CategoryKind::Migration),
            "lang" | "translation" | "translations" => Ok(CategoryKind::Lang),
            "view" | "views" => Ok(CategoryKind::View),
            other => Err(format!("Unknown category: {}", other)),
        }
    }
}

/// One file category as a configuration value: where each side lives, how
/// paths are paired, and whether contents may be compared as structures.
#[derive(Debug, Clone)]
pub struct Category {
    pub kind: CategoryKind,
    pub vendor: FileLayout,
    pub local: FileLayout,
    pub resolver: Arc<dyn IdentityResolver>,
    pub structural: bool,
}

impl Category {
    pub fn new(
        kind: CategoryKind,
        vendor: FileLayout,
        local: FileLayout,
        resolver: Arc<dyn IdentityResolver>,
        structural: bool,
    ) -> Self {
        Self {
            kind,
            vendor,
            local,
            resolver,
            structural,
        }
    }

    /// Build the category for `kind` from the project configuration
    pub fn for_kind(kind: CategoryKind, config: &CleanupConfig) -> Self {
        let vendor_root = config.vendor_root();

        match kind {
            CategoryKind::Config => Self::new(
                kind,
                FileLayout::vendor(&vendor_root, &config.config_dir, false, &[".php"]),
                FileLayout::local(&config.resolve(&config.config_dir), false, &[".php"]),
                Arc::new(BasenameResolver),
                true,
            ),
            CategoryKind::Migration => Self::new(
                kind,
                FileLayout::vendor(
                    &vendor_root,
                    &config.migrations_dir,
                    false,
                    &[".php", ".php.stub"],
                )
                .with_exclusions(&config.migration_excludes, &config.migration_excluded_names),
                FileLayout::local(&config.resolve(&config.migrations_dir), false, &[".php"]),
                Arc::new(TimestampResolver),
                false,
            ),
            CategoryKind::Lang => {
                let local_root = config.resolve(&config.lang_dir);
                Self::new(
                    kind,
                    FileLayout::vendor(&vendor_root, &config.lang_dir, true, &[".php", ".json"]),
                    FileLayout::local(&local_root, true, &[".php", ".json"]),
                    Arc::new(RootRelativeResolver::new(config.lang_dir.clone(), local_root)),
                    true,
                )
            }
            CategoryKind::View => {
                let local_root = config.resolve(&format!("{}/vendor", config.views_dir));
                Self::new(
                    kind,
                    FileLayout::vendor(&vendor_root, &config.views_dir, true, &[".php"]),
                    FileLayout::local(&local_root, true, &[".php"]),
                    Arc::new(PackageScopedResolver::new(config.views_dir.clone(), local_root)),
                    false,
                )
            }
        }
    }

    /// Every category, in reporting order
    pub fn all(config: &CleanupConfig) -> Vec<Category> {
        CategoryKind::ALL
            .iter()
            .map(|kind| Self::for_kind(*kind, config))
            .collect()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn noun(&self) -> &'static str {
        self.kind.noun()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CleanupConfig {
        CleanupConfig::with_base_path("/srv/app")
    }

    #[test]
    fn test_category_kind_parsing() {
        assert_eq!("migrations".parse::<CategoryKind>(), Ok(CategoryKind::Migration));
        assert_eq!("Lang".parse::<CategoryKind>(), Ok(CategoryKind::Lang));
        assert!("assets".parse::<CategoryKind>().is_err());
    }

    #[test]
    fn test_config_category() {
        let category = Category::for_kind(CategoryKind::Config, &config());
        assert!(category.structural);
        assert!(category.vendor.matches("/srv/app/vendor/laravel/horizon/config/horizon.php"));
        assert!(category.local.matches("/srv/app/config/horizon.php"));
        assert_eq!(
            category.resolver.vendor_key("/srv/app/vendor/laravel/horizon/config/horizon.php"),
            category.resolver.local_key("/srv/app/config/horizon.php"),
        );
    }

    #[test]
    fn test_migration_category_excludes_fixtures() {
        let category = Category::for_kind(CategoryKind::Migration, &config());
        assert!(!category.structural);
        assert!(category
            .vendor
            .matches("/srv/app/vendor/acme/jobs/database/migrations/create_jobs_table.php.stub"));
        assert!(!category
            .vendor
            .matches("/srv/app/vendor/orchestra/testbench/database/migrations/testbench_users.php"));
        assert!(!category.local.matches("/srv/app/database/migrations/x.php.stub"));
    }

    #[test]
    fn test_lang_keys_pair_across_sides() {
        let category = Category::for_kind(CategoryKind::Lang, &config());
        let vendor = "/srv/app/vendor/acme/billing/lang/vendor/billing/en/messages.php";
        let local = "/srv/app/lang/vendor/billing/en/messages.php";
        assert!(category.vendor.matches(vendor));
        assert!(category.local.matches(local));
        assert_eq!(category.resolver.vendor_key(vendor), category.resolver.local_key(local));
    }

    #[test]
    fn test_view_keys_pair_across_sides() {
        let category = Category::for_kind(CategoryKind::View, &config());
        let vendor = "/srv/app/vendor/laravel/horizon/resources/views/layout.blade.php";
        let local = "/srv/app/resources/views/vendor/horizon/layout.blade.php";
        assert!(category.vendor.matches(vendor));
        assert!(category.local.matches(local));
        assert!(!category.local.matches("/srv/app/resources/views/welcome.blade.php"));
        assert_eq!(category.resolver.vendor_key(vendor).as_str(), "horizon/layout.blade.php");
        assert_eq!(category.resolver.vendor_key(vendor), category.resolver.local_key(local));
    }

    #[test]
    fn test_all_categories_in_order() {
        let names: Vec<&str> = Category::all(&config()).iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["config", "migration", "lang", "view"]);
    }
}
