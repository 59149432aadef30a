use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vendor_cleanup::{
    apply_deletions, load_config, render_deletions, render_json, render_text, run_category,
    Category, CategoryKind, DeletionOutcome, FsStore, NormalizationPolicy, ReconciliationResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    Config,
    Migration,
    Lang,
    View,
    All,
}

impl Target {
    fn kinds(self) -> Vec<CategoryKind> {
        match self {
            Target::Config => vec![CategoryKind::Config],
            Target::Migration => vec![CategoryKind::Migration],
            Target::Lang => vec![CategoryKind::Lang],
            Target::View => vec![CategoryKind::View],
            Target::All => CategoryKind::ALL.to_vec(),
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Target::All => "files",
            other => other.kinds()[0].noun(),
        }
    }
}

/// Vendor Cleanup - Find published vendor files that were never customised
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File category to check
    #[arg(value_enum)]
    target: Target,

    /// Delete unchanged files after confirmation
    #[arg(long)]
    delete: bool,

    /// Also ignore whitespace and line-ending differences
    #[arg(long)]
    normalize: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,

    /// Project root containing the vendor directory
    #[arg(long, env = "VENDOR_CLEANUP_BASE_PATH", default_value = ".")]
    base_path: PathBuf,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&args.base_path)
        .await
        .with_context(|| format!("Failed to load configuration for {}", args.base_path.display()))?;
    let base = config.base_path_str();
    let policy = NormalizationPolicy::new(args.normalize);
    let store = FsStore::new();

    info!(base = %base, target = ?args.target, "Starting vendor cleanup");

    let mut results: Vec<ReconciliationResult> = Vec::new();
    for kind in args.target.kinds() {
        let category = Category::for_kind(kind, &config);
        let result = run_category(&store, &store, &category, policy).await?;

        if !args.json {
            if result.no_vendor_files() {
                println!("No vendor {} found.", category.noun());
            } else {
                print!("{}", render_text(&result, &base));
            }
        }
        results.push(result);
    }

    let deletions = if args.delete {
        let unchanged: Vec<String> = results
            .iter()
            .flat_map(|r| r.unchanged.iter().cloned())
            .collect();

        if unchanged.is_empty() {
            None
        } else {
            let prompt = format!("Delete {} unchanged {}?", unchanged.len(), args.target.noun());
            let confirmed = args.yes || confirm(&prompt)?;
            Some(apply_deletions(&store, &unchanged, confirmed).await)
        }
    } else {
        None
    };

    if args.json {
        println!("{}", render_json(&results, deletions.as_ref(), &base)?);
    } else if let Some(outcome) = &deletions {
        print_deletions(outcome, &base);
    }

    Ok(())
}

fn print_deletions(outcome: &DeletionOutcome, base: &str) {
    if outcome.deleted.is_empty() && outcome.failed.is_empty() && outcome.skipped.is_empty() {
        println!("Nothing deleted.");
    } else {
        print!("{}", render_deletions(outcome, base));
    }
}

/// Ask a yes/no question on stderr, defaulting to no
fn confirm(prompt: &str) -> io::Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "{} [y/N] ", prompt)?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
