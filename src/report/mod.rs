//! Plain-text and JSON rendering of reconciliation results.

use crate::reconciliation::{DeletionOutcome, ModifiedFile, ReconciliationResult};
use crate::utils::{now_iso, to_relative_path, CLEANUP_VERSION};
use serde::Serialize;

/// JSON document for one invocation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'a> {
    pub version: &'static str,
    pub generated_at: String,
    pub base_path: &'a str,
    pub results: &'a [ReconciliationResult],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletions: Option<&'a DeletionOutcome>,
}

pub fn render_json(
    results: &[ReconciliationResult],
    deletions: Option<&DeletionOutcome>,
    base: &str,
) -> Result<String, serde_json::Error> {
    let report = Report {
        version: CLEANUP_VERSION,
        generated_at: now_iso(),
        base_path: base,
        results,
        deletions,
    };
    serde_json::to_string_pretty(&report)
}

/// Human-readable summary of one category.
///
/// Modified files come first, largest difference first; the other buckets
/// are listed in two columns. Paths are shown relative to `base`.
pub fn render_text(result: &ReconciliationResult, base: &str) -> String {
    let mut out = String::new();
    let relative = |path: &str| to_relative_path(path, base);

    if !result.modified.is_empty() {
        let mut modified: Vec<&ModifiedFile> = result.modified.iter().collect();
        modified.sort_by(|a, b| b.diff.total_cmp(&a.diff).then_with(|| a.path.cmp(&b.path)));

        let rows: Vec<(String, &ModifiedFile)> =
            modified.into_iter().map(|m| (relative(m.path.as_str()), m)).collect();
        let width = rows.iter().map(|(p, _)| p.len()).max().unwrap_or(0);

        out.push_str(&format!("MODIFIED ({})\n", rows.len()));
        for (path, file) in rows {
            out.push_str(&format!(
                "  {:<width$}  {:>5.1}%  {}\n",
                path,
                file.diff,
                file.tier(),
                width = width
            ));
        }
        out.push('\n');
    }

    let sections: [(&str, &Vec<String>); 3] = [
        ("UNCHANGED", &result.unchanged),
        ("ORPHANED", &result.orphaned),
        ("MISSING", &result.missing),
    ];
    for (title, paths) in sections {
        if paths.is_empty() {
            continue;
        }
        let paths: Vec<String> = paths.iter().map(|p| relative(p.as_str())).collect();
        out.push_str(&format!("{} ({})\n", title, paths.len()));
        out.push_str(&two_columns(&paths));
        out.push('\n');
    }

    if !result.unreadable.is_empty() {
        out.push_str(&format!("UNREADABLE ({})\n", result.unreadable.len()));
        for file in &result.unreadable {
            out.push_str(&format!("  {}  {}\n", relative(file.path.as_str()), file.error));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "{}: {} unchanged, {} modified, {} missing, {} orphaned\n",
        result.category,
        result.unchanged.len(),
        result.modified.len(),
        result.missing.len(),
        result.orphaned.len()
    ));
    out
}

pub fn render_deletions(outcome: &DeletionOutcome, base: &str) -> String {
    let mut out = String::new();
    for path in &outcome.deleted {
        out.push_str(&format!("Deleted {}\n", to_relative_path(path, base)));
    }
    for failure in &outcome.failed {
        out.push_str(&format!(
            "Failed to delete {}: {}\n",
            to_relative_path(&failure.path, base),
            failure.error
        ));
    }
    out.push_str(&format!("{} file(s) deleted\n", outcome.deleted_count()));
    out
}

/// Lay items out row by row, two per line, left column padded
fn two_columns(items: &[String]) -> String {
    let width = items.iter().step_by(2).map(|s| s.len()).max().unwrap_or(0);
    let mut out = String::new();

    for pair in items.chunks(2) {
        match pair {
            [left, right] => out.push_str(&format!("  {:<width$}  {}\n", left, right, width = width)),
            [left] => out.push_str(&format!("  {}\n", left)),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReconciliationResult {
        ReconciliationResult {
            category: "config".to_string(),
            vendor_files: 4,
            unchanged: vec!["/app/config/a.php".to_string()],
            modified: vec![
                ModifiedFile {
                    path: "/app/config/small.php".to_string(),
                    vendor_path: "/app/vendor/x/y/config/small.php".to_string(),
                    diff: 3.2,
                },
                ModifiedFile {
                    path: "/app/config/big.php".to_string(),
                    vendor_path: "/app/vendor/x/y/config/big.php".to_string(),
                    diff: 45.0,
                },
            ],
            missing: vec!["/app/vendor/x/y/config/b.php".to_string()],
            orphaned: Vec::new(),
            unreadable: Vec::new(),
        }
    }

    #[test]
    fn test_render_text_orders_modified_by_diff() {
        let text = render_text(&sample(), "/app");
        let big = text.find("config/big.php").expect("big listed");
        let small = text.find("config/small.php").expect("small listed");
        assert!(big < small);
        assert!(text.contains("45.0%  significant"));
        assert!(text.contains("  3.2%  minor"));
        assert!(text.contains("UNCHANGED (1)\n  config/a.php\n"));
        assert!(text.contains("MISSING (1)\n  vendor/x/y/config/b.php\n"));
        assert!(!text.contains("ORPHANED"));
        assert!(text.ends_with("config: 1 unchanged, 2 modified, 1 missing, 0 orphaned\n"));
    }

    #[test]
    fn test_two_columns() {
        let items: Vec<String> = ["a.php", "bbbb.php", "cc.php"].iter().map(|s| s.to_string()).collect();
        assert_eq!(two_columns(&items), "  a.php   bbbb.php\n  cc.php\n");
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&[sample()], None, "/app").expect("serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["basePath"], "/app");
        assert_eq!(value["results"][0]["category"], "config");
        assert_eq!(value["results"][0]["modified"][1]["vendorPath"], "/app/vendor/x/y/config/big.php");
        assert!(value["generatedAt"].is_string());
        assert!(value.get("deletions").is_none());
    }

    #[test]
    fn test_render_deletions() {
        let outcome = DeletionOutcome {
            deleted: vec!["/app/config/a.php".to_string()],
            ..DeletionOutcome::default()
        };
        assert_eq!(
            render_deletions(&outcome, "/app"),
            "Deleted config/a.php\n1 file(s) deleted\n"
        );
    }
}
