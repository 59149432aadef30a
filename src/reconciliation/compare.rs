//! Pairwise comparison and the per-local-file fold over vendor variants.

use crate::normalize::{normalize, NormalizationPolicy};
use crate::similarity::diff_percentage;
use crate::structure::{structurally_equal, StructureFormat};
use crate::utils::compute_hash;

/// Outcome of comparing one vendor/local pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Unchanged,
    Modified { diff: f64 },
}

/// A file's content prepared for comparison: raw text, normalized text and
/// the digest of the normalized text.
#[derive(Debug, Clone)]
pub struct PreparedContent {
    pub raw: String,
    pub normalized: String,
    pub digest: String,
}

impl PreparedContent {
    pub fn new(bytes: &[u8], policy: NormalizationPolicy) -> Self {
        let raw = String::from_utf8_lossy(bytes).into_owned();
        let normalized = normalize(&raw, policy);
        let digest = compute_hash(&normalized);
        Self {
            raw,
            normalized,
            digest,
        }
    }
}

/// Compare prepared contents.
///
/// Equal digests mean unchanged. Otherwise, when `format` is given, a
/// structural match downgrades the difference to unchanged; it is never
/// consulted for contents that already match.
pub fn compare_prepared(
    vendor: &PreparedContent,
    local: &PreparedContent,
    format: Option<StructureFormat>,
) -> Comparison {
    if vendor.digest == local.digest {
        return Comparison::Unchanged;
    }

    if let Some(format) = format {
        if structurally_equal(&vendor.raw, &local.raw, format) == Some(true) {
            return Comparison::Unchanged;
        }
    }

    Comparison::Modified {
        diff: diff_percentage(&vendor.normalized, &local.normalized),
    }
}

/// Compare two raw contents under a normalization policy
pub fn compare_contents(
    vendor_raw: &[u8],
    local_raw: &[u8],
    policy: NormalizationPolicy,
    format: Option<StructureFormat>,
) -> Comparison {
    compare_prepared(
        &PreparedContent::new(vendor_raw, policy),
        &PreparedContent::new(local_raw, policy),
        format,
    )
}

/// Best result seen so far for one local file
#[derive(Debug, Clone, PartialEq)]
pub enum BestMatch {
    Unchanged { vendor_path: String },
    Modified { vendor_path: String, diff: f64 },
}

impl BestMatch {
    pub fn from_comparison(vendor_path: &str, comparison: Comparison) -> Self {
        match comparison {
            Comparison::Unchanged => BestMatch::Unchanged {
                vendor_path: vendor_path.to_string(),
            },
            Comparison::Modified { diff } => BestMatch::Modified {
                vendor_path: vendor_path.to_string(),
                diff,
            },
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, BestMatch::Unchanged { .. })
    }

    /// Unchanged wins over modified; between two modified results the lower
    /// difference wins, the earlier one on ties.
    pub fn merge(self, other: BestMatch) -> BestMatch {
        match (self, other) {
            (current @ BestMatch::Unchanged { .. }, _) => current,
            (_, candidate @ BestMatch::Unchanged { .. }) => candidate,
            (
                current @ BestMatch::Modified { .. },
                candidate @ BestMatch::Modified { .. },
            ) => {
                if candidate.diff() < current.diff() {
                    candidate
                } else {
                    current
                }
            }
        }
    }

    fn diff(&self) -> f64 {
        match self {
            BestMatch::Unchanged { .. } => 0.0,
            BestMatch::Modified { diff, .. } => *diff,
        }
    }
}

/// Fold candidates into the best match, `None` when there were none
pub fn fold_best<I>(candidates: I) -> Option<BestMatch>
where
    I: IntoIterator<Item = BestMatch>,
{
    candidates.into_iter().fold(None, |best, candidate| match best {
        None => Some(candidate),
        Some(best) => Some(best.merge(candidate)),
    })
}
