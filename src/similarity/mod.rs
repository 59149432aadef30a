//! Difference percentage between two normalized contents.
//!
//! Similarity follows the classic recursive longest-common-substring measure:
//! find the longest common run of bytes, count it, then repeat on the parts to
//! its left and to its right. When several runs share the maximum length the
//! one starting earliest in the first argument wins (then earliest in the
//! second), so `diff_percentage(a, b)` and `diff_percentage(b, a)` can differ
//! slightly on inputs with competing runs.

use serde::Serialize;
use std::fmt;

/// Difference between `a` and `b` as a percentage in `[0.0, 100.0]`, rounded
/// to one decimal place. Identical inputs (including two empty strings)
/// always score `0.0`.
pub fn diff_percentage(a: &str, b: &str) -> f64 {
    if a == b {
        return 0.0;
    }

    let total = a.len() + b.len();
    let common = similar_chars(a.as_bytes(), b.as_bytes());
    let similarity = (common as f64) * 2.0 * 100.0 / (total as f64);

    round_one_decimal(100.0 - similarity).clamp(0.0, 100.0)
}

/// Number of bytes `a` and `b` have in common under the recursive measure.
pub fn similar_chars(a: &[u8], b: &[u8]) -> usize {
    let mut sum = 0;
    // (a range, b range) pairs still to examine
    let mut pending = vec![(0..a.len(), 0..b.len())];

    while let Some((ra, rb)) = pending.pop() {
        let (sa, sb) = (&a[ra.clone()], &b[rb.clone()]);
        let Some((pos_a, pos_b, len)) = longest_common_run(sa, sb) else {
            continue;
        };
        sum += len;

        if pos_a > 0 && pos_b > 0 {
            pending.push((ra.start..ra.start + pos_a, rb.start..rb.start + pos_b));
        }
        if pos_a + len < sa.len() && pos_b + len < sb.len() {
            pending.push((ra.start + pos_a + len..ra.end, rb.start + pos_b + len..rb.end));
        }
    }

    sum
}

/// First longest common run as `(position in a, position in b, length)`.
fn longest_common_run(a: &[u8], b: &[u8]) -> Option<(usize, usize, usize)> {
    if a.is_empty() || b.is_empty() {
        return None;
    }

    // run[j] = length of the common run starting at (i, j); filled from the
    // end so ties resolve to the smallest i, then the smallest j.
    let mut next = vec![0usize; b.len() + 1];
    let mut run = vec![0usize; b.len() + 1];
    let mut best: Option<(usize, usize, usize)> = None;

    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            run[j] = if a[i] == b[j] { next[j + 1] + 1 } else { 0 };
            let len = run[j];
            if len > 0 && best.map_or(true, |(_, _, max)| len >= max) {
                best = Some((i, j, len));
            }
        }
        std::mem::swap(&mut next, &mut run);
    }

    best
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Presentation band for a difference percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    /// Under 5%
    Minor,
    /// Under 15%
    Small,
    /// Under 30%
    Moderate,
    /// 30% and above
    Significant,
}

impl SeverityTier {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage < 5.0 {
            SeverityTier::Minor
        } else if percentage < 15.0 {
            SeverityTier::Small
        } else if percentage < 30.0 {
            SeverityTier::Moderate
        } else {
            SeverityTier::Significant
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeverityTier::Minor => "minor",
            SeverityTier::Small => "small",
            SeverityTier::Moderate => "moderate",
            SeverityTier::Significant => "significant",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
