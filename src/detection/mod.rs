//! Detection: license matches and the matchers that produce them
//!
//! Two producers feed the per-file match list:
//!
//! - [`LicenseMatcher`]: token alignment of comment text against catalog
//!   license texts.
//! - [`scan_inline_markers`]: `MODULE_LICENSE("...")` declarations.
//!
//! Overlapping and redundant matches are left to the reducer in
//! [`crate::engine::reduce`].

pub mod tokens;
pub mod matcher;
pub mod inline_marker;

pub use inline_marker::scan_inline_markers;
pub use matcher::LicenseMatcher;

use crate::license::LicenseId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ─── Algorithms ─────────────────────────────────────────────────────

/// How license text is aligned with input text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchAlgorithm {
    /// Best single contiguous span; suited to whole license files
    Exact,
    /// Best set of disjoint spans; suited to notices among other comments
    #[default]
    Partial,
}

impl fmt::Display for MatchAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Partial => write!(f, "partial"),
        }
    }
}

// ─── Matches ────────────────────────────────────────────────────────

/// Where a match sits in the original file. `end_col` is inclusive.
/// The `license_*` and `input_*` fields are half-open token ranges in the
/// license text and the input token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchPosition {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub license_start: usize,
    pub license_end: usize,
    pub input_start: usize,
    pub input_end: usize,
}

impl MatchPosition {
    /// A position with no token provenance (inline markers)
    pub fn span(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
            license_start: 0,
            license_end: 0,
            input_start: 0,
            input_end: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseMatch {
    pub license: LicenseId,
    pub positions: Vec<MatchPosition>,
    /// Matched share of the license text, 0.0..=1.0
    pub ratio: f64,
    /// Placeholder bindings (`<year>` → `2006`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

impl LicenseMatch {
    pub fn new(license: LicenseId, positions: Vec<MatchPosition>, ratio: f64) -> Self {
        Self {
            license,
            positions,
            ratio,
            tags: None,
        }
    }

    /// Percentage for display
    pub fn percent(&self) -> f64 {
        self.ratio * 100.0
    }
}
