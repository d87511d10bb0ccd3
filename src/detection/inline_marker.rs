//! Inline license markers: `MODULE_LICENSE("GPL v2")` declarations
//!
//! Kernel-style modules declare their license in code rather than in a
//! comment. A recognized marker value yields a match with ratio 1.0 whose
//! position spans the whole marker.

use super::{LicenseMatch, MatchPosition};
use crate::license::LicenseCatalog;

pub const MARKER_OPEN: &str = "MODULE_LICENSE(\"";
pub const MARKER_CLOSE: &str = "\")";

/// One marker per line; unknown values are ignored
pub fn scan_inline_markers(lines: &[String], catalog: &LicenseCatalog) -> Vec<LicenseMatch> {
    let mut matches = Vec::new();

    for (line_no, line) in lines.iter().enumerate() {
        let Some(open) = line.find(MARKER_OPEN) else {
            continue;
        };
        let value_start = open + MARKER_OPEN.len();
        let Some(len) = line[value_start..].find(MARKER_CLOSE) else {
            continue;
        };
        let value = &line[value_start..value_start + len];
        let Some(record) = catalog.marker(value) else {
            continue;
        };

        let end_col = value_start + len + MARKER_CLOSE.len() - 1;
        matches.push(LicenseMatch::new(
            record.id.clone(),
            vec![MatchPosition::span(line_no, open, line_no, end_col)],
            1.0,
        ));
    }

    matches
}
