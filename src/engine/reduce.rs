//! Match reduction
//!
//! Removes redundant matches from one file's match list until nothing
//! changes. Rules, checked per match in list order:
//!
//! 1. **Duplicate**: the same license twice keeps the higher ratio.
//! 2. **Forbidden phrase**: dropped when other licenses are present, the
//!    phrase accepts all of them, and it is not always significant.
//! 3. **Orphaned exception**: dropped when none of its parents is present.
//! 4. **Sister**: dropped when its sister license is present.
//!
//! Every removal restarts the scan. Each step shrinks the list, so the
//! loop terminates; a reduced list reduces to itself.

use crate::detection::LicenseMatch;
use crate::license::{LicenseCatalog, LicenseKind};
use crate::source::ReferenceKind;
use tracing::debug;

pub fn reduce_matches(mut matches: Vec<LicenseMatch>, catalog: &LicenseCatalog) -> Vec<LicenseMatch> {
    while let Some(idx) = next_removal(&matches, catalog) {
        let removed = matches.remove(idx);
        debug!("Reduced away {} ({:.1}%)", removed.license, removed.percent());
    }
    matches
}

fn next_removal(matches: &[LicenseMatch], catalog: &LicenseCatalog) -> Option<usize> {
    for (i, m) in matches.iter().enumerate() {
        if let Some(offset) = matches[i + 1..].iter().position(|o| o.license == m.license) {
            let j = i + 1 + offset;
            return Some(if m.ratio < matches[j].ratio { i } else { j });
        }

        let Some(record) = catalog.get(&m.license) else {
            continue;
        };
        let mut others = matches
            .iter()
            .enumerate()
            .filter(|(k, _)| *k != i)
            .map(|(_, o)| &o.license);

        let redundant = match &record.kind {
            LicenseKind::ForbiddenPhrase {
                always_significant: false,
            } => {
                let others: Vec<_> = others.collect();
                !others.is_empty()
                    && others
                        .iter()
                        .all(|&o| catalog.compatible(&m.license, o, ReferenceKind::Import))
            }
            LicenseKind::ForbiddenPhrase { .. } => false,
            LicenseKind::Exception { parents } => !others.any(|o| parents.contains(o)),
            LicenseKind::Standard { sister: Some(sister) } => others.any(|o| o == sister),
            LicenseKind::Standard { sister: None } => false,
        };
        if redundant {
            return Some(i);
        }
    }
    None
}
