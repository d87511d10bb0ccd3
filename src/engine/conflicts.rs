//! License conflict detection
//!
//! Three views over the reduced matches of a package:
//!
//! - **internal**: licenses in one file that do not accept each other
//! - **reference**: a file's license rejected by the license of a file it
//!   imports or includes (the imported code decides)
//! - **global**: every incompatible pair among all licenses found

use super::FileAnalysis;
use crate::license::{incompatible_pairs, LicenseCatalog, LicenseConflict, LicenseId};
use crate::source::{FileId, Reference, ReferenceKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// `target_license` (of the referenced file) does not accept
/// `source_license` (of the referencing file)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceConflict {
    pub reference: Reference,
    pub source_license: LicenseId,
    pub target_license: LicenseId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConflictReport {
    pub internal: BTreeMap<FileId, Vec<LicenseConflict>>,
    pub references: Vec<ReferenceConflict>,
    pub global: Vec<LicenseConflict>,
}

impl ConflictReport {
    pub fn internal_conflict_count(&self) -> usize {
        self.internal.values().map(Vec::len).sum()
    }

    pub fn reference_conflict_count(&self) -> usize {
        self.references.len()
    }

    /// Directed entries halved, so a mutually incompatible pair counts once
    pub fn global_conflict_count(&self) -> usize {
        self.global.len() / 2
    }

    pub fn for_reference<'a>(&'a self, reference: &'a Reference) -> impl Iterator<Item = &'a ReferenceConflict> {
        self.references.iter().filter(move |c| c.reference == *reference)
    }

    pub fn is_empty(&self) -> bool {
        self.internal.is_empty() && self.references.is_empty() && self.global.is_empty()
    }
}

pub fn find_conflicts(
    catalog: &LicenseCatalog,
    analyses: &BTreeMap<FileId, FileAnalysis>,
    found: &BTreeSet<LicenseId>,
) -> ConflictReport {
    let internal = analyses
        .iter()
        .map(|(file, analysis)| {
            let ids = analysis.matches.iter().map(|m| &m.license);
            (file.clone(), incompatible_pairs(catalog, ids, ReferenceKind::Import))
        })
        .filter(|(_, conflicts)| !conflicts.is_empty())
        .collect();

    ConflictReport {
        internal,
        references: reference_conflicts(catalog, analyses),
        global: incompatible_pairs(catalog, found, ReferenceKind::Import),
    }
}

fn reference_conflicts(
    catalog: &LicenseCatalog,
    analyses: &BTreeMap<FileId, FileAnalysis>,
) -> Vec<ReferenceConflict> {
    let mut conflicts = Vec::new();

    for analysis in analyses.values() {
        for reference in analysis.references.iter().filter(|r| r.kind.is_linking()) {
            debug_assert!(
                reference.target.is_some(),
                "linking reference without target: {}",
                reference.declaration
            );
            let Some(target) = reference.target.as_ref().and_then(|t| analyses.get(t)) else {
                continue;
            };
            for a in &analysis.matches {
                for b in &target.matches {
                    if a.license != b.license
                        && !catalog.compatible(&b.license, &a.license, ReferenceKind::Import)
                    {
                        conflicts.push(ReferenceConflict {
                            reference: reference.clone(),
                            source_license: a.license.clone(),
                            target_license: b.license.clone(),
                        });
                    }
                }
            }
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{LicenseMatch, MatchPosition};
    use crate::engine::file_index::FileCategory;
    use crate::license::{CatalogBuilder, LicenseRecord};

    fn catalog() -> LicenseCatalog {
        CatalogBuilder::new()
            .with(LicenseRecord::standard("MIT", "MIT", "mit").compatible_with("GPL"))
            .with(LicenseRecord::standard("GPL", "GPL", "gpl"))
            .with(LicenseRecord::standard("A", "A", "a"))
            .with(LicenseRecord::standard("B", "B", "b"))
            .build()
            .unwrap()
    }

    fn analysis(name: &str, licenses: &[&str], imports: &[&str]) -> FileAnalysis {
        let file = FileId::root(name);
        let mut analysis = FileAnalysis::new(file.clone(), FileCategory::SourceCode);
        analysis.matches = licenses
            .iter()
            .map(|id| LicenseMatch::new(LicenseId::new(*id), vec![MatchPosition::span(0, 0, 0, 0)], 0.9))
            .collect();
        analysis.references = imports
            .iter()
            .map(|t| {
                Reference::new(
                    file.clone(),
                    Some(FileId::root(*t)),
                    ReferenceKind::Import,
                    format!("import {};", t),
                    0,
                )
            })
            .collect();
        analysis
    }

    fn analyses(items: Vec<FileAnalysis>) -> BTreeMap<FileId, FileAnalysis> {
        items.into_iter().map(|a| (a.file.clone(), a)).collect()
    }

    fn found(ids: &[&str]) -> BTreeSet<LicenseId> {
        ids.iter().map(|id| LicenseId::new(*id)).collect()
    }

    #[test]
    fn test_reference_conflict_is_directional() {
        let cat = catalog();
        // MIT code importing GPL code: GPL does not accept MIT
        let forward = analyses(vec![analysis("a.java", &["MIT"], &["b.java"]), analysis("b.java", &["GPL"], &[])]);
        let report = find_conflicts(&cat, &forward, &found(&["MIT", "GPL"]));
        assert_eq!(report.reference_conflict_count(), 1);
        let conflict = &report.references[0];
        assert_eq!(conflict.source_license, LicenseId::new("MIT"));
        assert_eq!(conflict.target_license, LicenseId::new("GPL"));
        assert_eq!(report.for_reference(&conflict.reference).count(), 1);

        // GPL code importing MIT code: MIT accepts GPL
        let backward = analyses(vec![analysis("a.java", &["GPL"], &["b.java"]), analysis("b.java", &["MIT"], &[])]);
        assert_eq!(find_conflicts(&cat, &backward, &found(&["MIT", "GPL"])).reference_conflict_count(), 0);
    }

    #[test]
    fn test_missing_target_is_skipped() {
        let cat = catalog();
        let only = analyses(vec![analysis("a.java", &["MIT"], &["gone.java"])]);
        assert_eq!(find_conflicts(&cat, &only, &found(&["MIT"])).reference_conflict_count(), 0);
    }

    #[test]
    fn test_internal_conflicts_per_file() {
        let cat = catalog();
        let files = analyses(vec![analysis("mixed.c", &["MIT", "GPL"], &[]), analysis("clean.c", &["MIT"], &[])]);
        let report = find_conflicts(&cat, &files, &found(&["MIT", "GPL"]));
        assert_eq!(report.internal.len(), 1);
        assert_eq!(
            report.internal[&FileId::root("mixed.c")],
            vec![LicenseConflict::new(LicenseId::new("GPL"), LicenseId::new("MIT"))]
        );
    }

    #[test]
    fn test_global_count_halves_directed_entries() {
        let cat = catalog();
        let empty = BTreeMap::new();

        // A and B reject each other: two entries, one conflict
        let symmetric = find_conflicts(&cat, &empty, &found(&["A", "B"]));
        assert_eq!(symmetric.global.len(), 2);
        assert_eq!(symmetric.global_conflict_count(), 1);

        // Only GPL rejects MIT: one entry, reported count rounds down
        let asymmetric = find_conflicts(&cat, &empty, &found(&["MIT", "GPL"]));
        assert_eq!(asymmetric.global.len(), 1);
        assert_eq!(asymmetric.global_conflict_count(), 0);
    }
}
