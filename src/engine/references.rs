//! Wildcard reference expansion
//!
//! `import a.b.*;` is extracted with the target `a/b/*.java`. Once every
//! source file in the package is known, each wildcard becomes one concrete
//! reference per matching file. A wildcard with no hits is kept as is.

use crate::source::{FileId, Reference};

pub fn expand_wildcards(references: Vec<Reference>, source_files: &[FileId]) -> Vec<Reference> {
    let mut expanded = Vec::with_capacity(references.len());

    for reference in references {
        let Some(target) = reference.target.as_ref().filter(|_| reference.is_wildcard()) else {
            expanded.push(reference);
            continue;
        };
        let suffix = &target.name[1..];
        let hits: Vec<&FileId> = source_files
            .iter()
            .filter(|f| f.path == target.path && f.name.ends_with(suffix) && !f.is_wildcard())
            .collect();

        if hits.is_empty() {
            expanded.push(reference);
            continue;
        }
        for hit in hits {
            expanded.push(Reference {
                source: reference.source.clone(),
                target: Some(hit.clone()),
                kind: reference.kind,
                declaration: reference.declaration.replace('*', hit.stem()),
                info: reference.info.clone(),
                line: reference.line,
            });
        }
    }

    expanded
}
