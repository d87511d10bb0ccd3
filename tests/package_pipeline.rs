//! Integration test: full package runs
//!
//! Builds small packages in memory and on disk, runs the processor end to
//! end and checks matches, wildcard expansion, conflicts, progress events
//! and cancellation.

use lictrace::engine::FileCategory;
use lictrace::{
    CancellationToken, CatalogBuilder, DirectoryPackage, FileId, LicenseCatalog, LicenseId,
    LicenseRecord, MemoryPackage, PackageProcessor, PackageReport, ProcessorConfig,
    ProgressEvent, ProgressObserver, ReferenceKind,
};
use std::sync::mpsc;
use std::sync::Arc;

// ─── Fixtures ───────────────────────────────────────────────────────

const MIT: &str = "Copyright (c) <year> <copyright holders>\n\
\n\
Permission is hereby granted, free of charge, to any person obtaining a copy\n\
of this software and associated documentation files (the \"Software\"), to deal\n\
in the Software without restriction, including without limitation the rights\n\
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell\n\
copies of the Software, and to permit persons to whom the Software is\n\
furnished to do so, subject to the following conditions:\n\
\n\
The above copyright notice and this permission notice shall be included in\n\
all copies or substantial portions of the Software.";

const GPL: &str = "This program is free software; you can redistribute it and/or modify\n\
it under the terms of the GNU General Public License as published by\n\
the Free Software Foundation; either version 2 of the License.";

fn catalog() -> Arc<LicenseCatalog> {
    Arc::new(
        CatalogBuilder::new()
            .with(LicenseRecord::standard("MIT", "MIT License", MIT).compatible_with("GPL-2.0"))
            .with(LicenseRecord::standard("GPL-2.0", "GNU General Public License v2", GPL))
            .build()
            .unwrap(),
    )
}

/// `text` as a `/* ... */` block with ` * ` continuation lines
fn block_comment(text: &str) -> String {
    let mut out = String::from("/*\n");
    for line in text.lines() {
        out.push_str(" * ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(" */\n");
    out
}

fn mit_header() -> String {
    block_comment(&MIT.replace("<year> <copyright holders>", "2024 Jane Doe"))
}

fn completed(processor: &PackageProcessor, package: &MemoryPackage) -> PackageReport {
    processor
        .process(package, &CancellationToken::new())
        .unwrap()
        .into_report()
        .expect("run completes")
}

// ─── Matching and References ────────────────────────────────────────

#[test]
fn test_mit_header_in_java_source() {
    let package = MemoryPackage::new("java").with_file(
        "demo/Main.java",
        &format!("{}package demo;\n\npublic class Main {{}}\n", mit_header()),
    );
    let processor = PackageProcessor::new(catalog(), ProcessorConfig::default());
    let report = completed(&processor, &package);

    let matches = report.matches(&FileId::new(Some("demo"), "Main.java"));
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].license, LicenseId::new("MIT"));
    assert!(matches[0].percent() >= 95.0, "matched {:.1}%", matches[0].percent());
    let tags = matches[0].tags.as_ref().unwrap();
    assert_eq!(tags["<year>"], "2024");
    assert_eq!(report.found_licenses.len(), 1);
}

#[test]
fn test_wildcard_import_conflicts_with_gpl_file() {
    let package = MemoryPackage::new("java")
        .with_file(
            "demo/Main.java",
            &format!("{}package demo;\nimport demo.util.*;\nimport java.util.List;\n", mit_header()),
        )
        .with_file(
            "demo/util/Helper.java",
            &format!("{}package demo.util;\nclass Helper {{}}\n", block_comment(GPL)),
        );
    let processor = PackageProcessor::new(catalog(), ProcessorConfig::default());
    let report = completed(&processor, &package);

    let refs = report.references(&FileId::new(Some("demo"), "Main.java"));
    let helper = refs
        .iter()
        .find(|r| r.kind == ReferenceKind::Import)
        .expect("wildcard expanded");
    assert_eq!(helper.target, Some(FileId::new(Some("demo/util"), "Helper.java")));
    assert_eq!(helper.declaration, "import demo.util.Helper;");
    assert!(refs.iter().any(|r| r.kind == ReferenceKind::ImportStandardLibrary));

    let summary = report.summary();
    assert_eq!(summary.reference_conflicts, 1);
    let conflict = &report.conflicts.references[0];
    assert_eq!(conflict.source_license, LicenseId::new("MIT"));
    assert_eq!(conflict.target_license, LicenseId::new("GPL-2.0"));
    assert!(!report.conflicts.global.is_empty());
}

#[test]
fn test_static_include_conflict() {
    let package = MemoryPackage::new("c")
        .with_file("src/main.c", &format!("{}#include \"gpl.h\"\n#include <stdio.h>\n", mit_header()))
        .with_file("src/gpl.h", &format!("{}int helper(void);\n", block_comment(GPL)));
    let processor = PackageProcessor::new(catalog(), ProcessorConfig::default());
    let report = completed(&processor, &package);

    assert_eq!(report.summary().reference_conflicts, 1);
    assert_eq!(
        report.conflicts.references[0].reference.kind,
        ReferenceKind::StaticInclude
    );
}

#[test]
fn test_gpl_file_including_near_verbatim_mit_file() {
    // MIT accepts nothing else; GPL accepts MIT
    let catalog = Arc::new(
        CatalogBuilder::new()
            .with(LicenseRecord::standard("mit", "MIT License", MIT))
            .with(LicenseRecord::standard("gpl", "GNU General Public License v2", GPL).compatible_with("mit"))
            .build()
            .unwrap(),
    );
    let reworded = MIT
        .replace("<year> <copyright holders>", "1999 The Authors")
        .replace("hereby granted", "herewith granted")
        .replace("associated documentation", "related documentation");
    let package = MemoryPackage::new("c")
        .with_file("file1.c", &format!("{}int one(void);\n", block_comment(&reworded)))
        .with_file(
            "file2.c",
            &format!("{}#include \"file1.c\"\nint two(void);\n", block_comment(GPL)),
        );
    let processor = PackageProcessor::new(catalog, ProcessorConfig::default());
    let report = completed(&processor, &package);

    let file1 = report.matches(&FileId::root("file1.c"));
    assert_eq!(file1.len(), 1);
    assert_eq!(file1[0].license, LicenseId::new("mit"));
    assert!(file1[0].ratio >= 0.10);
    assert!(file1[0].ratio < 1.0, "substituted words still matched: {}", file1[0].ratio);

    assert_eq!(report.summary().reference_conflicts, 1);
    let conflict = &report.conflicts.references[0];
    assert_eq!(conflict.reference.source, FileId::root("file2.c"));
    assert_eq!(conflict.reference.kind, ReferenceKind::StaticInclude);
    assert_eq!(conflict.reference.declaration, "#include \"file1.c\"");
    assert_eq!(conflict.source_license, LicenseId::new("gpl"));
    assert_eq!(conflict.target_license, LicenseId::new("mit"));

    assert!(!report.conflicts.global.is_empty());
    assert!(report
        .conflicts
        .global
        .iter()
        .all(|c| c.license == LicenseId::new("mit") && c.rejects == LicenseId::new("gpl")));
}

// ─── Progress and Cancellation ──────────────────────────────────────

#[test]
fn test_progress_events_in_order() {
    let package = MemoryPackage::new("events")
        .with_file("a.c", "int a;")
        .with_file("b.php", "<?php echo 1;")
        .with_file("notes.txt", "not analyzed");
    let (tx, rx) = mpsc::channel();
    let processor = PackageProcessor::new(catalog(), ProcessorConfig::default()).with_observer(tx);
    completed(&processor, &package);
    drop(processor);

    let events: Vec<ProgressEvent> = rx.iter().collect();
    assert_eq!(
        events,
        vec![
            ProgressEvent::Begin,
            ProgressEvent::File { index: 0, count: 2, file: FileId::root("a.c") },
            ProgressEvent::File { index: 1, count: 2, file: FileId::root("b.php") },
            ProgressEvent::End,
        ]
    );
}

struct CancelAt {
    index: usize,
    token: CancellationToken,
}

impl ProgressObserver for CancelAt {
    fn file(&self, index: usize, _count: usize, _file: &FileId) {
        if index == self.index {
            self.token.cancel();
        }
    }
}

#[test]
fn test_cancel_midway_reports_nothing() {
    let mut package = MemoryPackage::new("big");
    for i in 0..100 {
        package.add_file(&format!("f{:03}.c", i), "/* Permission is hereby granted */\nint x;\n");
    }

    let token = CancellationToken::new();
    let (tx, rx) = mpsc::channel();
    let processor = PackageProcessor::new(catalog(), ProcessorConfig::default())
        .with_observer(CancelAt { index: 50, token: token.clone() })
        .with_observer(tx);

    let outcome = processor.process(&package, &token).unwrap();
    assert!(outcome.is_cancelled());
    drop(processor);

    let events: Vec<ProgressEvent> = rx.iter().collect();
    assert_eq!(events.first(), Some(&ProgressEvent::Begin));
    assert_eq!(events.last(), Some(&ProgressEvent::Cancelled));
    assert!(!events.contains(&ProgressEvent::End));
    let files = events.iter().filter(|e| matches!(e, ProgressEvent::File { .. })).count();
    assert_eq!(files, 51);
    assert!(events
        .iter()
        .all(|e| !matches!(e, ProgressEvent::File { count, .. } if *count != 100)));
}

// ─── Directory Packages ─────────────────────────────────────────────

#[test]
fn test_directory_package_with_project_config() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::create_dir_all(root.join("vendor")).unwrap();
    std::fs::write(root.join("LICENSE"), MIT.replace("<year> <copyright holders>", "2024 Jane Doe")).unwrap();
    std::fs::write(root.join("src/main.c"), format!("{}int main(void) {{ return 0; }}\n", mit_header())).unwrap();
    std::fs::write(root.join("vendor/gpl.c"), block_comment(GPL)).unwrap();
    std::fs::write(
        root.join(".lictrace.toml"),
        "match_threshold = 0.5\nexclude_paths = [\"vendor/\"]\nparallel = true\n",
    )
    .unwrap();

    let config = ProcessorConfig::from_project_root(root);
    assert_eq!(config.match_threshold, 0.5);
    assert!(config.parallel);

    let package = DirectoryPackage::new(root).unwrap();
    let report = PackageProcessor::new(catalog(), config)
        .process(&package, &CancellationToken::new())
        .unwrap()
        .into_report()
        .unwrap();

    assert_eq!(report.files.source_files, vec![FileId::new(Some("src"), "main.c")]);
    assert_eq!(report.files.license_files, vec![FileId::root("LICENSE")]);
    assert_eq!(
        report.analysis(&FileId::root("LICENSE")).unwrap().category,
        FileCategory::LicenseFile
    );
    assert_eq!(report.license_counts[&LicenseId::new("MIT")], 2);
    assert!(!report.found_licenses.contains(&LicenseId::new("GPL-2.0")));
    assert!(report.conflicts.is_empty());
}
