//! # lictrace Engine: Package Orchestrator
//!
//! One run over a package:
//!
//! - `file_index`: classify every enumerated file once
//! - per-file analysis: lex, extract references, match licenses, scan
//!   inline markers, then `reduce` the matches
//! - `references`: expand wildcard imports against the source files
//! - `conflicts`: intra-file, per-reference and package-wide conflicts
//! - `progress`: observers and cooperative cancellation
//! - `config`: thresholds, algorithms and exclusions (`.lictrace.toml`)

pub mod config;
pub mod conflicts;
pub mod file_index;
pub mod progress;
pub mod reduce;
pub mod references;

pub use config::ProcessorConfig;
pub use conflicts::{ConflictReport, ReferenceConflict};
pub use file_index::{FileCategory, FileIndex};
pub use progress::{CancellationToken, ProgressEvent, ProgressObserver};

use crate::detection::{scan_inline_markers, LicenseMatch, LicenseMatcher};
use crate::ingest::PackageSource;
use crate::license::{LicenseCatalog, LicenseId};
use crate::source::{self, lexer, CommentLine, FileId, Reference};
use crate::{LictraceError, LictraceResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

// ─── Per-file Results ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileErrorKind {
    Lexing,
    Matching,
    Catalog,
}

/// A recoverable problem found while analyzing one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub kind: FileErrorKind,
    pub message: String,
}

impl FileError {
    pub fn new(kind: FileErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub file: FileId,
    pub category: FileCategory,
    /// Source language name, for source files
    pub language: Option<String>,
    /// Reduced license matches
    pub matches: Vec<LicenseMatch>,
    pub references: Vec<Reference>,
    pub errors: Vec<FileError>,
}

impl FileAnalysis {
    pub fn new(file: FileId, category: FileCategory) -> Self {
        Self {
            file,
            category,
            language: None,
            matches: Vec::new(),
            references: Vec::new(),
            errors: Vec::new(),
        }
    }
}

// ─── Package Report ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageReport {
    pub package: String,
    pub files: FileIndex,
    /// Source and license files; unknown files are not analyzed
    pub analyses: BTreeMap<FileId, FileAnalysis>,
    pub found_licenses: BTreeSet<LicenseId>,
    /// Number of files each license was found in
    pub license_counts: BTreeMap<LicenseId, usize>,
    /// Best match ratio seen per license
    pub max_ratios: BTreeMap<LicenseId, f64>,
    pub conflicts: ConflictReport,
    pub duration_ms: u64,
}

/// Headline numbers of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub source_files: usize,
    pub license_files: usize,
    pub all_files: usize,
    pub distinct_licenses: usize,
    pub internal_conflicts: usize,
    pub reference_conflicts: usize,
    pub global_conflicts: usize,
}

impl PackageReport {
    pub fn analysis(&self, file: &FileId) -> Option<&FileAnalysis> {
        self.analyses.get(file)
    }

    /// Reduced matches of a file; empty for unknown or unanalyzed files
    pub fn matches(&self, file: &FileId) -> &[LicenseMatch] {
        self.analyses.get(file).map(|a| a.matches.as_slice()).unwrap_or(&[])
    }

    pub fn references(&self, file: &FileId) -> &[Reference] {
        self.analyses.get(file).map(|a| a.references.as_slice()).unwrap_or(&[])
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            source_files: self.files.source_files.len(),
            license_files: self.files.license_files.len(),
            all_files: self.files.len(),
            distinct_licenses: self.found_licenses.len(),
            internal_conflicts: self.conflicts.internal_conflict_count(),
            reference_conflicts: self.conflicts.reference_conflict_count(),
            global_conflicts: self.conflicts.global_conflict_count(),
        }
    }

    pub fn to_json(&self) -> LictraceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Result of [`PackageProcessor::process`]
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    Completed(PackageReport),
    Cancelled,
}

impl ProcessOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn into_report(self) -> Option<PackageReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Cancelled => None,
        }
    }
}

// ─── Processor ──────────────────────────────────────────────────────

pub struct PackageProcessor {
    catalog: Arc<LicenseCatalog>,
    config: ProcessorConfig,
    observers: Vec<Box<dyn ProgressObserver>>,
}

impl PackageProcessor {
    pub fn new(catalog: Arc<LicenseCatalog>, config: ProcessorConfig) -> Self {
        Self {
            catalog,
            config: config.validated(),
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.add_observer(Box::new(observer));
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &LicenseCatalog {
        &self.catalog
    }

    /// Analyze every file of `package`, then resolve wildcard references
    /// and detect conflicts. Cancellation is checked before each file.
    pub fn process(
        &self,
        package: &dyn PackageSource,
        cancel: &CancellationToken,
    ) -> LictraceResult<ProcessOutcome> {
        let start = Instant::now();
        if self.catalog.is_empty() {
            return Err(LictraceError::CatalogError("license catalog is empty".into()));
        }

        info!(
            "Processing package {} ({} licenses, threshold {:.2})",
            package.name(),
            self.catalog.len(),
            self.config.match_threshold
        );
        self.notify(|o| o.begin());

        let count = if self.observers.is_empty() {
            0
        } else {
            let mut count = 0;
            for file in package.files() {
                if cancel.is_cancelled() {
                    return Ok(self.cancelled());
                }
                if matches!(self.admit(&file), Some(c) if c != FileCategory::Unknown) {
                    count += 1;
                }
            }
            count
        };

        let matcher = LicenseMatcher::new(&self.catalog, self.config.match_threshold);
        let mut files = FileIndex::default();
        let mut analyses = BTreeMap::new();

        if self.config.parallel {
            let mut work = Vec::new();
            for file in package.files() {
                if cancel.is_cancelled() {
                    return Ok(self.cancelled());
                }
                let Some(category) = self.admit(&file) else {
                    continue;
                };
                files.push(file.clone(), category);
                if category != FileCategory::Unknown {
                    work.push((file, category));
                }
            }

            // Index assignment and delivery share one lock so observers see
            // `file` events in index order
            let next = Mutex::new(0usize);
            let done: Vec<Option<FileAnalysis>> = work
                .par_iter()
                .map(|(file, category)| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    {
                        let mut index = next.lock().unwrap_or_else(PoisonError::into_inner);
                        self.notify(|o| o.file(*index, count, file));
                        *index += 1;
                    }
                    Some(self.analyze(package, &matcher, file, *category))
                })
                .collect();

            if cancel.is_cancelled() {
                return Ok(self.cancelled());
            }
            for analysis in done.into_iter().flatten() {
                analyses.insert(analysis.file.clone(), analysis);
            }
        } else {
            let mut index = 0;
            for file in package.files() {
                if cancel.is_cancelled() {
                    return Ok(self.cancelled());
                }
                let Some(category) = self.admit(&file) else {
                    continue;
                };
                files.push(file.clone(), category);
                if category == FileCategory::Unknown {
                    continue;
                }
                self.notify(|o| o.file(index, count, &file));
                index += 1;
                let analysis = self.analyze(package, &matcher, &file, category);
                analyses.insert(file, analysis);
            }
        }

        for analysis in analyses.values_mut() {
            let refs = std::mem::take(&mut analysis.references);
            analysis.references = references::expand_wildcards(refs, &files.source_files);
        }

        let mut license_counts: BTreeMap<LicenseId, usize> = BTreeMap::new();
        let mut max_ratios: BTreeMap<LicenseId, f64> = BTreeMap::new();
        for m in analyses.values().flat_map(|a| &a.matches) {
            *license_counts.entry(m.license.clone()).or_default() += 1;
            let best = max_ratios.entry(m.license.clone()).or_insert(m.ratio);
            *best = best.max(m.ratio);
        }
        let found_licenses: BTreeSet<LicenseId> = license_counts.keys().cloned().collect();
        let conflicts = conflicts::find_conflicts(&self.catalog, &analyses, &found_licenses);

        let report = PackageReport {
            package: package.name(),
            files,
            analyses,
            found_licenses,
            license_counts,
            max_ratios,
            conflicts,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        let summary = report.summary();
        info!(
            "Processed {} files ({} source, {} license): {} licenses, {} reference conflicts, {} global conflicts ({}ms)",
            summary.all_files,
            summary.source_files,
            summary.license_files,
            summary.distinct_licenses,
            summary.reference_conflicts,
            summary.global_conflicts,
            report.duration_ms
        );
        self.notify(|o| o.end());

        Ok(ProcessOutcome::Completed(report))
    }

    /// Comment lines of one file, lexed on demand. License files come
    /// back as plain text lines.
    pub fn read_comments(
        &self,
        package: &dyn PackageSource,
        file: &FileId,
    ) -> LictraceResult<Vec<CommentLine>> {
        let lines = package.read_lines(file)?;
        match source::language_for(file) {
            Some(language) => Ok(lexer::lex(&lines, language.syntax()).comments),
            None if self.config.is_license_file(file) => Ok(CommentLine::wrap_plain(&lines)),
            None => Err(LictraceError::AnalysisError(format!(
                "{} is neither a source file nor a license file",
                file
            ))),
        }
    }

    fn notify(&self, event: impl Fn(&dyn ProgressObserver)) {
        for observer in &self.observers {
            event(observer.as_ref());
        }
    }

    fn cancelled(&self) -> ProcessOutcome {
        info!("Processing cancelled");
        self.notify(|o| o.cancelled());
        ProcessOutcome::Cancelled
    }

    /// Category of a file, or `None` when it is excluded
    fn admit(&self, file: &FileId) -> Option<FileCategory> {
        if self.config.is_excluded(file) {
            debug!("{}: excluded", file);
            return None;
        }
        let category = file_index::classify(file, &self.config);
        debug!("{}: {:?}", file, category);
        Some(category)
    }

    fn analyze(
        &self,
        package: &dyn PackageSource,
        matcher: &LicenseMatcher<'_>,
        file: &FileId,
        category: FileCategory,
    ) -> FileAnalysis {
        let mut analysis = FileAnalysis::new(file.clone(), category);

        let lines = match package.read_lines(file) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("{}: cannot read file: {}", file, e);
                analysis
                    .errors
                    .push(FileError::new(FileErrorKind::Matching, format!("cannot read file: {}", e)));
                return analysis;
            }
        };

        let raw = match category {
            FileCategory::SourceCode => match source::language_for(file) {
                Some(language) => {
                    analysis.language = Some(language.name().to_string());
                    let scanned = language.scan(file, &lines);
                    for diagnostic in &scanned.diagnostics {
                        warn!("{}: {}", file, diagnostic);
                        analysis
                            .errors
                            .push(FileError::new(FileErrorKind::Lexing, diagnostic.to_string()));
                    }
                    analysis.references = scanned.references;
                    let mut raw = matcher.match_comments(&scanned.comments, self.config.source_algorithm);
                    raw.extend(scan_inline_markers(&lines, &self.catalog));
                    raw
                }
                None => Vec::new(),
            },
            FileCategory::LicenseFile => {
                matcher.match_comments(&CommentLine::wrap_plain(&lines), self.config.license_file_algorithm)
            }
            FileCategory::Unknown => Vec::new(),
        };
        analysis.matches = reduce::reduce_matches(raw, &self.catalog);

        for m in &analysis.matches {
            let Some(parents) = self.catalog.get(&m.license).and_then(|r| r.parents()) else {
                continue;
            };
            for parent in parents.iter().filter(|p| self.catalog.get(p).is_none()) {
                let message = format!("exception {} names unknown parent {}", m.license, parent);
                warn!("{}: {}", file, message);
                analysis.errors.push(FileError::new(FileErrorKind::Catalog, message));
            }
        }

        debug!(
            "{}: {} matches, {} references",
            file,
            analysis.matches.len(),
            analysis.references.len()
        );
        analysis
    }
}
