//! # lictrace: Source-level License Detection and Conflict Analysis
//!
//! Scans a software package, finds license texts and license-like phrases in
//! source comments and license files, traces include/import references
//! between files, and reports license conflicts within files, across
//! references and across the whole package.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      PackageProcessor                        │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐  │
//! │  │PackageSource │──▶│ FileIndex    │──▶│ ProgressObserver │  │
//! │  │(mem / dir)   │   │ (classify)   │   │ (+ cancellation) │  │
//! │  └──────────────┘   └──────┬───────┘   └──────────────────┘  │
//! │                            │ per file (optionally rayon)     │
//! │  ┌─────────────────────────▼─────────────────────────────┐   │
//! │  │ Lexer → References │ Matcher + Inline Markers → Reduce │   │
//! │  └─────────────────────────┬─────────────────────────────┘   │
//! │  ┌─────────────────────────▼─────────────────────────────┐   │
//! │  │ Wildcard Resolution → Conflicts → PackageReport        │   │
//! │  └───────────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Capabilities
//!
//! - **Comment Lexing**: C/C++, Java and PHP comment extraction that is
//!   aware of string and character literals
//! - **Reference Extraction**: `#include`, `import`, `include`/`require`
//!   with wildcard expansion against the package
//! - **License Matching**: token alignment with placeholder tags, exact and
//!   partial modes, forbidden phrases, gated exception matching
//! - **Inline Markers**: `MODULE_LICENSE("...")` declarations
//! - **Conflict Detection**: intra-file, per-reference and package-wide
//! - **Configuration**: `.lictrace.toml` for thresholds, algorithms and
//!   exclusions

pub mod license;
pub mod source;
pub mod detection;
pub mod engine;
pub mod ingest;

// Re-exports for convenience
pub use license::{CatalogBuilder, LicenseCatalog, LicenseId, LicenseKind, LicenseRecord};
pub use source::{CommentLine, FileId, Reference, ReferenceKind};
pub use detection::{LicenseMatch, MatchAlgorithm, MatchPosition};
pub use engine::{
    CancellationToken, FileAnalysis, PackageProcessor, PackageReport, ProcessOutcome,
    ProcessorConfig, ProgressEvent, ProgressObserver, ReportSummary,
};
pub use ingest::{DirectoryPackage, MemoryPackage, PackageSource};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LictraceError {
    #[error("License catalog error: {0}")]
    CatalogError(String),

    #[error("Package error: {0}")]
    PackageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Analysis error: {0}")]
    AnalysisError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type LictraceResult<T> = Result<T, LictraceError>;
