//! Source model: file identities, comment lines and cross-file references
//!
//! Every supported language implements [`SourceLanguage`]: a [`LexSyntax`]
//! that drives the shared lexer state machine plus a reference extractor
//! that reads include/import directives from the lexer's masked code view.
//!
//! | Language | Extensions                                  | Directives                          |
//! |----------|---------------------------------------------|-------------------------------------|
//! | C/C++    | `.c` `.cc` `.cpp` `.cxx` `.h` `.hh` `.hpp`  | `#include "x"`, `#include <x>`      |
//! | Java     | `.java`                                     | `package`, `import`, `import static`|
//! | PHP      | `.php`                                      | `include`, `require` (+ `_once`)    |

pub mod lexer;
pub mod cpp;
pub mod java;
pub mod php;

pub use cpp::CppSource;
pub use java::JavaSource;
pub use lexer::{lex, LexDiagnostic, LexSyntax, LexedSource};
pub use php::PhpSource;

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── File Identity ──────────────────────────────────────────────────

/// Identity of a file inside a package: directory path (absent for
/// package-root files) plus file name. Paths always use `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FileId {
    pub path: Option<String>,
    pub name: String,
}

impl FileId {
    pub fn new(path: Option<&str>, name: impl Into<String>) -> Self {
        let path = path
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        Self {
            path,
            name: name.into(),
        }
    }

    /// A file at the package root
    pub fn root(name: impl Into<String>) -> Self {
        Self::new(None, name)
    }

    /// Split a `/`-separated package path into directory and name
    pub fn parse(full: &str) -> Self {
        let full = full.replace('\\', "/");
        match full.trim_matches('/').rsplit_once('/') {
            Some((dir, name)) => Self::new(Some(dir), name),
            None => Self::root(full.trim_matches('/')),
        }
    }

    /// Resolve `relative` against `dir`, normalizing `.` and `..` segments.
    /// Returns `None` when nothing is left to name a file.
    pub fn resolve(dir: Option<&str>, relative: &str) -> Option<Self> {
        let relative = relative.replace('\\', "/");
        let mut segments: Vec<&str> = if relative.starts_with('/') {
            Vec::new()
        } else {
            dir.map(|d| d.split('/').filter(|s| !s.is_empty()).collect())
                .unwrap_or_default()
        };

        for segment in relative.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s),
            }
        }

        let name = segments.pop()?;
        let path = segments.join("/");
        Some(Self::new(Some(&path), name))
    }

    pub fn directory(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Extension after the final `.`, if any
    pub fn extension(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(_, ext)| ext)
    }

    /// Name without its final extension
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }

    /// A `*`-prefixed name stands for every file in the directory ending
    /// with the rest of the name
    pub fn is_wildcard(&self) -> bool {
        self.name.starts_with('*')
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}/{}", path, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl From<String> for FileId {
    fn from(full: String) -> Self {
        Self::parse(&full)
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> Self {
        id.to_string()
    }
}

// ─── Comment Lines ──────────────────────────────────────────────────

/// Comment-only content of one source line. `text` is the substring of
/// the originating line that starts at byte offset `column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentLine {
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl CommentLine {
    pub fn new(text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            text: text.into(),
            line,
            column,
        }
    }

    /// Wrap plain-text lines (license and notice files) as comment lines
    pub fn wrap_plain(lines: &[String]) -> Vec<CommentLine> {
        lines
            .iter()
            .enumerate()
            .map(|(line, text)| CommentLine::new(text.clone(), line, 0))
            .collect()
    }
}

// ─── References ─────────────────────────────────────────────────────

/// How one file refers to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// Package/class import (Java)
    Import,
    /// Textual inclusion (C/C++ `#include "x"`, PHP `include`)
    StaticInclude,
    /// System header or platform package; never checked for conflicts
    ImportStandardLibrary,
    /// Directive whose target is only known at run time
    Unparsable,
}

impl ReferenceKind {
    /// Whether references of this kind carry license obligations across files
    pub fn is_linking(&self) -> bool {
        matches!(self, Self::Import | Self::StaticInclude)
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::StaticInclude => write!(f, "static include"),
            Self::ImportStandardLibrary => write!(f, "standard library import"),
            Self::Unparsable => write!(f, "unparsable"),
        }
    }
}

/// A detected import/include relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub source: FileId,
    pub target: Option<FileId>,
    pub kind: ReferenceKind,
    /// The directive as written (trimmed)
    pub declaration: String,
    /// Why the reference could not be resolved, when it could not
    pub info: Option<String>,
    /// 0-based line of the directive
    pub line: usize,
}

impl Reference {
    pub fn new(
        source: FileId,
        target: Option<FileId>,
        kind: ReferenceKind,
        declaration: impl Into<String>,
        line: usize,
    ) -> Self {
        Self {
            source,
            target,
            kind,
            declaration: declaration.into(),
            info: None,
            line,
        }
    }

    /// A directive whose target cannot be determined statically
    pub fn unparsable(
        source: FileId,
        declaration: impl Into<String>,
        info: impl Into<String>,
        line: usize,
    ) -> Self {
        Self {
            source,
            target: None,
            kind: ReferenceKind::Unparsable,
            declaration: declaration.into(),
            info: Some(info.into()),
            line,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.kind.is_linking() && self.target.as_ref().is_some_and(FileId::is_wildcard)
    }
}

// ─── Languages ──────────────────────────────────────────────────────

/// Result of scanning one source file
#[derive(Debug, Clone, Default)]
pub struct ScannedSource {
    pub comments: Vec<CommentLine>,
    pub references: Vec<Reference>,
    pub diagnostics: Vec<LexDiagnostic>,
}

/// A supported source language: lexer syntax plus reference extraction
pub trait SourceLanguage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower-case file extensions handled by this language
    fn extensions(&self) -> &'static [&'static str];

    fn syntax(&self) -> &'static LexSyntax;

    /// Extract references from the masked code view of a lexed file
    fn extract_references(&self, file: &FileId, lines: &[String], lexed: &LexedSource)
        -> Vec<Reference>;

    fn handles(&self, file: &FileId) -> bool {
        file.extension()
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.extensions().contains(&ext.as_str()))
    }

    /// Lex the file and extract its references
    fn scan(&self, file: &FileId, lines: &[String]) -> ScannedSource {
        let lexed = lex(lines, self.syntax());
        let references = self.extract_references(file, lines, &lexed);
        ScannedSource {
            comments: lexed.comments,
            references,
            diagnostics: lexed.diagnostics,
        }
    }
}

static LANGUAGES: [&dyn SourceLanguage; 3] = [&JavaSource, &CppSource, &PhpSource];

/// Pick the language for a file by extension (case-insensitive)
pub fn language_for(file: &FileId) -> Option<&'static dyn SourceLanguage> {
    LANGUAGES.iter().copied().find(|lang| lang.handles(file))
}

/// Is the given file a supported source file?
pub fn is_source_file(file: &FileId) -> bool {
    language_for(file).is_some()
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_display_and_parse() {
        let id = FileId::new(Some("src/main"), "Foo.java");
        assert_eq!(id.to_string(), "src/main/Foo.java");
        assert_eq!(FileId::parse("src/main/Foo.java"), id);
        assert_eq!(FileId::parse("README"), FileId::root("README"));
        assert_eq!(FileId::new(Some(""), "a.c").path, None);
    }

    #[test]
    fn test_resolve_normalizes_segments() {
        let id = FileId::resolve(Some("a/b"), "../c/./d.h").unwrap();
        assert_eq!(id, FileId::new(Some("a/c"), "d.h"));
        let root = FileId::resolve(Some("a"), "../x.php").unwrap();
        assert_eq!(root, FileId::root("x.php"));
        assert!(FileId::resolve(None, "").is_none());
    }

    #[test]
    fn test_stem_strips_final_extension() {
        assert_eq!(FileId::root("Foo.java").stem(), "Foo");
        assert_eq!(FileId::root("archive.tar.gz").stem(), "archive.tar");
        assert_eq!(FileId::root("Makefile").stem(), "Makefile");
    }

    #[test]
    fn test_language_detection() {
        assert_eq!(language_for(&FileId::root("Xml.java")).unwrap().name(), "java");
        assert_eq!(language_for(&FileId::root("Xml.JaVa")).unwrap().name(), "java");
        assert_eq!(language_for(&FileId::root("Xml.cpp")).unwrap().name(), "c++");
        assert_eq!(language_for(&FileId::root("x.H")).unwrap().name(), "c++");
        assert_eq!(language_for(&FileId::root("index.php")).unwrap().name(), "php");
        assert!(language_for(&FileId::root("Xml.txt")).is_none());
        assert!(!is_source_file(&FileId::root("LICENSE")));
    }

    #[test]
    fn test_file_id_serializes_as_string() {
        let id = FileId::new(Some("lib"), "a.c");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"lib/a.c\"");
        let back: FileId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
