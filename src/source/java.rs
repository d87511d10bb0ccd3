//! Java: `package` / `import` extraction
//!
//! Import targets are resolved against the package root: the file's
//! directory minus the path spelled by its `package` declaration. A
//! wildcard import `a.b.*` targets `a/b/*.java`, expanded later against
//! the package's source files. Static imports target the declaring class.

use crate::source::{FileId, LexSyntax, LexedSource, Reference, ReferenceKind, SourceLanguage};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static SYNTAX: LexSyntax = LexSyntax {
    line_comments: &["//"],
    line_comment_terminators: &[],
    block_comment: Some(("/*", "*/")),
    string_quotes: &['"'],
    char_quote: Some('\''),
    escape: '\\',
    multiline_strings: false,
    text_block: Some("\"\"\""),
    embedded_code: None,
    header_name_directive: None,
};

static PACKAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*package\s+([\w$]+(?:\s*\.\s*[\w$]+)*)\s*;").expect("valid package regex")
});

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*import\s+(static\s+)?([\w$]+(?:\s*\.\s*[\w$]+)*(?:\s*\.\s*\*)?)\s*;")
        .expect("valid import regex")
});

/// Platform package prefixes treated as standard library
pub const STANDARD_LIBRARY_PREFIXES: &[&str] = &[
    "java.", "javax.", "jdk.", "sun.", "com.sun.", "org.w3c.", "org.xml.",
];

pub struct JavaSource;

impl SourceLanguage for JavaSource {
    fn name(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn syntax(&self) -> &'static LexSyntax {
        &SYNTAX
    }

    fn extract_references(
        &self,
        file: &FileId,
        lines: &[String],
        lexed: &LexedSource,
    ) -> Vec<Reference> {
        let package = lexed
            .masked
            .iter()
            .find_map(|line| PACKAGE.captures(line))
            .map(|c| squash(&c[1]));
        let root = package_root(file, package.as_deref());

        let mut references = Vec::new();
        for (line_no, masked) in lexed.masked.iter().enumerate() {
            let Some(caps) = IMPORT.captures(masked) else {
                continue;
            };
            let is_static = caps.get(1).is_some();
            let name = squash(&caps[2]);
            let declaration = lines[line_no].trim();

            let kind = if is_standard_library(&name) {
                ReferenceKind::ImportStandardLibrary
            } else {
                ReferenceKind::Import
            };

            match import_target(root.as_deref(), &name, is_static) {
                Some(target) => references.push(Reference::new(
                    file.clone(),
                    Some(target),
                    kind,
                    declaration,
                    line_no,
                )),
                None => references.push(Reference::unparsable(
                    file.clone(),
                    declaration,
                    "Import names no class",
                    line_no,
                )),
            }
        }

        references
    }
}

/// Remove whitespace around `.` separators
fn squash(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn is_standard_library(qualified: &str) -> bool {
    STANDARD_LIBRARY_PREFIXES
        .iter()
        .any(|prefix| qualified.starts_with(prefix))
}

/// Directory that package paths are relative to
fn package_root(file: &FileId, package: Option<&str>) -> Option<String> {
    let Some(package) = package else {
        return file.path.clone();
    };
    let package_dir = package.replace('.', "/");
    match file.directory() {
        Some(dir) if dir == package_dir => None,
        Some(dir) => match dir.strip_suffix(&package_dir) {
            Some(prefix) if prefix.ends_with('/') => {
                Some(prefix.trim_end_matches('/').to_string())
            }
            _ => {
                debug!(
                    "{}: package {} does not match its directory, resolving from package root",
                    file, package
                );
                None
            }
        },
        None => None,
    }
}

fn import_target(root: Option<&str>, name: &str, is_static: bool) -> Option<FileId> {
    let mut segments: Vec<&str> = name.split('.').filter(|s| !s.is_empty()).collect();
    if is_static {
        // Member (or `*`) of the declaring class
        segments.pop();
    }
    let last = segments.pop()?;
    let file_name = if last == "*" {
        "*.java".to_string()
    } else {
        format!("{}.java", last)
    };
    segments.push(&file_name);
    FileId::resolve(root, &segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(name: &str, src: &str) -> Vec<Reference> {
        let file = FileId::parse(name);
        let lines: Vec<String> = src.lines().map(str::to_string).collect();
        JavaSource.scan(&file, &lines).references
    }

    const HELLO: &str = "package test_sources;\n\
        /*\n * what ever key words there are like import or package don't matter\n */\n\
        import java.io.*;\n\
        import test_sources.Other;\n\
        import  test_sources . util . * ;\n\
        import invisibleWorld;\n\
        import static test_sources.Consts.MAX;\n\
        public class HelloWorld {}";

    #[test]
    fn test_imports_resolve_against_package_root() {
        let refs = scan("project/test_sources/HelloWorld.java", HELLO);
        assert_eq!(refs.len(), 5, "got {:?}", refs);

        assert_eq!(refs[0].kind, ReferenceKind::ImportStandardLibrary);
        assert_eq!(refs[0].declaration, "import java.io.*;");

        assert_eq!(refs[1].kind, ReferenceKind::Import);
        assert_eq!(
            refs[1].target,
            Some(FileId::new(Some("project/test_sources"), "Other.java"))
        );

        assert_eq!(
            refs[2].target,
            Some(FileId::new(Some("project/test_sources/util"), "*.java"))
        );
        assert!(refs[2].is_wildcard());

        assert_eq!(
            refs[3].target,
            Some(FileId::new(Some("project"), "invisibleWorld.java"))
        );
        assert_eq!(
            refs[4].target,
            Some(FileId::new(Some("project/test_sources"), "Consts.java"))
        );
    }

    #[test]
    fn test_package_at_root_directory() {
        let refs = scan("test_sources/HelloWorld.java", HELLO);
        assert_eq!(refs[1].target, Some(FileId::new(Some("test_sources"), "Other.java")));
        assert_eq!(refs[3].target, Some(FileId::root("invisibleWorld.java")));
    }

    #[test]
    fn test_default_package_resolves_in_file_directory() {
        let refs = scan("src/Main.java", "import Helper;\nclass Main {}");
        assert_eq!(refs[0].target, Some(FileId::new(Some("src"), "Helper.java")));
    }

    #[test]
    fn test_commented_imports_are_ignored() {
        let refs = scan("Main.java", "// import a.B;\n/* import c.D; */\nclass Main {}");
        assert!(refs.is_empty());
    }

    #[test]
    fn test_standard_library_prefixes() {
        assert!(is_standard_library("javax.swing.JFrame"));
        assert!(is_standard_library("org.w3c.dom.Node"));
        assert!(!is_standard_library("javafx.scene.Scene"));
        assert!(!is_standard_library("org.example.Thing"));
    }
}
