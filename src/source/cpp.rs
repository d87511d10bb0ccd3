//! C/C++: `#include` extraction

use crate::source::{FileId, LexSyntax, LexedSource, Reference, ReferenceKind, SourceLanguage};
use once_cell::sync::Lazy;
use regex::Regex;

static SYNTAX: LexSyntax = LexSyntax {
    line_comments: &["//"],
    line_comment_terminators: &[],
    block_comment: Some(("/*", "*/")),
    string_quotes: &['"'],
    char_quote: Some('\''),
    escape: '\\',
    multiline_strings: false,
    text_block: None,
    embedded_code: None,
    header_name_directive: Some("include"),
};

static INCLUDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#\s*include\b").expect("valid include regex"));

pub struct CppSource;

impl SourceLanguage for CppSource {
    fn name(&self) -> &'static str {
        "c++"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["c", "cc", "cpp", "cxx", "h", "hh", "hpp"]
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
        let mut references = Vec::new();

        for (line_no, masked) in lexed.masked.iter().enumerate() {
            let Some(directive) = INCLUDE.find(masked) else {
                continue;
            };
            let raw = &lines[line_no];
            let declaration = raw.trim();
            let operand = raw[directive.end()..].trim();

            let reference = match parse_operand(operand) {
                Some(('"', path)) => match FileId::resolve(file.directory(), path) {
                    Some(target) => Reference::new(
                        file.clone(),
                        Some(target),
                        ReferenceKind::StaticInclude,
                        declaration,
                        line_no,
                    ),
                    None => Reference::unparsable(
                        file.clone(),
                        declaration,
                        "Include path names no file",
                        line_no,
                    ),
                },
                Some((_, path)) => Reference::new(
                    file.clone(),
                    FileId::resolve(None, path),
                    ReferenceKind::ImportStandardLibrary,
                    declaration,
                    line_no,
                ),
                None => Reference::unparsable(
                    file.clone(),
                    declaration,
                    "Include operand is not a quoted or bracketed path",
                    line_no,
                ),
            };
            references.push(reference);
        }

        references
    }
}

/// Split `"path"` or `<path>` into its delimiter and non-empty path
fn parse_operand(operand: &str) -> Option<(char, &str)> {
    let open = operand.chars().next()?;
    let close = match open {
        '"' => '"',
        '<' => '>',
        _ => return None,
    };
    let rest = &operand[1..];
    let end = rest.find(close)?;
    let path = rest[..end].trim();
    (!path.is_empty()).then_some((open, path))
}
