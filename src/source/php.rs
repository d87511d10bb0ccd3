//! PHP: `include` / `require` extraction
//!
//! Only a single literal operand can be resolved. URLs and any computed
//! operand (concatenation, variables, constants) yield an unparsable
//! reference with no target.

use crate::source::{FileId, LexSyntax, LexedSource, Reference, ReferenceKind, SourceLanguage};
use once_cell::sync::Lazy;
use regex::Regex;

/// Tags that switch from inline HTML to PHP code
const OPEN_TAGS: &[&str] = &["<?php", "<?=", "<?"];

static SYNTAX: LexSyntax = LexSyntax {
    line_comments: &["//", "#"],
    line_comment_terminators: &["?>"],
    block_comment: Some(("/*", "*/")),
    string_quotes: &['\'', '"'],
    char_quote: None,
    escape: '\\',
    multiline_strings: true,
    text_block: None,
    embedded_code: Some((OPEN_TAGS, "?>")),
    header_name_directive: None,
};

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^$\w>:])(include_once|include|require_once|require)\b")
        .expect("valid include regex")
});

pub struct PhpSource;

impl SourceLanguage for PhpSource {
    fn name(&self) -> &'static str {
        "php"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["php"]
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
            let raw = &lines[line_no];
            for caps in DIRECTIVE.captures_iter(masked) {
                let Some(keyword) = caps.get(1) else { continue };
                // Statement ends at `;` or `?>`; literals are already masked
                let end = masked[keyword.end()..]
                    .find(|c: char| c == ';' || c == '?')
                    .map(|p| keyword.end() + p)
                    .unwrap_or(raw.len());
                let declaration_end = if raw[end..].starts_with(';') { end + 1 } else { end };
                let declaration = raw[keyword.start()..declaration_end].trim();
                let operand = strip_parens(raw[keyword.end()..end].trim());

                references.push(include_reference(file, operand, declaration, line_no));
            }
        }

        references
    }
}

fn strip_parens(operand: &str) -> &str {
    let mut operand = operand;
    while operand.starts_with('(') && operand.ends_with(')') && operand.len() >= 2 {
        operand = operand[1..operand.len() - 1].trim();
    }
    operand
}

/// The path of a single quoted literal, if that is all the operand is
fn literal_path(operand: &str) -> Option<&str> {
    let quote = operand.chars().next().filter(|q| *q == '\'' || *q == '"')?;
    if operand.len() < 2 || !operand.ends_with(quote) {
        return None;
    }
    let inner = &operand[1..operand.len() - 1];
    (!inner.contains(quote)).then_some(inner)
}

fn include_reference(file: &FileId, operand: &str, declaration: &str, line: usize) -> Reference {
    let Some(path) = literal_path(operand) else {
        return Reference::unparsable(
            file.clone(),
            declaration,
            "Include operand is computed at run time",
            line,
        );
    };
    if path.contains("://") || path.starts_with("www.") {
        return Reference::unparsable(file.clone(), declaration, "Reference to www document", line);
    }
    match FileId::resolve(file.directory(), path) {
        Some(target) => Reference::new(
            file.clone(),
            Some(target),
            ReferenceKind::StaticInclude,
            declaration,
            line,
        ),
        None => Reference::unparsable(file.clone(), declaration, "Include path names no file", line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(name: &str, src: &str) -> Vec<Reference> {
        let file = FileId::parse(name);
        let lines: Vec<String> = src.lines().map(str::to_string).collect();
        PhpSource.scan(&file, &lines).references
    }

    #[test]
    fn test_literal_includes_resolve() {
        let src = "<?php\ninclude 'vars.php';\nrequire_once(\"lib/db.php\");\nrequire '../up.php';";
        let refs = scan("web/index.php", src);
        assert_eq!(refs.len(), 3, "got {:?}", refs);
        assert!(refs.iter().all(|r| r.kind == ReferenceKind::StaticInclude));
        assert_eq!(refs[0].target, Some(FileId::new(Some("web"), "vars.php")));
        assert_eq!(refs[0].declaration, "include 'vars.php';");
        assert_eq!(refs[1].target, Some(FileId::new(Some("web/lib"), "db.php")));
        assert_eq!(refs[2].target, Some(FileId::root("up.php")));
    }

    #[test]
    fn test_url_include_is_unparsable() {
        let refs = scan("index.php", "<?php include 'http://test_web_page.html'; ?>");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, ReferenceKind::Unparsable);
        assert!(refs[0].target.is_none());
        assert_eq!(refs[0].info.as_deref(), Some("Reference to www document"));
    }

    #[test]
    fn test_computed_include_is_unparsable() {
        let src = "<?php\ninclude 'dir/' . $name . '.php';\nrequire $path;\ninclude_once(DIR . 'x.php');";
        let refs = scan("index.php", src);
        assert_eq!(refs.len(), 3);
        assert!(refs
            .iter()
            .all(|r| r.kind == ReferenceKind::Unparsable && r.target.is_none()));
    }

    #[test]
    fn test_lookalikes_are_not_directives() {
        let src = "<?php\n$include = 1;\n$obj->include('x.php');\n// include 'c.php';\n# require 'd.php';\necho 'include \"e.php\";';";
        assert!(scan("index.php", src).is_empty());
    }

    #[test]
    fn test_template_with_inline_html() {
        let src = "<html><p>Don't panic</p></html>\n<?php\n/* Permission is hereby granted */\ninclude 'a.php';\n?>\n<p>It's done, include 'b.php';</p>";
        let lines: Vec<String> = src.lines().map(str::to_string).collect();
        let scanned = PhpSource.scan(&FileId::root("page.php"), &lines);
        let comments: Vec<&str> = scanned.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(comments, vec!["Permission is hereby granted"]);
        assert!(scanned.diagnostics.is_empty());
        assert_eq!(scanned.references.len(), 1);
        assert_eq!(scanned.references[0].target, Some(FileId::root("a.php")));
        assert_eq!(scanned.references[0].line, 3);
    }

    #[test]
    fn test_multiple_directives_on_one_line() {
        let refs = scan("index.php", "<?php include 'a.php'; require 'b.php'; ?>");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].target, Some(FileId::root("b.php")));
    }
}
