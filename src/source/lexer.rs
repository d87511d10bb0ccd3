//! Comment Lexer: one state machine for every supported language
//!
//! Walks source lines character by character, tracking whether it is in
//! code, a block comment, a string/char literal, a multi-line text block or
//! markup outside embedded code tags (PHP templates). Produces:
//!
//! - **comment lines**: comment-only text with line/column provenance.
//!   Decorative `*` at the start of block comment continuation lines is
//!   stripped. Comment markers inside literals are never treated as
//!   comments.
//! - **masked lines**: the source with comment text, literal interiors
//!   and markup replaced by spaces of the same byte length. Reference extractors
//!   search this view so directives quoted in comments or strings are
//!   ignored, while byte offsets stay valid against the original line.
//! - **diagnostics**: unterminated literals and comments.

use crate::source::CommentLine;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Syntax ─────────────────────────────────────────────────────────

/// Comment and literal syntax of a language
#[derive(Debug, Clone)]
pub struct LexSyntax {
    /// Markers opening a comment that runs to end of line
    pub line_comments: &'static [&'static str],
    /// Tokens that end a line comment early (PHP `?>`)
    pub line_comment_terminators: &'static [&'static str],
    /// Block comment delimiters
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Quotes opening a string literal
    pub string_quotes: &'static [char],
    /// Quote opening a character literal
    pub char_quote: Option<char>,
    pub escape: char,
    /// String literals may continue on the next line
    pub multiline_strings: bool,
    /// Delimiter of multi-line text blocks (Java `"""`), checked before
    /// `string_quotes`
    pub text_block: Option<&'static str>,
    /// Open tags and close tag of embedded code. When set, a file starts
    /// in markup and only text between the tags is lexed as code.
    pub embedded_code: Option<(&'static [&'static str], &'static str)>,
    /// Preprocessor directive whose `<...>` operand is a header name, not
    /// code (C `include`)
    pub header_name_directive: Option<&'static str>,
}

impl LexSyntax {
    fn line_comment_end(&self, line: &str, from: usize) -> usize {
        self.line_comment_terminators
            .iter()
            .filter_map(|t| line[from..].find(t).map(|p| from + p))
            .min()
            .unwrap_or(line.len())
    }

    /// Earliest open tag in `rest` as (offset, tag length); the longest
    /// tag wins at equal offsets
    fn next_open_tag(&self, rest: &str) -> Option<(usize, usize)> {
        let (open_tags, _) = self.embedded_code?;
        open_tags
            .iter()
            .filter_map(|tag| rest.find(tag).map(|p| (p, tag.len())))
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
    }

    fn close_tag(&self) -> Option<&'static str> {
        self.embedded_code.map(|(_, close)| close)
    }

    /// Does `line[..at]` spell the header-name directive (`#include`)?
    fn opens_header_name(&self, line: &str, at: usize) -> bool {
        let Some(directive) = self.header_name_directive else {
            return false;
        };
        line[..at]
            .trim()
            .strip_prefix('#')
            .is_some_and(|rest| rest.trim_start() == directive)
    }
}

// ─── Output ─────────────────────────────────────────────────────────

/// A recoverable lexing problem; the file is still analyzed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexDiagnostic {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for LexDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line + 1, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LexedSource {
    pub comments: Vec<CommentLine>,
    /// One entry per input line, same byte lengths as the input
    pub masked: Vec<String>,
    pub diagnostics: Vec<LexDiagnostic>,
}

// ─── State Machine ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Markup,
    Code,
    BlockComment { opened: usize, first_line: bool },
    Literal { quote: char, is_char: bool, opened: usize },
    TextBlock { opened: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Line,
    BlockOpening,
    BlockContinuation,
}

/// Lex `lines` with the given syntax
pub fn lex(lines: &[String], syntax: &LexSyntax) -> LexedSource {
    let mut lexed = LexedSource::default();
    let mut state = if syntax.embedded_code.is_some() {
        State::Markup
    } else {
        State::Code
    };

    for (line_no, line) in lines.iter().enumerate() {
        let mut masked = line.as_bytes().to_vec();
        let mut i = 0;
        // Byte offset where the open comment/literal starts on this line
        let mut span_from = 0;

        while i < line.len() {
            let rest = &line[i..];
            let Some(ch) = rest.chars().next() else { break };

            match state {
                State::Markup => match syntax.next_open_tag(rest) {
                    Some((offset, len)) => {
                        blank(&mut masked, i, i + offset + len);
                        i += offset + len;
                        state = State::Code;
                    }
                    None => {
                        blank(&mut masked, i, line.len());
                        i = line.len();
                    }
                },
                State::Code => {
                    let block_open = syntax
                        .block_comment
                        .map(|(open, _)| open)
                        .filter(|open| rest.starts_with(open));
                    if let Some(open) = block_open {
                        state = State::BlockComment {
                            opened: line_no,
                            first_line: true,
                        };
                        span_from = i;
                        i += open.len();
                    } else if let Some(marker) =
                        syntax.line_comments.iter().find(|m| rest.starts_with(**m))
                    {
                        let start = i + marker.len();
                        let end = syntax.line_comment_end(line, start);
                        lexed.push_comment(line, line_no, start, end, Segment::Line);
                        blank(&mut masked, i, end);
                        i = end;
                        if end < line.len() {
                            // Terminator (`?>`) is code again
                            continue;
                        }
                    } else if let Some(close) =
                        syntax.close_tag().filter(|close| rest.starts_with(close))
                    {
                        state = State::Markup;
                        i += close.len();
                    } else if let Some(delim) =
                        syntax.text_block.filter(|delim| rest.starts_with(delim))
                    {
                        state = State::TextBlock { opened: line_no };
                        i += delim.len();
                        span_from = i;
                    } else if ch == '<' && syntax.opens_header_name(line, i) {
                        i = rest.find('>').map_or(line.len(), |p| i + p + 1);
                    } else if syntax.string_quotes.contains(&ch) {
                        state = State::Literal {
                            quote: ch,
                            is_char: false,
                            opened: line_no,
                        };
                        i += ch.len_utf8();
                        span_from = i;
                    } else if syntax.char_quote == Some(ch) {
                        state = State::Literal {
                            quote: ch,
                            is_char: true,
                            opened: line_no,
                        };
                        i += ch.len_utf8();
                        span_from = i;
                    } else {
                        i += ch.len_utf8();
                    }
                }
                State::BlockComment { opened, first_line } => {
                    let close = syntax.block_comment.map(|(_, close)| close).unwrap_or("*/");
                    let segment = if first_line {
                        Segment::BlockOpening
                    } else {
                        Segment::BlockContinuation
                    };
                    match rest.find(close) {
                        Some(offset) => {
                            let end = i + offset;
                            if !line[i..end].trim().is_empty() {
                                lexed.push_comment(line, line_no, i, end, segment);
                            }
                            blank(&mut masked, span_from, end + close.len());
                            i = end + close.len();
                            state = State::Code;
                        }
                        None => {
                            if segment == Segment::BlockContinuation
                                || !line[i..].trim().is_empty()
                            {
                                lexed.push_comment(line, line_no, i, line.len(), segment);
                            }
                            blank(&mut masked, span_from, line.len());
                            i = line.len();
                            state = State::BlockComment {
                                opened,
                                first_line: false,
                            };
                        }
                    }
                }
                State::Literal { quote, .. } => {
                    if ch == syntax.escape {
                        i += ch.len_utf8();
                        if let Some(next) = line[i..].chars().next() {
                            i += next.len_utf8();
                        }
                    } else if ch == quote {
                        blank(&mut masked, span_from, i);
                        i += ch.len_utf8();
                        state = State::Code;
                    } else {
                        i += ch.len_utf8();
                    }
                }
                State::TextBlock { .. } => {
                    let delim = syntax.text_block.unwrap_or("\"\"\"");
                    if ch == syntax.escape {
                        i += ch.len_utf8();
                        if let Some(next) = line[i..].chars().next() {
                            i += next.len_utf8();
                        }
                    } else if rest.starts_with(delim) {
                        blank(&mut masked, span_from, i);
                        i += delim.len();
                        state = State::Code;
                    } else {
                        i += ch.len_utf8();
                    }
                }
            }
        }

        // End of line
        match state {
            State::BlockComment { opened, .. } => {
                state = State::BlockComment {
                    opened,
                    first_line: false,
                };
            }
            State::Literal { is_char, opened, .. } => {
                blank(&mut masked, span_from, line.len());
                if is_char || !syntax.multiline_strings {
                    let what = if is_char { "character" } else { "string" };
                    lexed.diagnostics.push(LexDiagnostic {
                        line: opened,
                        message: format!("unterminated {} literal", what),
                    });
                    state = State::Code;
                }
            }
            State::TextBlock { .. } => blank(&mut masked, span_from, line.len()),
            State::Markup | State::Code => {}
        }

        lexed.masked.push(
            String::from_utf8(masked)
                .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
        );
    }

    match state {
        State::BlockComment { opened, .. } => lexed.diagnostics.push(LexDiagnostic {
            line: opened,
            message: "unterminated block comment at end of file".to_string(),
        }),
        State::Literal { opened, .. } => lexed.diagnostics.push(LexDiagnostic {
            line: opened,
            message: "unterminated string literal at end of file".to_string(),
        }),
        State::TextBlock { opened } => lexed.diagnostics.push(LexDiagnostic {
            line: opened,
            message: "unterminated text block at end of file".to_string(),
        }),
        State::Markup | State::Code => {}
    }

    lexed
}

impl LexedSource {
    /// Record `line[start..end]` as comment text after stripping
    /// whitespace and `*` decoration
    fn push_comment(&mut self, line: &str, line_no: usize, start: usize, end: usize, segment: Segment) {
        let mut from = start;
        let skip_ws = |from: usize| end - line[from..end].trim_start().len();

        match segment {
            Segment::Line => from = skip_ws(from),
            Segment::BlockOpening => {
                let stripped = line[from..end].trim_start_matches('*');
                from = skip_ws(end - stripped.len());
            }
            Segment::BlockContinuation => {
                from = skip_ws(from);
                if line[from..end].starts_with('*') {
                    from = skip_ws(from + 1);
                }
            }
        }

        let text = line[from..end].trim_end();
        if text.is_empty() && segment != Segment::BlockContinuation {
            return;
        }
        self.comments.push(CommentLine::new(text, line_no, from));
    }

    /// Comment text only, in line order
    pub fn comment_texts(&self) -> Vec<&str> {
        self.comments.iter().map(|c| c.text.as_str()).collect()
    }
}

/// Replace bytes in `from..to` with spaces. Both bounds are char
/// boundaries, so the buffer stays valid UTF-8.
fn blank(buf: &mut [u8], from: usize, to: usize) {
    let to = to.min(buf.len());
    if from < to {
        buf[from..to].fill(b' ');
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
