//! Tokenization of comment input and license text
//!
//! Words are maximal runs of alphanumeric characters, compared in lower
//! case. Punctuation and layout never matter. In license text, `<...>`
//! spans are placeholder tags that bind to free input text.

use crate::source::CommentLine;

/// A word from comment input, with its place in the original file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputToken {
    pub norm: String,
    pub raw: String,
    pub line: usize,
    /// Byte offset of the first character in the original line
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseToken {
    Word(String),
    /// Placeholder such as `<year>` or `<copyright holders>`
    Tag(String),
}

impl LicenseToken {
    pub fn word(&self) -> Option<&str> {
        match self {
            Self::Word(w) => Some(w),
            Self::Tag(_) => None,
        }
    }

    /// Literal equality; a tag equals any single word
    pub fn accepts(&self, token: &InputToken) -> bool {
        match self {
            Self::Word(w) => *w == token.norm,
            Self::Tag(_) => true,
        }
    }
}

/// Split `text` into `(byte_start, byte_end)` word spans
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, ch) in text.char_indices() {
        match (ch.is_alphanumeric(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

pub fn tokenize_comments(comments: &[CommentLine]) -> Vec<InputToken> {
    let mut tokens = Vec::new();
    for comment in comments {
        for (s, e) in word_spans(&comment.text) {
            let raw = &comment.text[s..e];
            tokens.push(InputToken {
                norm: raw.to_lowercase(),
                raw: raw.to_string(),
                line: comment.line,
                start: comment.column + s,
                end: comment.column + e,
            });
        }
    }
    tokens
}

fn push_words(tokens: &mut Vec<LicenseToken>, text: &str) {
    tokens.extend(
        word_spans(text)
            .into_iter()
            .map(|(s, e)| LicenseToken::Word(text[s..e].to_lowercase())),
    );
}

pub fn tokenize_license(text: &[String]) -> Vec<LicenseToken> {
    let mut tokens = Vec::new();
    for line in text {
        let mut plain_from = 0;
        let mut i = 0;
        while let Some(offset) = line[i..].find('<') {
            let open = i + offset;
            let inner_from = open + 1;
            match line[inner_from..].find(|c: char| c == '<' || c == '>') {
                Some(len)
                    if line[inner_from + len..].starts_with('>')
                        && !line[inner_from..inner_from + len].trim().is_empty() =>
                {
                    let close = inner_from + len;
                    push_words(&mut tokens, &line[plain_from..open]);
                    tokens.push(LicenseToken::Tag(line[open..=close].to_lowercase()));
                    plain_from = close + 1;
                    i = close + 1;
                }
                _ => i = inner_from,
            }
        }
        push_words(&mut tokens, &line[plain_from..]);
    }
    tokens
}
