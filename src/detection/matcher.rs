//! License matcher: token alignment of comment text against license texts
//!
//! ## Algorithm
//!
//! 1. **Anchors**: every n-gram of literal license words (n = 3, or the
//!    longest literal run when shorter) is indexed. Input n-grams found in
//!    the index start an alignment.
//! 2. **Walk**: from an anchor, license and input advance in lockstep. A
//!    `<tag>` consumes input words up to the next literal license word.
//!    On a mismatch the walk looks for the nearest re-synchronization point
//!    within a small window, confirmed by a second agreeing token, or stops.
//!    The walk is then extended backwards from the anchor.
//! 3. **Selection**: `Exact` keeps the best single span; `Partial` keeps
//!    the disjoint spans that cover the most license text.
//!
//! `ratio` is matched license tokens over all license tokens. Forbidden
//! phrases must occur whole and contiguously. Exceptions are only scored
//! when one of their parents matched.

use super::tokens::{tokenize_comments, tokenize_license, InputToken, LicenseToken};
use super::{LicenseMatch, MatchAlgorithm, MatchPosition};
use crate::license::{LicenseCatalog, LicenseId, LicenseRecord};
use crate::source::CommentLine;
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ─── Configuration ──────────────────────────────────────────────────

/// Anchor n-gram length
const ANCHOR_LEN: usize = 3;
/// Tokens skipped on either side when re-synchronizing
const RESYNC_WINDOW: usize = 4;
/// Most input words a single tag may bind
const TAG_MAX_WORDS: usize = 10;

// ─── Templates ──────────────────────────────────────────────────────

/// A tokenized license text with its anchor index
struct Template<'c> {
    record: &'c LicenseRecord,
    tokens: Vec<LicenseToken>,
    anchor_len: usize,
    anchors: HashMap<String, Vec<usize>>,
}

impl<'c> Template<'c> {
    fn new(record: &'c LicenseRecord) -> Self {
        let tokens = tokenize_license(&record.text);

        let mut longest_run = 0;
        let mut run = 0;
        for token in &tokens {
            run = if token.word().is_some() { run + 1 } else { 0 };
            longest_run = longest_run.max(run);
        }
        let anchor_len = ANCHOR_LEN.min(longest_run);

        let mut anchors: HashMap<String, Vec<usize>> = HashMap::new();
        if anchor_len > 0 {
            for start in 0..=tokens.len() - anchor_len {
                let gram: Option<Vec<&str>> = tokens[start..start + anchor_len]
                    .iter()
                    .map(LicenseToken::word)
                    .collect();
                if let Some(words) = gram {
                    anchors.entry(words.join(" ")).or_default().push(start);
                }
            }
        }

        Self {
            record,
            tokens,
            anchor_len,
            anchors,
        }
    }
}

// ─── Spans ──────────────────────────────────────────────────────────

/// One aligned run: half-open token ranges plus bound tags
#[derive(Debug, Clone)]
struct Span {
    lic_start: usize,
    lic_end: usize,
    inp_start: usize,
    inp_end: usize,
    matched: usize,
    /// (tag, input start, input end)
    tags: Vec<(String, usize, usize)>,
}

impl Span {
    fn at(li: usize, ij: usize) -> Self {
        Self {
            lic_start: li,
            lic_end: li,
            inp_start: ij,
            inp_end: ij,
            matched: 0,
            tags: Vec::new(),
        }
    }

    fn disjoint(&self, other: &Span) -> bool {
        (self.lic_end <= other.lic_start || other.lic_end <= self.lic_start)
            && (self.inp_end <= other.inp_start || other.inp_end <= self.inp_start)
    }

    fn position(&self, input: &[InputToken]) -> MatchPosition {
        let first = &input[self.inp_start];
        let last = &input[self.inp_end - 1];
        MatchPosition {
            start_line: first.line,
            start_col: first.start,
            end_line: last.line,
            end_col: last.end.saturating_sub(1),
            license_start: self.lic_start,
            license_end: self.lic_end,
            input_start: self.inp_start,
            input_end: self.inp_end,
        }
    }
}

/// Input index one past the words bound by the tag at `li`
fn tag_extent(license: &[LicenseToken], li: usize, input: &[InputToken], ij: usize) -> usize {
    let limit = (ij + TAG_MAX_WORDS).min(input.len());
    match license.get(li + 1).and_then(LicenseToken::word) {
        Some(next) => (ij + 1..limit)
            .find(|&k| input[k].norm == next)
            .unwrap_or(ij + 1),
        None => ij + 1,
    }
}

/// Nearest `(license skip, input skip)` where the texts agree again
fn resync(license: &[LicenseToken], input: &[InputToken], li: usize, ij: usize) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for a in 0..=RESYNC_WINDOW {
        for b in 0..=RESYNC_WINDOW {
            if a + b == 0 || best.is_some_and(|(ba, bb)| ba + bb <= a + b) {
                continue;
            }
            let (l, i) = (li + a, ij + b);
            let (Some(LicenseToken::Word(word)), Some(token)) = (license.get(l), input.get(i)) else {
                continue;
            };
            if *word != token.norm {
                continue;
            }
            let confirmed = match (license.get(l + 1), input.get(i + 1)) {
                (Some(next_l), Some(next_i)) => next_l.accepts(next_i),
                _ => true,
            };
            if confirmed {
                best = Some((a, b));
            }
        }
    }
    best
}

/// Walk forward from an anchor
fn walk(license: &[LicenseToken], input: &[InputToken], li0: usize, ij0: usize) -> Span {
    let mut span = Span::at(li0, ij0);
    let (mut li, mut ij) = (li0, ij0);

    while li < license.len() && ij < input.len() {
        match &license[li] {
            LicenseToken::Word(word) if *word == input[ij].norm => {
                li += 1;
                ij += 1;
            }
            LicenseToken::Tag(name) => {
                let end = tag_extent(license, li, input, ij);
                span.tags.push((name.clone(), ij, end));
                li += 1;
                ij = end;
            }
            LicenseToken::Word(_) => match resync(license, input, li, ij) {
                Some((a, b)) => {
                    li += a;
                    ij += b;
                    continue;
                }
                None => break,
            },
        }
        span.matched += 1;
        span.lic_end = li;
        span.inp_end = ij;
    }

    span
}

/// Extend a span backwards from its anchor, without re-synchronization
fn extend_back(license: &[LicenseToken], input: &[InputToken], span: &mut Span) {
    let (mut li, mut ij) = (span.lic_start, span.inp_start);

    while li > 0 && ij > 0 {
        match &license[li - 1] {
            LicenseToken::Word(word) if *word == input[ij - 1].norm => {
                li -= 1;
                ij -= 1;
                span.matched += 1;
            }
            LicenseToken::Word(_) => break,
            LicenseToken::Tag(_) => {
                // Consecutive tags bind together: one word each, the last
                // one takes the remainder
                let group_start = (0..li)
                    .rev()
                    .take_while(|&p| license[p].word().is_none())
                    .last()
                    .unwrap_or(li - 1);
                let group = li - group_start;
                if ij < group {
                    break;
                }
                let prev = group_start
                    .checked_sub(1)
                    .and_then(|p| license[p].word());
                let floor = ij.saturating_sub(TAG_MAX_WORDS + group);
                let start = prev
                    .and_then(|word| {
                        (floor..ij - group)
                            .rev()
                            .find(|&k| input[k].norm == word)
                            .map(|k| k + 1)
                    })
                    .unwrap_or(ij - group);

                for (n, p) in (group_start..li).enumerate() {
                    if let LicenseToken::Tag(name) = &license[p] {
                        let from = start + n;
                        let to = if p + 1 == li { ij } else { from + 1 };
                        span.tags.push((name.clone(), from, to));
                    }
                }
                span.matched += group;
                li = group_start;
                ij = start;
            }
        }
        span.lic_start = li;
        span.inp_start = ij;
    }
}

/// Contiguous occurrence of the whole text; tags bind one word each
fn find_contiguous(license: &[LicenseToken], input: &[InputToken]) -> Option<Span> {
    let len = license.len();
    if len == 0 || input.len() < len {
        return None;
    }
    let start = (0..=input.len() - len).find(|&ij| {
        license
            .iter()
            .zip(&input[ij..ij + len])
            .all(|(l, t)| l.accepts(t))
    })?;

    let mut span = Span::at(0, start);
    span.lic_end = len;
    span.inp_end = start + len;
    span.matched = len;
    for (k, token) in license.iter().enumerate() {
        if let LicenseToken::Tag(name) = token {
            span.tags.push((name.clone(), start + k, start + k + 1));
        }
    }
    Some(span)
}

// ─── Matcher ────────────────────────────────────────────────────────

/// Scores comment text against every license in a catalog
pub struct LicenseMatcher<'c> {
    primary: Vec<Template<'c>>,
    exceptions: Vec<Template<'c>>,
    threshold: f64,
}

impl<'c> LicenseMatcher<'c> {
    pub fn new(catalog: &'c LicenseCatalog, threshold: f64) -> Self {
        Self {
            primary: catalog.primary_records().map(Template::new).collect(),
            exceptions: catalog.exceptions().map(Template::new).collect(),
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Every license match at or above the threshold. Exceptions are only
    /// tried when a parent license matched.
    pub fn match_comments(&self, comments: &[CommentLine], algorithm: MatchAlgorithm) -> Vec<LicenseMatch> {
        let input = tokenize_comments(comments);
        if input.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<LicenseMatch> = self
            .primary
            .iter()
            .filter_map(|t| self.match_template(t, &input, algorithm))
            .collect();

        let found: BTreeSet<LicenseId> = matches.iter().map(|m| m.license.clone()).collect();
        let gated: Vec<LicenseMatch> = self
            .exceptions
            .iter()
            .filter(|t| {
                t.record
                    .parents()
                    .is_some_and(|parents| parents.iter().any(|p| found.contains(p)))
            })
            .filter_map(|t| self.match_template(t, &input, algorithm))
            .collect();
        matches.extend(gated);

        matches
    }

    fn match_template(&self, template: &Template<'_>, input: &[InputToken], algorithm: MatchAlgorithm) -> Option<LicenseMatch> {
        if template.tokens.is_empty() {
            return None;
        }

        let spans = if template.record.is_forbidden_phrase() {
            vec![find_contiguous(&template.tokens, input)?]
        } else {
            select(align(template, input), algorithm)
        };
        if spans.is_empty() {
            return None;
        }

        let matched: usize = spans.iter().map(|s| s.matched).sum();
        let ratio = (matched as f64 / template.tokens.len() as f64).min(1.0);
        if ratio < self.threshold {
            return None;
        }

        let mut bindings: Vec<&(String, usize, usize)> = spans.iter().flat_map(|s| &s.tags).collect();
        bindings.sort_by_key(|(_, from, _)| *from);
        let mut tags = BTreeMap::new();
        for (name, from, to) in bindings {
            let text = input[*from..*to]
                .iter()
                .map(|t| t.raw.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            tags.entry(name.clone()).or_insert(text);
        }

        Some(LicenseMatch {
            license: template.record.id.clone(),
            positions: spans.iter().map(|s| s.position(input)).collect(),
            ratio,
            tags: (!tags.is_empty()).then_some(tags),
        })
    }
}

/// Candidate spans, one per anchor hit outside previously aligned input
fn align(template: &Template<'_>, input: &[InputToken]) -> Vec<Span> {
    let n = template.anchor_len;
    if n == 0 || input.len() < n {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut covered = 0;
    for ij in 0..=input.len() - n {
        if ij < covered {
            continue;
        }
        let key = input[ij..ij + n]
            .iter()
            .map(|t| t.norm.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let Some(starts) = template.anchors.get(&key) else {
            continue;
        };

        let mut best: Option<Span> = None;
        for &li in starts {
            let mut span = walk(&template.tokens, input, li, ij);
            extend_back(&template.tokens, input, &mut span);
            if best.as_ref().map_or(true, |b| span.matched > b.matched) {
                best = Some(span);
            }
        }
        if let Some(span) = best {
            covered = span.inp_end;
            spans.push(span);
        }
    }
    spans
}

fn select(mut spans: Vec<Span>, algorithm: MatchAlgorithm) -> Vec<Span> {
    spans.retain(|s| s.inp_end > s.inp_start);
    // Stable: ties keep input order
    spans.sort_by(|a, b| b.matched.cmp(&a.matched));

    match algorithm {
        MatchAlgorithm::Exact => spans.into_iter().take(1).collect(),
        MatchAlgorithm::Partial => {
            let mut chosen: Vec<Span> = Vec::new();
            for span in spans {
                if chosen.iter().all(|c| c.disjoint(&span)) {
                    chosen.push(span);
                }
            }
            chosen.sort_by_key(|s| s.lic_start);
            chosen
        }
    }
}
