//! Term highlighting for display text
//!
//! Matching happens on the text a reader sees, never on markup: spans are
//! computed per text segment for all terms, overlapping spans are merged,
//! and the output is rebuilt with `<mark>` around each span. Existing
//! `<mark>` elements are opaque, so highlighting twice never nests markers.

use std::ops::Range;

use regex::Regex;

use super::terms::term_regex;
use crate::sanitize::{TAG, decode_entities, html_escape};

/// Opening highlight marker
pub const MARK_OPEN: &str = "<mark>";
/// Closing highlight marker
pub const MARK_CLOSE: &str = "</mark>";

/// Compiled highlighter for one term list
///
/// Compile once per query and reuse across every rendered message.
#[derive(Debug, Clone)]
pub struct Highlighter {
    patterns: Vec<Regex>,
}

impl Highlighter {
    pub fn new(terms: &[String]) -> Self {
        Self {
            patterns: terms.iter().filter_map(|t| term_regex(t)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Merged, sorted byte ranges of every term occurrence in `text`
    pub fn spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = self
            .patterns
            .iter()
            .flat_map(|re| re.find_iter(text).map(|m| m.range()))
            .collect();

        // Sort and merge overlapping ranges
        ranges.sort_by_key(|r| r.start);
        let mut merged: Vec<Range<usize>> = Vec::new();
        for range in ranges {
            if let Some(last) = merged.last_mut()
                && range.start <= last.end
            {
                last.end = last.end.max(range.end);
                continue;
            }
            merged.push(range);
        }
        merged
    }

    /// Highlight raw text, returning escaped display HTML
    pub fn highlight_text(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        self.push_highlighted(&mut out, text);
        out
    }

    /// Highlight already-safe display HTML
    ///
    /// Tags pass through untouched and text inside an existing `<mark>` is
    /// not matched again.
    pub fn highlight_html(&self, html: &str) -> String {
        if self.is_empty() {
            return html.to_string();
        }

        let mut out = String::with_capacity(html.len() + 16);
        let mut last = 0;
        let mut mark_depth = 0usize;

        for tag in TAG.find_iter(html) {
            self.push_segment(&mut out, &html[last..tag.start()], mark_depth > 0);

            let lowered = tag.as_str().to_ascii_lowercase();
            if lowered == MARK_OPEN {
                mark_depth += 1;
            } else if lowered == MARK_CLOSE {
                mark_depth = mark_depth.saturating_sub(1);
            }
            out.push_str(tag.as_str());
            last = tag.end();
        }
        self.push_segment(&mut out, &html[last..], mark_depth > 0);
        out
    }

    fn push_segment(&self, out: &mut String, escaped: &str, opaque: bool) {
        if opaque || escaped.is_empty() {
            out.push_str(escaped);
            return;
        }
        let text = decode_entities(escaped);
        if self.spans(&text).is_empty() {
            out.push_str(escaped);
        } else {
            self.push_highlighted(out, &text);
        }
    }

    fn push_highlighted(&self, out: &mut String, text: &str) {
        let mut last = 0;
        for span in self.spans(text) {
            out.push_str(&html_escape(&text[last..span.start]));
            out.push_str(MARK_OPEN);
            out.push_str(&html_escape(&text[span.clone()]));
            out.push_str(MARK_CLOSE);
            last = span.end;
        }
        out.push_str(&html_escape(&text[last..]));
    }
}

/// Whether display HTML carries at least one highlight marker
pub fn has_highlight(html: &str) -> bool {
    html.contains(MARK_OPEN)
}

/// Highlight safe display HTML with a one-off term list
pub fn highlight(html: &str, terms: &[String]) -> String {
    Highlighter::new(terms).highlight_html(html)
}
