//! Excerpt extraction for search result previews
//!
//! First-match policy: the window is taken around the first term (in query
//! order) that occurs in the text, not the best window across all terms.
//! Lengths are counted in characters, never bytes.

use super::terms::term_regex;

/// Characters of context kept before the match
pub const CONTEXT_BEFORE: usize = 50;
/// Characters of context kept after the match
pub const CONTEXT_AFTER: usize = 100;
/// Length of the leading-text fallback
pub const FALLBACK_LEN: usize = 150;
/// Truncation marker
pub const ELLIPSIS: &str = "...";

/// Produce a display-ready (not yet highlighted) excerpt
///
/// * `text` - plain body text, markup already stripped
/// * `subject` - used verbatim when no term occurs in `text`
/// * `terms` - lowercased search terms in query order
pub fn extract_snippet(text: &str, subject: Option<&str>, terms: &[String]) -> String {
    for term in terms {
        let Some(re) = term_regex(term) else {
            continue;
        };
        if let Some(found) = re.find(text) {
            return window(text, found.start(), found.end());
        }
    }

    if let Some(subject) = subject.filter(|s| !s.is_empty()) {
        return subject.to_string();
    }

    leading_text(text, FALLBACK_LEN)
}

/// Cut a context window around the byte range `start..end`
fn window(text: &str, start: usize, end: usize) -> String {
    let match_start = text[..start].chars().count();
    let match_end = match_start + text[start..end].chars().count();
    let total = match_end + text[end..].chars().count();

    let from = match_start.saturating_sub(CONTEXT_BEFORE);
    let to = (match_end + CONTEXT_AFTER).min(total);

    let mut out = String::new();
    if from > 0 {
        out.push_str(ELLIPSIS);
    }
    out.extend(text.chars().skip(from).take(to - from));
    if to < total {
        out.push_str(ELLIPSIS);
    }
    out
}

/// First `max_chars` characters, with a trailing marker when cut
pub fn leading_text(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let mut out: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        out.push_str(ELLIPSIS);
    }
    out
}
