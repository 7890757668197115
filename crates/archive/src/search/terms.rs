//! Query normalization and the term-matching predicate
//!
//! A query is lowercased and split on whitespace runs. Terms keep their order
//! and duplicates are not removed. A row matches when *any* term is a
//! substring of *any* searched field.

use log::warn;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Normalized, non-empty list of search terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTerms {
    /// The trimmed query as typed
    query: String,
    /// Lowercased terms in query order
    terms: Vec<String>,
}

impl SearchTerms {
    /// Parse a raw query string
    ///
    /// Returns `None` for an empty or whitespace-only query, which callers
    /// treat as "no query" and clear their search state.
    pub fn parse(raw: &str) -> Option<Self> {
        let query = raw.trim();
        if query.is_empty() {
            return None;
        }

        let terms = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Some(Self {
            query: query.to_string(),
            terms,
        })
    }

    /// The trimmed query text
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    /// Whether any term occurs in `text`, ignoring case
    pub fn matches_text(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.iter().any(|term| lowered.contains(term))
    }

    /// Matching predicate over a message's searchable fields
    pub fn matches(&self, body: &str, subject: Option<&str>, counterparty: &str) -> bool {
        self.matches_text(body)
            || subject.is_some_and(|s| self.matches_text(s))
            || self.matches_text(counterparty)
    }

    /// `LIKE` patterns for each term, with SQL wildcards escaped
    ///
    /// Patterns are meant for `LIKE ? ESCAPE '\'` against a lowercased column.
    pub fn like_patterns(&self) -> Vec<String> {
        self.iter()
            .map(|term| format!("%{}%", escape_like(term)))
            .collect()
    }
}

/// Case-insensitive literal pattern for one term
///
/// Metacharacters in the term are escaped, so user input is never
/// interpreted as a pattern. Returns `None` for an empty term or one too
/// large to compile.
pub(crate) fn term_regex(term: &str) -> Option<Regex> {
    if term.is_empty() {
        return None;
    }
    match RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Skipping search term that failed to compile: {}", e);
            None
        }
    }
}

/// Escape `%`, `_` and the escape character itself for a `LIKE` pattern
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_query() {
        assert!(SearchTerms::parse("").is_none());
        assert!(SearchTerms::parse("   \t\n").is_none());
    }

    #[test]
    fn test_parse_lowercases_and_splits() {
        let terms = SearchTerms::parse("  Ken   STARR\tmeeting ").unwrap();
        assert_eq!(terms.terms(), ["ken", "starr", "meeting"]);
        assert_eq!(terms.query(), "Ken   STARR\tmeeting");
    }

    #[test]
    fn test_parse_keeps_duplicates_and_order() {
        let terms = SearchTerms::parse("b a b").unwrap();
        assert_eq!(terms.terms(), ["b", "a", "b"]);
    }

    #[test]
    fn test_matches_any_term() {
        let terms = SearchTerms::parse("alice bob").unwrap();
        assert!(terms.matches("only Alice here", None, "Carol"));
        assert!(!terms.matches("nobody", Some("nothing"), "Carol"));
    }

    #[test]
    fn test_matches_subject_and_counterparty() {
        let terms = SearchTerms::parse("starr").unwrap();
        assert!(terms.matches("meeting tomorrow", None, "Ken Starr"));
        assert!(terms.matches("", Some("Re: STARR report"), "someone"));
    }

    #[test]
    fn test_term_regex_is_literal() {
        let re = term_regex("a.c").unwrap();
        assert!(re.is_match("xA.Cx"));
        assert!(!re.is_match("abc"));
        assert!(term_regex("").is_none());
    }

    #[test]
    fn test_like_patterns_escape_wildcards() {
        let terms = SearchTerms::parse("50% a_b c\\d plain").unwrap();
        assert_eq!(
            terms.like_patterns(),
            vec!["%50\\%%", "%a\\_b%", "%c\\\\d%", "%plain%"]
        );
    }
}
