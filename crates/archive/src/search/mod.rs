//! Keyword search over the archive
//!
//! The pipeline is split into pure stages so each can be tested alone:
//! [`SearchTerms`] normalizes the query and matches rows, [`aggregate`]
//! groups matched rows per counterparty, [`extract_snippet`] cuts preview
//! excerpts, and [`Highlighter`] marks term occurrences for display.
//! [`SearchSession`] and [`Debouncer`] handle search-as-you-type.

mod aggregate;
mod highlight;
mod session;
mod snippet;
mod terms;

pub use aggregate::{MatchedMessage, SearchResultGroup, aggregate};
pub use highlight::{Highlighter, MARK_CLOSE, MARK_OPEN, has_highlight, highlight};
pub use session::{DEFAULT_DEBOUNCE, Debouncer, SearchSession, SearchTicket};
pub use snippet::{ELLIPSIS, extract_snippet, leading_text};
pub use terms::SearchTerms;

use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::Timestamp;
use crate::storage::{ArchiveScope, ArchiveStore};

/// Maximum number of rows a search reads from the store
pub const SEARCH_LIMIT: usize = 100;

/// Context carried from a search result into the conversation it opens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchContext {
    /// The query as typed in the search box
    pub query: String,
    /// Timestamp of the message the result row previewed
    pub target: Option<Timestamp>,
}

impl SearchContext {
    pub fn new(query: impl Into<String>, target: Option<Timestamp>) -> Self {
        Self {
            query: query.into(),
            target,
        }
    }

    /// Deep link for the top message of a result group
    pub fn for_group(terms: &SearchTerms, group: &SearchResultGroup) -> Self {
        Self::new(
            terms.query(),
            group.top_message().map(|m| m.message.timestamp.clone()),
        )
    }

    /// Normalized terms, or `None` when the carried query is blank
    pub fn terms(&self) -> Option<SearchTerms> {
        SearchTerms::parse(&self.query)
    }
}

/// Run a search and group the matches by counterparty
///
/// An empty result is a normal outcome, not an error.
pub fn search_archive(
    store: &dyn ArchiveStore,
    scope: &ArchiveScope,
    terms: &SearchTerms,
    limit: usize,
) -> Result<Vec<SearchResultGroup>> {
    let rows = store.search_messages(terms, scope, limit)?;
    let row_count = rows.len();
    let groups = aggregate(rows, terms.terms());
    debug!(
        "Search {:?}: {} rows in {} groups",
        terms.query(),
        row_count,
        groups.len()
    );
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;
    use crate::storage::InMemoryArchiveStore;

    fn create_test_store() -> InMemoryArchiveStore {
        InMemoryArchiveStore::from_messages(vec![
            Message::builder("Ken Starr", "Owner")
                .subject("Schedule")
                .html("Can we set a meeting next week?")
                .timestamp("20150301100000")
                .build(),
            Message::builder("Owner", "Alice")
                .html("Starr called again")
                .timestamp("20150302100000")
                .build(),
            Message::builder("Owner", "Bob")
                .html("nothing relevant")
                .timestamp("20150303100000")
                .build(),
        ])
    }

    #[test]
    fn test_search_by_counterparty_name_uses_fallback_excerpt() {
        let store = create_test_store();
        let scope = ArchiveScope::new("Owner");
        let terms = SearchTerms::parse("starr").unwrap();
        let groups = search_archive(&store, &scope, &terms, SEARCH_LIMIT).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].counterparty.as_str(), "Alice");

        let starr = &groups[1];
        assert_eq!(starr.counterparty.as_str(), "Ken Starr");
        assert_eq!(starr.total_matches, 1);
        // "starr" is not in the body, so the subject is the excerpt
        assert_eq!(starr.top_message().unwrap().excerpt, "Schedule");
    }

    #[test]
    fn test_no_matches_is_empty() {
        let store = create_test_store();
        let terms = SearchTerms::parse("zebra").unwrap();
        let groups =
            search_archive(&store, &ArchiveScope::new("Owner"), &terms, SEARCH_LIMIT).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn test_context_for_group() {
        let store = create_test_store();
        let terms = SearchTerms::parse("  Meeting ").unwrap();
        let groups =
            search_archive(&store, &ArchiveScope::new("Owner"), &terms, SEARCH_LIMIT).unwrap();

        let context = SearchContext::for_group(&terms, &groups[0]);
        assert_eq!(context.query, "Meeting");
        assert_eq!(context.target.unwrap().as_str(), "20150301100000");
    }

    #[test]
    fn test_blank_context_has_no_terms() {
        assert!(SearchContext::new("  ", None).terms().is_none());
    }
}
