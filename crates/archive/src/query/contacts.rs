//! Contact list and search result rows

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::format::format_contact_timestamp;
use crate::models::{Avatar, Counterparty, CounterpartySummary, Timestamp};
use crate::sanitize::strip_tags;
use crate::search::{Highlighter, SearchContext, SearchResultGroup, SearchTerms};
use crate::storage::{ArchiveScope, ArchiveStore, ProfileStore};

/// Preview length in characters
pub const PREVIEW_LEN: usize = 50;
/// Preview when neither body text nor subject is available
pub const NO_PREVIEW: &str = "No preview available";
/// Preview for a contact with no messages in scope
pub const NO_MESSAGES: &str = "No messages";

/// One row of the contact list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSummary {
    pub counterparty: Counterparty,
    /// Profile display name, or the raw identity
    pub display_name: String,
    pub avatar: Avatar,
    pub message_count: usize,
    pub last_message_at: Timestamp,
    /// Subject of the newest message
    pub last_subject: Option<String>,
    /// Start of the newest message's text
    pub preview: String,
}

impl ContactSummary {
    pub fn timestamp_text(&self, today: NaiveDate) -> String {
        format_contact_timestamp(&self.last_message_at, today)
    }
}

/// List the contacts in scope, newest conversation first
pub fn list_contacts(
    store: &dyn ArchiveStore,
    profiles: &dyn ProfileStore,
    scope: &ArchiveScope,
    data_root: &Path,
) -> Result<Vec<ContactSummary>> {
    store
        .list_counterparties(scope)?
        .into_iter()
        .map(|summary| contact_summary(store, profiles, scope, data_root, summary))
        .collect()
}

fn contact_summary(
    store: &dyn ArchiveStore,
    profiles: &dyn ProfileStore,
    scope: &ArchiveScope,
    data_root: &Path,
    summary: CounterpartySummary,
) -> Result<ContactSummary> {
    let preview = last_message_preview(store, scope, &summary.counterparty)?;
    let profile = profiles.get_profile(summary.counterparty.as_str());
    let identity = summary.counterparty.as_str();

    Ok(ContactSummary {
        display_name: profile.display_name_or(identity).to_string(),
        avatar: Avatar::for_contact(identity, &profile, data_root),
        counterparty: summary.counterparty,
        message_count: summary.message_count,
        last_message_at: summary.last_message_at,
        last_subject: summary.last_subject,
        preview,
    })
}

/// Short preview of the newest message exchanged with `counterparty`
pub fn last_message_preview(
    store: &dyn ArchiveStore,
    scope: &ArchiveScope,
    counterparty: &Counterparty,
) -> Result<String> {
    let Some(message) = store.last_message(scope, counterparty)? else {
        return Ok(NO_MESSAGES.to_string());
    };

    let text: String = strip_tags(&message.message_html)
        .chars()
        .take(PREVIEW_LEN)
        .collect();
    if !text.is_empty() {
        return Ok(text);
    }
    Ok(message
        .subject_text()
        .unwrap_or(NO_PREVIEW)
        .to_string())
}

/// One row of the search results list, ready for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultRow {
    pub counterparty: Counterparty,
    /// Escaped display name with matched terms marked
    pub display_name_html: String,
    pub avatar: Avatar,
    /// Escaped excerpt of the top message with matched terms marked
    pub excerpt_html: String,
    /// Timestamp of the top message
    pub timestamp: Timestamp,
    pub total_matches: usize,
    /// Where selecting the row leads
    pub context: SearchContext,
}

impl SearchResultRow {
    /// `"1 message"` or `"N messages"`
    pub fn match_info(&self) -> String {
        if self.total_matches > 1 {
            format!("{} messages", self.total_matches)
        } else {
            "1 message".to_string()
        }
    }

    pub fn timestamp_text(&self, today: NaiveDate) -> String {
        format_contact_timestamp(&self.timestamp, today)
    }
}

/// Render aggregated search groups as result rows
pub fn search_result_rows(
    groups: &[SearchResultGroup],
    terms: &SearchTerms,
    profiles: &dyn ProfileStore,
    data_root: &Path,
) -> Vec<SearchResultRow> {
    let highlighter = Highlighter::new(terms.terms());

    groups
        .iter()
        .map(|group| {
            let identity = group.counterparty.as_str();
            let profile = profiles.get_profile(identity);
            let top = group.top_message();

            SearchResultRow {
                counterparty: group.counterparty.clone(),
                display_name_html: highlighter
                    .highlight_text(profile.display_name_or(identity)),
                avatar: Avatar::for_contact(identity, &profile, data_root),
                excerpt_html: top
                    .map(|m| highlighter.highlight_text(&m.excerpt))
                    .unwrap_or_default(),
                timestamp: top.map(|m| m.message.timestamp.clone()).unwrap_or_default(),
                total_matches: group.total_matches,
                context: SearchContext::for_group(terms, group),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Message, Profile};
    use crate::search::{SEARCH_LIMIT, search_archive};
    use crate::storage::{InMemoryArchiveStore, ProfileDirectory};
    use std::path::PathBuf;

    fn create_test_store() -> InMemoryArchiveStore {
        InMemoryArchiveStore::from_messages(vec![
            Message::builder("Owner", "Alice")
                .subject("Plans")
                .html("<p>This message body is definitely longer than fifty characters in total</p>")
                .timestamp("20150101090000")
                .build(),
            Message::builder("Bob", "Owner")
                .subject("Photo")
                .html("<img src=\"x.jpg\">")
                .timestamp("20150102090000")
                .build(),
            Message::builder("Carol", "Owner")
                .timestamp("20150103090000")
                .build(),
        ])
    }

    fn profiles() -> ProfileDirectory {
        let mut directory = ProfileDirectory::new();
        directory.insert(
            "Alice",
            Profile {
                display_name: Some("Alice Smith".to_string()),
                image: Some("alice.jpg".to_string()),
            },
        );
        directory
    }

    #[test]
    fn test_list_contacts() {
        let store = create_test_store();
        let data_root = PathBuf::from("/data");
        let contacts =
            list_contacts(&store, &profiles(), &ArchiveScope::new("Owner"), &data_root).unwrap();

        let names: Vec<&str> = contacts.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["Carol", "Bob", "Alice Smith"]);

        let alice = &contacts[2];
        assert_eq!(alice.preview.chars().count(), PREVIEW_LEN);
        assert!(alice.preview.starts_with("This message body"));
        assert!(matches!(alice.avatar, Avatar::Image { .. }));

        // Markup-only body falls back to the subject
        assert_eq!(contacts[1].preview, "Photo");
        assert_eq!(contacts[1].avatar, Avatar::Initials("BO".to_string()));

        assert_eq!(contacts[0].preview, NO_PREVIEW);
    }

    #[test]
    fn test_preview_without_messages() {
        let store = create_test_store();
        let preview =
            last_message_preview(&store, &ArchiveScope::new("Owner"), &Counterparty::new("Zed"))
                .unwrap();
        assert_eq!(preview, NO_MESSAGES);
    }

    #[test]
    fn test_search_result_rows() {
        let store = create_test_store();
        let terms = SearchTerms::parse("alice").unwrap();
        let groups =
            search_archive(&store, &ArchiveScope::new("Owner"), &terms, SEARCH_LIMIT).unwrap();
        let rows = search_result_rows(&groups, &terms, &profiles(), Path::new("/data"));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].display_name_html, "<mark>Alice</mark> Smith");
        assert_eq!(rows[0].match_info(), "1 message");
        assert_eq!(rows[0].context.query, "alice");
        assert_eq!(rows[0].context.target.as_ref().unwrap().as_str(), "20150101090000");
    }

    #[test]
    fn test_match_info_plural() {
        let store = InMemoryArchiveStore::from_messages(vec![
            Message::builder("Owner", "Alice").html("x").timestamp("1").build(),
            Message::builder("Alice", "Owner").html("x").timestamp("2").build(),
        ]);
        let terms = SearchTerms::parse("x").unwrap();
        let groups =
            search_archive(&store, &ArchiveScope::new("Owner"), &terms, SEARCH_LIMIT).unwrap();
        let rows = search_result_rows(&groups, &terms, &ProfileDirectory::new(), Path::new("/"));
        assert_eq!(rows[0].match_info(), "2 messages");
    }
}
