//! Conversation view with one counterparty
//!
//! Messages become a flat list of display items in chronological order.
//! Bodies are sanitized and, when opened from a search result, highlighted
//! with the originating query's terms.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::format::{format_date_separator, format_message_time};
use crate::models::{Counterparty, Direction, DocumentId, Message, Timestamp};
use crate::navigator::SearchOccurrence;
use crate::sanitize::{display_text, sanitize};
use crate::search::{ELLIPSIS, Highlighter, SearchContext, has_highlight};

/// Subject separators are cut to this many characters
pub const SUBJECT_SEPARATOR_LEN: usize = 50;

/// A message bubble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    /// Position among the conversation's bubbles
    pub index: usize,
    pub direction: Direction,
    pub document_id: Option<DocumentId>,
    /// Sanitized display HTML, with `<mark>` highlights when searching
    pub content_html: String,
    pub time_text: String,
    pub timestamp: Timestamp,
    /// Whether this is the message the search result pointed at
    pub is_search_target: bool,
    /// Whether `content_html` carries at least one highlight
    pub has_highlight: bool,
}

impl Bubble {
    /// Text placed on the clipboard by "copy"
    pub fn copy_text(&self) -> String {
        display_text(&self.content_html)
    }

    /// Scanned source page for this message, when it has one
    pub fn source_image(&self, data_root: &Path) -> Option<PathBuf> {
        self.document_id
            .as_ref()
            .map(|id| id.source_image_path(data_root))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConversationItem {
    DateSeparator { label: String },
    SubjectSeparator { subject: String },
    Bubble(Bubble),
}

/// Where the view should scroll after rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollHint {
    /// Newest message at the bottom
    Bottom,
    /// Centre the bubble with this index
    Center(usize),
}

/// A rendered conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub counterparty: Counterparty,
    pub items: Vec<ConversationItem>,
    /// Search the conversation was opened from, if any
    pub search: Option<SearchContext>,
}

impl Conversation {
    /// Build the display items for `messages` (ascending by timestamp)
    pub fn build(
        counterparty: Counterparty,
        messages: &[Message],
        owner: &str,
        search: Option<SearchContext>,
        today: NaiveDate,
    ) -> Self {
        let highlighter = search
            .as_ref()
            .and_then(SearchContext::terms)
            .map(|terms| Highlighter::new(terms.terms()));
        let target = search.as_ref().and_then(|s| s.target.as_ref());

        let mut items = Vec::with_capacity(messages.len() * 2);
        let mut last_date: Option<&str> = None;
        let mut last_subject: Option<&str> = None;
        let mut bubble_count = 0;
        let mut target_found = false;

        for message in messages {
            let date = message.timestamp.date_key();
            if last_date.is_none() || date != last_date {
                items.push(ConversationItem::DateSeparator {
                    label: format_date_separator(&message.timestamp, today),
                });
                last_date = date;
            }

            if let Some(subject) = message.subject_text()
                && Some(subject) != last_subject
            {
                items.push(ConversationItem::SubjectSeparator {
                    subject: truncate_subject(subject),
                });
                last_subject = Some(subject);
            }

            let mut content_html = sanitize(&message.message_html);
            if let Some(highlighter) = &highlighter {
                content_html = highlighter.highlight_html(&content_html);
            }

            // Only the first message at the target timestamp is the target
            let is_search_target = !target_found && target == Some(&message.timestamp);
            target_found |= is_search_target;

            items.push(ConversationItem::Bubble(Bubble {
                index: bubble_count,
                direction: message.direction(owner),
                document_id: message.document_id.clone(),
                has_highlight: highlighter.is_some() && has_highlight(&content_html),
                content_html,
                time_text: format_message_time(&message.timestamp),
                timestamp: message.timestamp.clone(),
                is_search_target,
            }));
            bubble_count += 1;
        }

        Self {
            counterparty,
            items,
            search,
        }
    }

    pub fn bubbles(&self) -> impl Iterator<Item = &Bubble> {
        self.items.iter().filter_map(|item| match item {
            ConversationItem::Bubble(bubble) => Some(bubble),
            _ => None,
        })
    }

    pub fn bubble(&self, index: usize) -> Option<&Bubble> {
        self.bubbles().nth(index)
    }

    /// No messages with this counterparty; a normal, empty state
    pub fn is_empty(&self) -> bool {
        self.bubbles().next().is_none()
    }

    /// Highlighted bubbles in display order
    pub fn occurrences(&self) -> Vec<SearchOccurrence> {
        self.bubbles()
            .filter(|bubble| bubble.has_highlight)
            .map(|bubble| SearchOccurrence {
                bubble_index: bubble.index,
                timestamp: bubble.timestamp.clone(),
            })
            .collect()
    }

    pub fn target_bubble(&self) -> Option<&Bubble> {
        self.bubbles().find(|bubble| bubble.is_search_target)
    }

    pub fn scroll_hint(&self) -> ScrollHint {
        match self.target_bubble() {
            Some(bubble) => ScrollHint::Center(bubble.index),
            None => ScrollHint::Bottom,
        }
    }
}

fn truncate_subject(subject: &str) -> String {
    if subject.chars().count() > SUBJECT_SEPARATOR_LEN {
        let mut cut: String = subject.chars().take(SUBJECT_SEPARATOR_LEN).collect();
        cut.push_str(ELLIPSIS);
        cut
    } else {
        subject.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2015, 6, 1).unwrap()
    }

    fn thread() -> Vec<Message> {
        vec![
            Message::builder("Alice", "Owner")
                .subject("Dinner")
                .html("Dinner on <b>Friday</b>?")
                .timestamp("20150101180000")
                .document_id("HOUSE-001")
                .build(),
            Message::builder("Owner", "Alice")
                .subject("Dinner")
                .html("Friday works")
                .timestamp("20150101183000")
                .build(),
            Message::builder("Alice", "Owner")
                .subject("Travel")
                .html("Flight lands <script>x()</script>at 9")
                .timestamp("20150102090000")
                .build(),
        ]
    }

    fn kinds(conversation: &Conversation) -> Vec<&'static str> {
        conversation
            .items
            .iter()
            .map(|item| match item {
                ConversationItem::DateSeparator { .. } => "date",
                ConversationItem::SubjectSeparator { .. } => "subject",
                ConversationItem::Bubble(_) => "bubble",
            })
            .collect()
    }

    #[test]
    fn test_separators() {
        let conversation =
            Conversation::build(Counterparty::new("Alice"), &thread(), "Owner", None, today());
        assert_eq!(
            kinds(&conversation),
            vec!["date", "subject", "bubble", "bubble", "date", "subject", "bubble"]
        );
        assert_eq!(
            conversation.items[0],
            ConversationItem::DateSeparator {
                label: "Jan 1, 2015".to_string()
            }
        );
    }

    #[test]
    fn test_bubbles_without_search() {
        let conversation =
            Conversation::build(Counterparty::new("Alice"), &thread(), "Owner", None, today());
        let bubbles: Vec<&Bubble> = conversation.bubbles().collect();

        assert_eq!(bubbles.len(), 3);
        assert_eq!(bubbles[0].direction, Direction::Received);
        assert_eq!(bubbles[1].direction, Direction::Sent);
        assert_eq!(bubbles[0].content_html, "Dinner on <strong>Friday</strong>?");
        assert_eq!(bubbles[0].time_text, "6:00 PM");
        assert!(!bubbles[2].content_html.contains("script"));
        assert!(conversation.occurrences().is_empty());
        assert_eq!(conversation.scroll_hint(), ScrollHint::Bottom);
    }

    #[test]
    fn test_search_highlights_and_target() {
        let context = SearchContext::new("friday", Some(Timestamp::new("20150101183000")));
        let conversation = Conversation::build(
            Counterparty::new("Alice"),
            &thread(),
            "Owner",
            Some(context),
            today(),
        );

        let occurrences = conversation.occurrences();
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].bubble_index, 0);
        assert_eq!(occurrences[1].bubble_index, 1);

        let first = conversation.bubble(0).unwrap();
        assert_eq!(
            first.content_html,
            "Dinner on <strong><mark>Friday</mark></strong>?"
        );
        assert_eq!(conversation.scroll_hint(), ScrollHint::Center(1));
        assert_eq!(conversation.target_bubble().unwrap().index, 1);
    }

    #[test]
    fn test_empty_conversation() {
        let conversation =
            Conversation::build(Counterparty::new("Alice"), &[], "Owner", None, today());
        assert!(conversation.is_empty());
        assert!(conversation.items.is_empty());
    }

    #[test]
    fn test_long_subject_truncated() {
        let subject = "s".repeat(80);
        assert_eq!(
            truncate_subject(&subject),
            format!("{}{}", "s".repeat(50), ELLIPSIS)
        );
        assert_eq!(truncate_subject("short"), "short");
    }

    #[test]
    fn test_copy_text_and_source_image() {
        let conversation =
            Conversation::build(Counterparty::new("Alice"), &thread(), "Owner", None, today());
        let first = conversation.bubble(0).unwrap();
        assert_eq!(first.copy_text(), "Dinner on Friday?");
        assert_eq!(
            first.source_image(Path::new("/data")),
            Some(PathBuf::from("/data/sources/HOUSE-001.jpg"))
        );
        assert!(conversation.bubble(1).unwrap().source_image(Path::new("/data")).is_none());
    }
}
