//! Grouping of matched rows into per-counterparty results

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::snippet::extract_snippet;
use crate::models::{Counterparty, Message, Timestamp};
use crate::sanitize::strip_tags;
use crate::storage::SearchRow;

/// A message that matched the query, with its preview excerpt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedMessage {
    pub message: Message,
    pub counterparty: Counterparty,
    /// Plain-text excerpt around the first matching term
    pub excerpt: String,
}

/// All matches for one counterparty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultGroup {
    pub counterparty: Counterparty,
    /// Matches in store order (newest first)
    pub messages: Vec<MatchedMessage>,
    /// Always equal to `messages.len()`
    pub total_matches: usize,
}

impl SearchResultGroup {
    fn new(counterparty: Counterparty) -> Self {
        Self {
            counterparty,
            messages: Vec::new(),
            total_matches: 0,
        }
    }

    fn push(&mut self, matched: MatchedMessage) {
        self.messages.push(matched);
        self.total_matches += 1;
    }

    /// Message previewed in the result row
    pub fn top_message(&self) -> Option<&MatchedMessage> {
        self.messages.first()
    }

    /// Newest timestamp among this group's matches
    pub fn latest_timestamp(&self) -> Option<&Timestamp> {
        self.messages.iter().map(|m| &m.message.timestamp).max()
    }
}

/// Group matched rows by counterparty
///
/// Groups are created on first sight and come out ordered by each group's
/// newest match, descending. Groups with equal newest timestamps keep the
/// order in which they were first seen.
pub fn aggregate(rows: Vec<SearchRow>, terms: &[String]) -> Vec<SearchResultGroup> {
    let mut groups: Vec<SearchResultGroup> = Vec::new();
    let mut index: HashMap<Counterparty, usize> = HashMap::new();

    for row in rows {
        let text = strip_tags(&row.message.message_html);
        let excerpt = extract_snippet(&text, row.message.subject_text(), terms);

        let slot = *index.entry(row.counterparty.clone()).or_insert_with(|| {
            groups.push(SearchResultGroup::new(row.counterparty.clone()));
            groups.len() - 1
        });

        groups[slot].push(MatchedMessage {
            message: row.message,
            counterparty: row.counterparty,
            excerpt,
        });
    }

    // Stable sort keeps first-seen order for ties
    groups.sort_by(|a, b| b.latest_timestamp().cmp(&a.latest_timestamp()));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(counterparty: &str, ts: &str, body: &str) -> SearchRow {
        SearchRow {
            counterparty: Counterparty::new(counterparty),
            message: Message::builder(counterparty, "Owner")
                .html(body)
                .timestamp(ts)
                .build(),
        }
    }

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_groups_by_counterparty() {
        let rows = vec![
            row("Alice", "20150103000000", "lunch plans"),
            row("Bob", "20150102000000", "lunch?"),
            row("Alice", "20150101000000", "more lunch"),
        ];
        let groups = aggregate(rows, &terms(&["lunch"]));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].counterparty.as_str(), "Alice");
        assert_eq!(groups[0].total_matches, 2);
        assert_eq!(groups[0].messages.len(), 2);
        assert_eq!(groups[1].counterparty.as_str(), "Bob");
        assert_eq!(groups[1].total_matches, 1);
    }

    #[test]
    fn test_ordered_by_group_max_timestamp() {
        // Row order is not timestamp order here
        let rows = vec![
            row("Alice", "20140101000000", "x"),
            row("Bob", "20160101000000", "x"),
            row("Carol", "20150101000000", "x"),
            row("Alice", "20170101000000", "x"),
        ];
        let groups = aggregate(rows, &terms(&["x"]));
        let order: Vec<&str> = groups.iter().map(|g| g.counterparty.as_str()).collect();
        assert_eq!(order, vec!["Alice", "Bob", "Carol"]);

        for pair in groups.windows(2) {
            assert!(pair[0].latest_timestamp() >= pair[1].latest_timestamp());
        }
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let rows = vec![
            row("Zed", "20150101000000", "x"),
            row("Amy", "20150101000000", "x"),
        ];
        let groups = aggregate(rows, &terms(&["x"]));
        assert_eq!(groups[0].counterparty.as_str(), "Zed");
        assert_eq!(groups[1].counterparty.as_str(), "Amy");
    }

    #[test]
    fn test_count_matches_messages_len() {
        let rows: Vec<SearchRow> = (0..7)
            .map(|i| row(if i % 3 == 0 { "A" } else { "B" }, &format!("2015010{}000000", i), "x"))
            .collect();
        let groups = aggregate(rows, &terms(&["x"]));
        for group in &groups {
            assert!(group.total_matches >= 1);
            assert_eq!(group.total_matches, group.messages.len());
        }
        let total: usize = groups.iter().map(|g| g.total_matches).sum();
        assert_eq!(total, 7);
    }

    #[test]
    fn test_excerpt_generated_from_stripped_body() {
        let rows = vec![row("Alice", "20150101000000", "<p>see you at the <b>meeting</b></p>")];
        let groups = aggregate(rows, &terms(&["meeting"]));
        let top = groups[0].top_message().unwrap();
        assert_eq!(top.excerpt, "see you at the meeting");
    }

    #[test]
    fn test_empty_rows() {
        assert!(aggregate(Vec::new(), &terms(&["x"])).is_empty());
    }
}
