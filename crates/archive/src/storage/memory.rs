//! In-memory archive storage
//!
//! Used in tests and for archives assembled on the fly. Mirrors the
//! matching and ordering rules of the SQLite store.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{Result, anyhow};

use super::traits::{ArchiveScope, ArchiveStore, SearchRow};
use crate::models::{Counterparty, CounterpartySummary, Message};
use crate::search::SearchTerms;

/// In-memory implementation of [`ArchiveStore`]
#[derive(Default)]
pub struct InMemoryArchiveStore {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        Self {
            messages: RwLock::new(messages.into_iter().collect()),
        }
    }

    /// Add a message to the archive
    pub fn insert(&self, message: Message) -> Result<()> {
        self.messages
            .write()
            .map_err(|e| anyhow!("Archive lock poisoned: {}", e))?
            .push(message);
        Ok(())
    }

    /// In-scope messages, sorted by timestamp ascending
    fn scoped(&self, scope: &ArchiveScope) -> Result<Vec<Message>> {
        let messages = self
            .messages
            .read()
            .map_err(|e| anyhow!("Archive lock poisoned: {}", e))?;
        let mut scoped: Vec<Message> = messages
            .iter()
            .filter(|m| scope.contains(m))
            .cloned()
            .collect();
        scoped.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(scoped)
    }
}

impl ArchiveStore for InMemoryArchiveStore {
    fn list_counterparties(&self, scope: &ArchiveScope) -> Result<Vec<CounterpartySummary>> {
        let mut by_name: HashMap<Counterparty, CounterpartySummary> = HashMap::new();

        // Ascending order means the last message seen is the newest
        for message in self.scoped(scope)? {
            let counterparty = message.counterparty(&scope.owner);
            let summary = by_name
                .entry(counterparty.clone())
                .or_insert_with(|| CounterpartySummary {
                    counterparty,
                    message_count: 0,
                    last_message_at: message.timestamp.clone(),
                    last_subject: None,
                });
            summary.message_count += 1;
            summary.last_message_at = message.timestamp.clone();
            summary.last_subject = message.subject.clone();
        }

        let mut summaries: Vec<CounterpartySummary> = by_name.into_values().collect();
        summaries.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then_with(|| a.counterparty.cmp(&b.counterparty))
        });
        Ok(summaries)
    }

    fn list_messages(
        &self,
        scope: &ArchiveScope,
        counterparty: &Counterparty,
    ) -> Result<Vec<Message>> {
        Ok(self
            .scoped(scope)?
            .into_iter()
            .filter(|m| &m.counterparty(&scope.owner) == counterparty)
            .collect())
    }

    fn last_message(
        &self,
        scope: &ArchiveScope,
        counterparty: &Counterparty,
    ) -> Result<Option<Message>> {
        Ok(self.list_messages(scope, counterparty)?.pop())
    }

    fn search_messages(
        &self,
        terms: &SearchTerms,
        scope: &ArchiveScope,
        limit: usize,
    ) -> Result<Vec<SearchRow>> {
        Ok(self
            .scoped(scope)?
            .into_iter()
            .rev()
            .filter_map(|message| {
                let counterparty = message.counterparty(&scope.owner);
                terms
                    .matches(
                        &message.message_html,
                        message.subject.as_deref(),
                        counterparty.as_str(),
                    )
                    .then_some(SearchRow {
                        counterparty,
                        message,
                    })
            })
            .take(limit)
            .collect())
    }
}
