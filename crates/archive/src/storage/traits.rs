//! Storage trait definitions

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::{Counterparty, CounterpartySummary, Message, Profile};
use crate::search::SearchTerms;

/// Sentinel identity used by the archive for withheld names
pub const REDACTED: &str = "<REDACTED>";

/// Which part of the archive a query sees
///
/// A message is in scope when one side is the owner, the other side is an
/// allowed counterparty, and neither side is excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveScope {
    /// The archive subject; every conversation is with this identity
    pub owner: String,
    /// Allowlist of counterparties; `None` allows everyone
    pub contacts: Option<Vec<String>>,
    /// Identities excluded on both sides (always contains [`REDACTED`])
    pub excluded: Vec<String>,
}

impl ArchiveScope {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            contacts: None,
            excluded: vec![REDACTED.to_string()],
        }
    }

    pub fn with_contacts(mut self, contacts: Vec<String>) -> Self {
        self.contacts = Some(contacts);
        self
    }

    pub fn with_excluded(mut self, identity: impl Into<String>) -> Self {
        let identity = identity.into();
        if !self.excluded.contains(&identity) {
            self.excluded.push(identity);
        }
        self
    }

    pub fn is_excluded(&self, identity: &str) -> bool {
        self.excluded.iter().any(|e| e == identity)
    }

    /// Whether `identity` may appear as a counterparty
    pub fn allows_counterparty(&self, identity: &str) -> bool {
        identity != self.owner
            && !self.is_excluded(identity)
            && self
                .contacts
                .as_ref()
                .is_none_or(|contacts| contacts.iter().any(|c| c == identity))
    }

    pub fn contains(&self, message: &Message) -> bool {
        if self.is_excluded(&message.from_address) || self.is_excluded(&message.to_address) {
            return false;
        }
        (message.from_address == self.owner && self.allows_counterparty(&message.to_address))
            || (message.to_address == self.owner && self.allows_counterparty(&message.from_address))
    }
}

/// One row of a search result: a message and its counterparty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRow {
    pub counterparty: Counterparty,
    pub message: Message,
}

/// Read-only access to the archived correspondence
///
/// The archive is immutable for the session, so implementations only need
/// shared read access.
pub trait ArchiveStore: Send + Sync {
    /// Counterparties in scope with message count and newest timestamp,
    /// newest conversation first
    fn list_counterparties(&self, scope: &ArchiveScope) -> Result<Vec<CounterpartySummary>>;

    /// Messages exchanged with a counterparty, ordered by timestamp ascending
    fn list_messages(&self, scope: &ArchiveScope, counterparty: &Counterparty)
    -> Result<Vec<Message>>;

    /// Newest message exchanged with a counterparty
    fn last_message(
        &self,
        scope: &ArchiveScope,
        counterparty: &Counterparty,
    ) -> Result<Option<Message>>;

    /// Messages where any term occurs in the body, subject or counterparty
    /// name, newest first, at most `limit` rows
    fn search_messages(
        &self,
        terms: &SearchTerms,
        scope: &ArchiveScope,
        limit: usize,
    ) -> Result<Vec<SearchRow>>;
}

/// Contact display metadata, keyed by lowercased identity
pub trait ProfileStore: Send + Sync {
    /// Profile for `identity`; unknown identities yield an empty profile
    fn get_profile(&self, identity: &str) -> Profile;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(from: &str, to: &str) -> Message {
        Message::builder(from, to).build()
    }

    #[test]
    fn test_scope_without_allowlist() {
        let scope = ArchiveScope::new("Owner");
        assert!(scope.contains(&msg("Owner", "Alice")));
        assert!(scope.contains(&msg("Alice", "Owner")));
        assert!(!scope.contains(&msg("Alice", "Bob")));
        assert!(!scope.contains(&msg("Owner", "Owner")));
    }

    #[test]
    fn test_scope_excludes_redacted_both_sides() {
        let scope = ArchiveScope::new("Owner");
        assert!(!scope.contains(&msg(REDACTED, "Owner")));
        assert!(!scope.contains(&msg("Owner", REDACTED)));
    }

    #[test]
    fn test_scope_with_allowlist() {
        let scope = ArchiveScope::new("Owner").with_contacts(vec!["Alice".to_string()]);
        assert!(scope.contains(&msg("Alice", "Owner")));
        assert!(!scope.contains(&msg("Bob", "Owner")));
    }

    #[test]
    fn test_with_excluded_is_deduplicated() {
        let scope = ArchiveScope::new("Owner")
            .with_excluded("Spam")
            .with_excluded(REDACTED);
        assert_eq!(scope.excluded, vec![REDACTED.to_string(), "Spam".to_string()]);
    }
}
