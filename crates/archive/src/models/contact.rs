//! Counterparty model: the non-owner side of a conversation

use serde::{Deserialize, Serialize};

use super::Timestamp;

/// Identity of the party the archive owner corresponded with
///
/// Never stored on its own; derived from each message's sender/recipient.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Counterparty(pub String);

impl Counterparty {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Counterparty {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Counterparty {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Counterparty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-counterparty aggregate as returned by the data store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterpartySummary {
    pub counterparty: Counterparty,
    /// Number of messages exchanged with this counterparty
    pub message_count: usize,
    /// Timestamp of the newest message
    pub last_message_at: Timestamp,
    /// Subject of the newest message
    #[serde(default)]
    pub last_subject: Option<String>,
}
