//! Message model representing one archived piece of correspondence

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Counterparty;

/// Opaque identifier of the scanned source document a message came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the source scan for this document under the archive data root
    pub fn source_image_path(&self, data_root: &Path) -> PathBuf {
        data_root.join("sources").join(format!("{}.jpg", self.0))
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Sortable timestamp key in `YYYYMMDDHHMMSS` form
///
/// Ordering is lexicographic on the raw string, which matches chronological
/// order for well-formed keys. Malformed keys are kept as-is and simply fail
/// to [`parse`](Timestamp::parse).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub String);

impl Timestamp {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse the key down to minute precision
    pub fn parse(&self) -> Option<NaiveDateTime> {
        let prefix = self.0.get(..12)?;
        NaiveDateTime::parse_from_str(prefix, "%Y%m%d%H%M").ok()
    }

    /// The `YYYYMMDD` day key, used to detect day changes in a thread
    pub fn date_key(&self) -> Option<&str> {
        self.0.get(..8)
    }
}

impl From<&str> for Timestamp {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Whether the archive owner sent or received a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Sent,
    Received,
}

/// A single archived message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Sender identity as recorded in the archive
    pub from_address: String,
    /// Recipient identity as recorded in the archive
    pub to_address: String,
    /// Subject line, when the source had one
    pub subject: Option<String>,
    /// Raw body markup
    pub message_html: String,
    /// Sortable timestamp key
    pub timestamp: Timestamp,
    /// Source document, when known
    pub document_id: Option<DocumentId>,
}

impl Message {
    /// Create a new message builder
    pub fn builder(
        from_address: impl Into<String>,
        to_address: impl Into<String>,
    ) -> MessageBuilder {
        MessageBuilder::new(from_address.into(), to_address.into())
    }

    /// Direction relative to the archive owner
    pub fn direction(&self, owner: &str) -> Direction {
        if self.from_address == owner {
            Direction::Sent
        } else {
            Direction::Received
        }
    }

    /// The party on the other side of the owner
    pub fn counterparty(&self, owner: &str) -> Counterparty {
        match self.direction(owner) {
            Direction::Sent => Counterparty::new(self.to_address.clone()),
            Direction::Received => Counterparty::new(self.from_address.clone()),
        }
    }

    /// Subject, treating an empty string the same as a missing one
    pub fn subject_text(&self) -> Option<&str> {
        self.subject.as_deref().filter(|s| !s.is_empty())
    }
}

/// Builder for creating Message instances
pub struct MessageBuilder {
    from_address: String,
    to_address: String,
    subject: Option<String>,
    message_html: String,
    timestamp: Timestamp,
    document_id: Option<DocumentId>,
}

impl MessageBuilder {
    fn new(from_address: String, to_address: String) -> Self {
        Self {
            from_address,
            to_address,
            subject: None,
            message_html: String::new(),
            timestamp: Timestamp::default(),
            document_id: None,
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.message_html = html.into();
        self
    }

    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Timestamp::new(timestamp);
        self
    }

    pub fn document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(DocumentId::new(document_id));
        self
    }

    pub fn build(self) -> Message {
        Message {
            from_address: self.from_address,
            to_address: self.to_address,
            subject: self.subject,
            message_html: self.message_html,
            timestamp: self.timestamp,
            document_id: self.document_id,
        }
    }
}
