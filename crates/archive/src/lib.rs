//! Archive crate - Core logic for browsing a correspondence archive
//!
//! This crate provides the platform-independent parts of the archive viewer:
//! - Domain models (Message, Counterparty, Profile)
//! - Read-only storage over the SQLite archive
//! - Keyword search with grouping, excerpts and highlighting
//! - Conversation rendering and in-conversation search navigation
//! - Content sanitization for archived markup
//!
//! This crate has zero UI dependencies; a rendering layer consumes the data
//! structures it returns.

pub mod config;
pub mod error;
pub mod models;
pub mod navigator;
pub mod query;
pub mod sanitize;
pub mod search;
pub mod service;
pub mod storage;

pub use config::ArchiveSettings;
pub use error::{ArchiveError, ArchiveResult};
pub use models::{
    Avatar, Counterparty, CounterpartySummary, Direction, DocumentId, Message, Profile, Timestamp,
};
pub use navigator::{NavigationUpdate, Navigator, NavigatorState, SearchOccurrence};
pub use query::{
    Bubble, ContactSummary, Conversation, ConversationItem, ScrollHint, SearchResultRow,
};
pub use sanitize::sanitize;
pub use search::{
    Debouncer, Highlighter, SearchContext, SearchResultGroup, SearchSession, SearchTerms,
    search_archive,
};
pub use service::{ArchiveService, evaluate_search};
pub use storage::{
    ArchiveScope, ArchiveStore, InMemoryArchiveStore, ProfileDirectory, ProfileStore,
    SqliteArchiveStore,
};
