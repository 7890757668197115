//! Query API for UI consumption
//!
//! Provides high-level query functions that return data formatted
//! for display in the UI.

mod contacts;
mod conversation;
mod format;

pub use contacts::{
    ContactSummary, NO_MESSAGES, NO_PREVIEW, PREVIEW_LEN, SearchResultRow, last_message_preview,
    list_contacts, search_result_rows,
};
pub use conversation::{Bubble, Conversation, ConversationItem, ScrollHint};
pub use format::{format_contact_timestamp, format_date_separator, format_message_time, local_today};
