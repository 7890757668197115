//! Display formatting for archive timestamps
//!
//! Timestamps are local wall-clock keys with no zone, so they are compared
//! against a caller-supplied `today`. Missing or malformed keys format as an
//! empty string.

use chrono::{Local, NaiveDate};

use crate::models::Timestamp;

/// Time of day, e.g. `10:30 AM`
pub fn format_message_time(timestamp: &Timestamp) -> String {
    timestamp
        .parse()
        .map(|dt| dt.format("%-I:%M %p").to_string())
        .unwrap_or_default()
}

/// Label for a day separator in a conversation
pub fn format_date_separator(timestamp: &Timestamp, today: NaiveDate) -> String {
    let Some(dt) = timestamp.parse() else {
        return String::new();
    };
    match (today - dt.date()).num_days() {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        _ => dt.format("%b %-d, %Y").to_string(),
    }
}

/// Short timestamp for a contact list row
pub fn format_contact_timestamp(timestamp: &Timestamp, today: NaiveDate) -> String {
    let Some(dt) = timestamp.parse() else {
        return String::new();
    };
    match (today - dt.date()).num_days() {
        // Today: show time
        0 => dt.format("%-I:%M %p").to_string(),
        1 => "Yesterday".to_string(),
        // This week: show day name
        2..7 => dt.format("%a").to_string(),
        _ => dt.format("%b %-d, %Y").to_string(),
    }
}

/// Current local date, for callers without a fixed clock
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
