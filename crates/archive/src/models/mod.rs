//! Domain models for archive entities

mod contact;
mod message;
mod profile;

pub use contact::{Counterparty, CounterpartySummary};
pub use message::{Direction, DocumentId, Message, MessageBuilder, Timestamp};
pub use profile::{Avatar, Profile, initials};
