//! Storage traits and implementations
//!
//! The archive is read-only. [`ArchiveStore`] serves conversations and search
//! rows; [`ProfileStore`] supplies display metadata for contacts.

mod memory;
mod profiles;
mod sqlite;
mod traits;

pub use memory::InMemoryArchiveStore;
pub use profiles::ProfileDirectory;
pub use sqlite::SqliteArchiveStore;
pub use traits::{ArchiveScope, ArchiveStore, ProfileStore, REDACTED, SearchRow};
