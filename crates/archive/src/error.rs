//! Error type surfaced to callers of the archive service
//!
//! Internals use `anyhow` with context; this enum is the boundary the UI
//! layer matches on. An empty result set is never an error.

/// User-facing archive error
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The data store is not loaded or a query against it failed
    #[error("Archive data unavailable: {message}")]
    DataUnavailable { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl ArchiveError {
    pub fn data_unavailable(message: impl Into<String>) -> Self {
        ArchiveError::DataUnavailable {
            message: message.into(),
        }
    }

    /// Whether re-issuing the triggering action may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ArchiveError::DataUnavailable { .. })
    }
}

impl From<anyhow::Error> for ArchiveError {
    fn from(e: anyhow::Error) -> Self {
        // {:#} keeps the context chain on one line
        ArchiveError::DataUnavailable {
            message: format!("{:#}", e),
        }
    }
}

pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;
