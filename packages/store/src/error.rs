//! Error type shared by every [`crate::DocumentStore`] implementation and the
//! repositories built on top of them.

use thiserror::Error;

/// Failure of a store call or of a query built for one.
///
/// The `Display` text is what ends up in a view model's `error_message`, so
/// it carries the underlying message verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or refused the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored document did not decode into the expected record.
    #[error("corrupt document {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// A record was rejected before being written.
    #[error("{0}")]
    InvalidRecord(String),
}

impl StoreError {
    /// True for failures detected locally, before any store round trip.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidQuery(_) | StoreError::InvalidDate(_) | StoreError::InvalidRecord(_)
        )
    }
}
