//! Error types for the sale ledger store.

use thiserror::Error;

use stormsale_core::SaleId;
use stormsale_envelope::EnvelopeError;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored rows did not reassemble into a valid envelope.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// No sale with this id.
    #[error("sale not found: {0}")]
    NotFound(SaleId),

    /// The envelope cannot be persisted as given.
    #[error("rejected envelope: {0}")]
    Rejected(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// A blocking database task failed to complete.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
