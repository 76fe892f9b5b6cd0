//! Error types for document store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A document already exists under the key.
    #[error("document already exists: {key}")]
    AlreadyExists {
        /// The key.
        key: String,
    },

    /// No document exists under the key.
    #[error("document not found: {key}")]
    NotFound {
        /// The key.
        key: String,
    },

    /// The stored revision differs from the one the write was based on.
    #[error("revision mismatch on {key}: expected {expected}, found {actual}")]
    RevisionMismatch {
        /// The key.
        key: String,
        /// Revision the caller read.
        expected: u64,
        /// Revision currently stored.
        actual: u64,
    },

    /// The key cannot be stored.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// A stored document is corrupted.
    #[error("store corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the store directory.
    #[error("store locked: another process has exclusive access")]
    Locked,
}

impl StoreError {
    /// Returns true if retrying the write against a fresh read may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::RevisionMismatch { .. })
    }
}
