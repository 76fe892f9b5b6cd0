//! Document store trait definition.

use crate::error::{StoreError, StoreResult};

/// Revision of a freshly created document.
pub const INITIAL_REVISION: u64 = 1;

/// A stored document and its revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Revision, incremented on every successful write.
    pub revision: u64,
    /// Opaque document body.
    pub body: Vec<u8>,
}

/// A keyed store of versioned documents.
///
/// Stores are **opaque byte stores**. They do not interpret document bodies;
/// callers own the encoding.
///
/// # Invariants
///
/// - `create` never overwrites an existing document
/// - `replace` only succeeds if the stored revision equals `expected_revision`
/// - every successful write yields a revision greater than the previous one
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait DocumentStore: Send + Sync {
    /// Reads the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or is corrupted.
    fn get(&self, key: &str) -> StoreResult<Option<Document>>;

    /// Stores a new document under `key`.
    ///
    /// Returns the revision of the new document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if `key` is taken.
    fn create(&self, key: &str, body: &[u8]) -> StoreResult<u64>;

    /// Overwrites the document under `key` if its revision is still
    /// `expected_revision`.
    ///
    /// Returns the new revision.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if there is no document, or
    /// [`StoreError::RevisionMismatch`] if another write got there first.
    fn replace(&self, key: &str, body: &[u8], expected_revision: u64) -> StoreResult<u64>;

    /// Lists all keys in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the key listing cannot be read.
    fn keys(&self) -> StoreResult<Vec<String>>;

    /// Returns true if a document exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read.
    fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Rejects keys no backend can store.
pub(crate) fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
