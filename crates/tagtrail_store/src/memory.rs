//! In-memory document store for testing.

use crate::backend::{validate_key, Document, DocumentStore, INITIAL_REVISION};
use crate::error::{StoreError, StoreResult};
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory document store.
///
/// Suitable for unit tests, integration tests and ephemeral deployments.
///
/// # Thread Safety
///
/// Writes take the map's write lock for the whole compare-and-set, so
/// concurrent `replace` calls on one key are serialized.
///
/// # Example
///
/// ```rust
/// use tagtrail_store::{DocumentStore, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// let rev = store.create("user-1", b"{}").unwrap();
/// let rev = store.replace("user-1", b"{\"a\":1}", rev).unwrap();
/// assert_eq!(store.get("user-1").unwrap().unwrap().revision, rev);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, Document>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// Returns true if no documents are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Removes every document.
    pub fn clear(&self) {
        self.docs.write().clear();
    }
}

impl DocumentStore for InMemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<Document>> {
        Ok(self.docs.read().get(key).cloned())
    }

    fn create(&self, key: &str, body: &[u8]) -> StoreResult<u64> {
        validate_key(key)?;
        let mut docs = self.docs.write();
        if docs.contains_key(key) {
            return Err(StoreError::AlreadyExists {
                key: key.to_string(),
            });
        }
        docs.insert(
            key.to_string(),
            Document {
                revision: INITIAL_REVISION,
                body: body.to_vec(),
            },
        );
        Ok(INITIAL_REVISION)
    }

    fn replace(&self, key: &str, body: &[u8], expected_revision: u64) -> StoreResult<u64> {
        let mut docs = self.docs.write();
        let doc = docs.get_mut(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;

        if doc.revision != expected_revision {
            return Err(StoreError::RevisionMismatch {
                key: key.to_string(),
                expected: expected_revision,
                actual: doc.revision,
            });
        }

        doc.revision += 1;
        doc.body = body.to_vec();
        Ok(doc.revision)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys: Vec<String> = self.docs.read().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
