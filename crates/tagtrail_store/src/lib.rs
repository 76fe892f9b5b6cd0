//! # tagtrail store
//!
//! Versioned document store trait and implementations for tagtrail.
//!
//! Profiles are persisted one document per subject identifier. This crate
//! holds those documents without interpreting them.
//!
//! ## Design Principles
//!
//! - Stores are opaque byte stores keyed by string
//! - Every document carries a revision; writes are conditional on it
//! - Creation is insert-if-absent
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral deployments
//! - [`FileStore`] - For persistent storage in a locked directory
//!
//! ## Example
//!
//! ```rust
//! use tagtrail_store::{DocumentStore, InMemoryStore, StoreError};
//!
//! let store = InMemoryStore::new();
//! let rev = store.create("user-1", b"v1").unwrap();
//! store.replace("user-1", b"v2", rev).unwrap();
//!
//! // A write based on a stale revision is refused.
//! let err = store.replace("user-1", b"v3", rev).unwrap_err();
//! assert!(matches!(err, StoreError::RevisionMismatch { .. }));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::{Document, DocumentStore, INITIAL_REVISION};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
