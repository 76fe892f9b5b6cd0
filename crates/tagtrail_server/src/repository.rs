//! Profile persistence.
//!
//! Profiles are stored as JSON documents keyed by subject identifier. Every
//! mutation is a read, reconcile, conditional-write cycle: the write only lands
//! if nobody else wrote the document since it was read, otherwise the cycle
//! restarts from a fresh read. Concurrent updates to one profile therefore
//! never overwrite each other.

use crate::error::{ServerError, ServerResult, MSG_NOT_FOUND, MSG_TAKEN};
use std::sync::Arc;
use tagtrail_core::{CoreResult, Reconciled, UserProfile};
use tagtrail_store::{DocumentStore, StoreError};
use tracing::debug;

/// Typed access to stored profiles.
#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn DocumentStore>,
    max_retries: u32,
}

impl ProfileRepository {
    /// Creates a repository over `store`.
    pub fn new(store: Arc<dyn DocumentStore>, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Loads the profile of `subject`.
    pub fn load(&self, subject: &str) -> ServerResult<Option<UserProfile>> {
        Ok(self.load_versioned(subject)?.map(|(profile, _)| profile))
    }

    fn load_versioned(&self, subject: &str) -> ServerResult<Option<(UserProfile, u64)>> {
        match self.store.get(subject)? {
            Some(doc) => {
                let profile = serde_json::from_slice(&doc.body)?;
                Ok(Some((profile, doc.revision)))
            }
            None => Ok(None),
        }
    }

    /// Returns true if `subject` has a profile.
    pub fn exists(&self, subject: &str) -> ServerResult<bool> {
        Ok(self.store.contains(subject)?)
    }

    /// Stores a new profile for `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Conflict`] if the subject already has one.
    pub fn create(&self, subject: &str, profile: &UserProfile) -> ServerResult<()> {
        let body = serde_json::to_vec(profile)?;
        match self.store.create(subject, &body) {
            Ok(_) => Ok(()),
            Err(StoreError::AlreadyExists { .. }) => Err(ServerError::Conflict(MSG_TAKEN.into())),
            Err(e) => Err(e.into()),
        }
    }

    /// Applies `reconcile` to the profile of `subject` and writes the result
    /// back if it changed.
    ///
    /// `reconcile` may run several times, each time on a fresh snapshot,
    /// when concurrent writers invalidate the revision it read.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotFound`] if the subject has no profile,
    /// [`ServerError::WriteContention`] once retries are exhausted, or the
    /// error produced by `reconcile`.
    pub fn update<F>(&self, subject: &str, mut reconcile: F) -> ServerResult<UserProfile>
    where
        F: FnMut(UserProfile) -> CoreResult<Reconciled>,
    {
        let attempts = self.max_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let (profile, revision) = self
                .load_versioned(subject)?
                .ok_or_else(|| ServerError::NotFound(MSG_NOT_FOUND.into()))?;

            let Reconciled { profile, changed } = reconcile(profile)?;
            if !changed {
                return Ok(profile);
            }

            let body = serde_json::to_vec(&profile)?;
            match self.store.replace(subject, &body, revision) {
                Ok(_) => return Ok(profile),
                Err(e) if e.is_conflict() => {
                    debug!(subject, attempt, "profile changed underneath update, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServerError::WriteContention {
            subject: subject.to_string(),
            attempts,
        })
    }

    /// Lists every subject with a stored profile.
    pub fn subjects(&self) -> ServerResult<Vec<String>> {
        Ok(self.store.keys()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;
    use tagtrail_core::{attach_tag, record_visit};
    use tagtrail_store::{Document, InMemoryStore, StoreResult};

    fn profile() -> UserProfile {
        UserProfile::new("ada@example.com", "ada00000000", "Ada", "#123456")
    }

    fn repository() -> ProfileRepository {
        ProfileRepository::new(Arc::new(InMemoryStore::new()), 8)
    }

    #[test]
    fn create_and_load() {
        let repo = repository();
        assert!(repo.load("uid").unwrap().is_none());
        repo.create("uid", &profile()).unwrap();
        assert_eq!(repo.load("uid").unwrap().unwrap(), profile());
        assert!(repo.exists("uid").unwrap());
        assert_eq!(repo.subjects().unwrap(), vec!["uid"]);
    }

    #[test]
    fn create_twice_conflicts() {
        let repo = repository();
        repo.create("uid", &profile()).unwrap();
        let err = repo.create("uid", &profile()).unwrap_err();
        assert!(matches!(err, ServerError::Conflict(ref m) if m == MSG_TAKEN));
    }

    #[test]
    fn update_missing_profile() {
        let repo = repository();
        let err = repo
            .update("nobody", |p| record_visit(p, "a.com", "A", Utc::now()))
            .unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[test]
    fn unchanged_result_skips_write() {
        let repo = repository();
        repo.create("uid", &profile()).unwrap();
        repo.update("uid", |p| attach_tag(p, "missing.com", "x"))
            .unwrap();
        assert_eq!(repo.store().get("uid").unwrap().unwrap().revision, 1);
    }

    #[test]
    fn reconcile_error_propagates() {
        let repo = repository();
        repo.create("uid", &profile()).unwrap();
        let err = repo
            .update("uid", |p| record_visit(p, "", "A", Utc::now()))
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidRequest(_)));
    }

    /// A store whose first `failures` replaces lose to a phantom writer.
    struct RacingStore {
        inner: InMemoryStore,
        failures: AtomicU32,
    }

    impl DocumentStore for RacingStore {
        fn get(&self, key: &str) -> StoreResult<Option<Document>> {
            self.inner.get(key)
        }

        fn create(&self, key: &str, body: &[u8]) -> StoreResult<u64> {
            self.inner.create(key, body)
        }

        fn replace(&self, key: &str, body: &[u8], expected: u64) -> StoreResult<u64> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(StoreError::RevisionMismatch {
                    key: key.to_string(),
                    expected,
                    actual: expected + 1,
                });
            }
            self.inner.replace(key, body, expected)
        }

        fn keys(&self) -> StoreResult<Vec<String>> {
            self.inner.keys()
        }
    }

    #[test]
    fn retries_after_lost_race() {
        let store = Arc::new(RacingStore {
            inner: InMemoryStore::new(),
            failures: AtomicU32::new(2),
        });
        let repo = ProfileRepository::new(store, 2);
        repo.create("uid", &profile()).unwrap();

        let mut calls = 0;
        let updated = repo
            .update("uid", |p| {
                calls += 1;
                record_visit(p, "a.com", "A", Utc::now())
            })
            .unwrap();
        assert_eq!(calls, 3);
        assert_eq!(updated.sites.len(), 1);
    }

    #[test]
    fn gives_up_after_retries() {
        let store = Arc::new(RacingStore {
            inner: InMemoryStore::new(),
            failures: AtomicU32::new(10),
        });
        let repo = ProfileRepository::new(store, 1);
        repo.create("uid", &profile()).unwrap();

        let err = repo
            .update("uid", |p| record_visit(p, "a.com", "A", Utc::now()))
            .unwrap_err();
        assert!(matches!(
            err,
            ServerError::WriteContention { attempts: 2, .. }
        ));
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let repo = ProfileRepository::new(Arc::new(InMemoryStore::new()), 64);
        repo.create("uid", &profile()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = repo.clone();
                thread::spawn(move || {
                    let url = format!("site-{i}.com");
                    repo.update("uid", |p| record_visit(p, &url, &url, Utc::now()))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(repo.load("uid").unwrap().unwrap().sites.len(), 8);
    }
}
