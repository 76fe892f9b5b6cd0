//! Test fixtures and server helpers.
//!
//! [`TestServer`] wires an [`ApiServer`] to a fresh store and a
//! [`RecordingIdentity`] so tests can drive endpoints end to end and then
//! inspect what was persisted and which accounts were deleted.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tagtrail_core::UserProfile;
use tagtrail_server::{
    ApiRequest, ApiResponse, ApiServer, AuthConfig, Endpoint, Identity, IdentityProvider,
    ServerConfig, ServerError, ServerResult, TokenIdentityProvider,
};
use tagtrail_store::{DocumentStore, FileStore, InMemoryStore};
use tempfile::TempDir;

/// Secret used by every test identity provider.
pub const TEST_SECRET: &[u8] = b"tagtrail-test-secret";

/// Returns a provisioned profile with no history.
pub fn empty_profile() -> UserProfile {
    UserProfile::new("ada@example.com", "ada1a2b3c4d", "Ada", "#1a2b3c")
}

/// Identity provider that records account deletions.
///
/// Verification is delegated to a [`TokenIdentityProvider`]. Deletions can be
/// made to fail to exercise best-effort compensation.
pub struct RecordingIdentity {
    inner: TokenIdentityProvider,
    deletions: Mutex<Vec<String>>,
    fail_deletes: bool,
}

impl RecordingIdentity {
    /// Creates a provider signing with [`TEST_SECRET`].
    pub fn new() -> Self {
        Self {
            inner: TokenIdentityProvider::new(AuthConfig::new(TEST_SECRET.to_vec())),
            deletions: Mutex::new(Vec::new()),
            fail_deletes: false,
        }
    }

    /// Creates a provider whose deletions always fail.
    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::new()
        }
    }

    /// Issues a token for `subject`.
    pub fn token(&self, subject: &str) -> String {
        self.inner
            .issue_token(subject, &format!("{subject}@example.com"))
            .expect("Failed to issue token")
    }

    /// Subjects whose deletion was requested, in order.
    pub fn deletions(&self) -> Vec<String> {
        self.deletions.lock().clone()
    }
}

impl Default for RecordingIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for RecordingIdentity {
    fn verify(&self, token: &str) -> ServerResult<Identity> {
        self.inner.verify(token)
    }

    fn delete_account(&self, subject: &str) -> ServerResult<()> {
        self.deletions.lock().push(subject.to_string());
        if self.fail_deletes {
            return Err(ServerError::Internal("identity provider unavailable".into()));
        }
        self.inner.delete_account(subject)
    }
}

/// An in-process server with automatic cleanup.
pub struct TestServer {
    /// The server instance.
    pub server: ApiServer,
    /// The identity provider backing the server.
    pub identity: Arc<RecordingIdentity>,
    /// The store backing the server.
    pub store: Arc<dyn DocumentStore>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestServer {
    /// Creates a server over an in-memory store.
    pub fn memory() -> Self {
        Self::with_parts(
            Arc::new(InMemoryStore::new()),
            Arc::new(RecordingIdentity::new()),
            None,
        )
    }

    /// Creates a server over a file store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::open(temp_dir.path()).expect("Failed to open file store");
        Self::with_parts(
            Arc::new(store),
            Arc::new(RecordingIdentity::new()),
            Some(temp_dir),
        )
    }

    /// Creates a server over an in-memory store with a custom identity.
    pub fn with_identity(identity: RecordingIdentity) -> Self {
        Self::with_parts(Arc::new(InMemoryStore::new()), Arc::new(identity), None)
    }

    fn with_parts(
        store: Arc<dyn DocumentStore>,
        identity: Arc<RecordingIdentity>,
        temp_dir: Option<TempDir>,
    ) -> Self {
        let server = ApiServer::new(ServerConfig::default(), Arc::clone(&store), identity.clone());
        Self {
            server,
            identity,
            store,
            _temp_dir: temp_dir,
        }
    }

    /// Issues a token for `subject`.
    pub fn token(&self, subject: &str) -> String {
        self.identity.token(subject)
    }

    /// Posts `body` to `endpoint`.
    pub fn call<T: Serialize>(&self, endpoint: Endpoint, token: &str, body: T) -> ApiResponse {
        let body = serde_json::to_vec(&body).expect("Failed to encode body");
        self.server.handle(&ApiRequest::post(endpoint, token, body))
    }

    /// Signs up `subject` with `name` and returns its token.
    ///
    /// # Panics
    ///
    /// Panics if sign-up fails.
    pub fn sign_up(&self, subject: &str, name: &str) -> String {
        let token = self.token(subject);
        let response = self.call(Endpoint::SignUp, &token, serde_json::json!({ "name": name }));
        assert_eq!(response.status, 200, "sign-up failed: {:?}", response);
        token
    }

    /// Loads the stored profile of `subject`.
    pub fn profile(&self, subject: &str) -> Option<UserProfile> {
        self.server
            .profiles()
            .load(subject)
            .expect("Failed to load profile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_persists_profile() {
        let server = TestServer::memory();
        server.sign_up("uid-1", "Ada");
        let profile = server.profile("uid-1").unwrap();
        assert_eq!(profile.display_name, "Ada");
        assert_eq!(profile.email, "uid-1@example.com");
    }

    #[test]
    fn recording_identity_tracks_deletions() {
        let identity = RecordingIdentity::failing_deletes();
        assert!(identity.delete_account("uid-1").is_err());
        assert_eq!(identity.deletions(), vec!["uid-1"]);
    }
}
