//! Identity verification.
//!
//! The server never inspects credentials itself; it asks an
//! [`IdentityProvider`] to turn an opaque token into a stable subject
//! identifier and an email address. The provider also owns account deletion,
//! which sign-up uses as a compensating action.
//!
//! [`TokenIdentityProvider`] is a self-contained provider using HMAC-SHA256
//! signed tokens.
//!
//! ## Token Format
//!
//! ```text
//! base64url(claims) "." base64url(signature)
//! ```
//!
//! where `claims` is the JSON object `{"sub", "email", "iat"}` (`iat` in Unix
//! millis) and `signature` is the HMAC-SHA256 of the encoded claims.

use crate::error::{ServerError, ServerResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable subject identifier; keys the caller's profile.
    pub subject: String,
    /// Email address on record with the provider.
    pub email: String,
}

/// The external identity collaborator.
pub trait IdentityProvider: Send + Sync {
    /// Verifies `token` and returns the caller's identity.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::AuthenticationFailed`] for malformed, forged,
    /// expired or revoked tokens.
    fn verify(&self, token: &str) -> ServerResult<Identity>;

    /// Deletes the account of `subject` at the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider refuses or cannot be reached.
    fn delete_account(&self, subject: &str) -> ServerResult<()>;
}

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for HMAC.
    pub secret: Vec<u8>,
    /// Token expiration duration.
    pub token_expiry: Duration,
}

impl AuthConfig {
    /// Creates a new auth configuration.
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            token_expiry: Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Sets the token expiration duration.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iat: u64,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn rejected(reason: &str) -> ServerError {
    ServerError::AuthenticationFailed(reason.to_string())
}

/// Identity provider backed by HMAC-signed tokens.
///
/// Deleted accounts are remembered for the lifetime of the provider; their
/// tokens stop verifying immediately, including tokens issued afterwards.
///
/// The revocation set only grows and lives in memory: one entry per deleted
/// subject until the provider is dropped. Deployments with many deletions
/// should back [`IdentityProvider`] with an external identity service instead.
pub struct TokenIdentityProvider {
    config: AuthConfig,
    /// Revoked subjects. Never pruned.
    deleted: RwLock<HashSet<String>>,
}

impl TokenIdentityProvider {
    /// Creates a provider.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            deleted: RwLock::new(HashSet::new()),
        }
    }

    /// Issues a token for `subject`.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded.
    pub fn issue_token(&self, subject: &str, email: &str) -> ServerResult<String> {
        self.issue_token_at(subject, email, now_millis())
    }

    fn issue_token_at(&self, subject: &str, email: &str, iat: u64) -> ServerResult<String> {
        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            iat,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signature = self.mac(payload.as_bytes())?.finalize().into_bytes();
        Ok(format!("{payload}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Returns true if `subject` was deleted through this provider.
    pub fn is_deleted(&self, subject: &str) -> bool {
        self.deleted.read().contains(subject)
    }

    fn mac(&self, data: &[u8]) -> ServerResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.config.secret)
            .map_err(|e| ServerError::Internal(format!("invalid HMAC key: {e}")))?;
        mac.update(data);
        Ok(mac)
    }
}

impl IdentityProvider for TokenIdentityProvider {
    fn verify(&self, token: &str) -> ServerResult<Identity> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| rejected("Malformed token"))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| rejected("Malformed token"))?;
        self.mac(payload.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| rejected("Invalid signature"))?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or_else(|| rejected("Malformed claims"))?;

        let expiry_millis = self.config.token_expiry.as_millis() as u64;
        if now_millis() > claims.iat.saturating_add(expiry_millis) {
            return Err(rejected("Token expired"));
        }

        if self.is_deleted(&claims.sub) {
            return Err(rejected("Account deleted"));
        }

        Ok(Identity {
            subject: claims.sub,
            email: claims.email,
        })
    }

    fn delete_account(&self, subject: &str) -> ServerResult<()> {
        self.deleted.write().insert(subject.to_string());
        Ok(())
    }
}
