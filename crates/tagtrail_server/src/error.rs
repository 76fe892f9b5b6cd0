//! Error types for the server.

use tagtrail_core::CoreError;
use tagtrail_store::StoreError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Message returned when a display name exceeds the maximum length.
pub const MSG_TOO_LONG: &str = "Username is too long.";
/// Message returned when a display name is below the minimum length.
pub const MSG_TOO_SHORT: &str = "Username is too short.";
/// Message returned when the subject already owns a profile.
pub const MSG_TAKEN: &str = "Username already taken.";
/// Message returned when the subject owns no profile.
pub const MSG_NOT_FOUND: &str = "User not found.";
/// Message returned for any method other than POST.
pub const MSG_NOT_ALLOWED: &str = "Not Allowed";

/// Errors that can occur in the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Malformed request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Identity token missing, malformed, expired or revoked.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// HTTP method other than POST.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// No endpoint at the requested path.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// Input rejected by validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The subject already has a profile.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The subject has no profile.
    #[error("not found: {0}")]
    NotFound(String),

    /// Concurrent writers kept invalidating the read revision.
    #[error("write contention on {subject} after {attempts} attempts")]
    WriteContention {
        /// Subject whose profile was contended.
        subject: String,
        /// Number of write attempts made.
        attempts: u32,
    },

    /// Document store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Stored document could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidRequest(_)
                | ServerError::AuthenticationFailed(_)
                | ServerError::MethodNotAllowed(_)
                | ServerError::UnknownEndpoint(_)
                | ServerError::Validation(_)
                | ServerError::Conflict(_)
                | ServerError::NotFound(_)
                | ServerError::WriteContention { .. }
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            ServerError::Store(_) | ServerError::Codec(_) | ServerError::Internal(_)
        )
    }

    /// HTTP status code reported for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::AuthenticationFailed(_) | ServerError::MethodNotAllowed(_) => 401,
            ServerError::UnknownEndpoint(_) => 404,
            ServerError::WriteContention { .. } => 409,
            ServerError::InvalidRequest(_)
            | ServerError::Validation(_)
            | ServerError::Conflict(_)
            | ServerError::NotFound(_) => 400,
            ServerError::Store(_) | ServerError::Codec(_) | ServerError::Internal(_) => 500,
        }
    }

    /// Message placed in the `error` field of the response body.
    ///
    /// Server-side details are not exposed.
    pub fn client_message(&self) -> String {
        match self {
            ServerError::MethodNotAllowed(_) => MSG_NOT_ALLOWED.to_string(),
            ServerError::InvalidRequest(msg)
            | ServerError::Validation(msg)
            | ServerError::Conflict(msg)
            | ServerError::NotFound(msg) => msg.clone(),
            ServerError::AuthenticationFailed(_) => "Unauthorized".to_string(),
            ServerError::UnknownEndpoint(_) => "Not Found".to_string(),
            ServerError::WriteContention { .. } => "Profile is busy, try again.".to_string(),
            ServerError::Store(_) | ServerError::Codec(_) | ServerError::Internal(_) => {
                "Internal error.".to_string()
            }
        }
    }
}

impl From<CoreError> for ServerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DisplayNameTooLong { .. } => ServerError::Validation(MSG_TOO_LONG.into()),
            CoreError::DisplayNameTooShort { .. } => ServerError::Validation(MSG_TOO_SHORT.into()),
            CoreError::EmptyField { field } => {
                ServerError::InvalidRequest(format!("Missing field: {field}."))
            }
        }
    }
}
